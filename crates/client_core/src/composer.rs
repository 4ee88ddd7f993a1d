//! Explicit state of the request composer and the view models rendered
//! from it. Nothing here touches the network; the caller pairs
//! `begin_*` with `finish_*` around a backend call.

use std::time::{Duration, Instant};

use shared::{
    domain::{Mode, Style, Volume},
    protocol::{
        AuthorInfo, GenerateRequest, GenerateResponse, GenerationStats, WikiSearchRequest,
        WikiSearchResponse, WikiSearchResult, MAX_WIKI_TITLES,
    },
};
use tracing::{debug, info, warn};

use crate::{
    actions::{ClipboardSink, DownloadFile},
    captions::CaptionSchedule,
    error::{ComposerError, ValidationPrompt},
};

pub const DEFAULT_WIKI_LANG: &str = "ru";

/// Languages offered by the search panel, `(code, label)`.
pub const WIKI_LANGUAGES: [(&str, &str); 5] = [
    ("ru", "Русский"),
    ("en", "English"),
    ("uk", "Українська"),
    ("de", "Deutsch"),
    ("fr", "Français"),
];

pub const COPY_FEEDBACK: Duration = Duration::from_secs(2);

const GENERATE_LABEL: &str = "✨ Сгенерировать";
const GENERATING_LABEL: &str = "⏳ Генерация...";
const COPY_LABEL: &str = "📋 Копировать";
const COPIED_LABEL: &str = "✅ Скопировано!";
const SEARCH_LOADING: &str = "Поиск статей...";
const NO_RESULTS: &str = "Статьи не найдены. Попробуйте другой запрос.";
const NO_SNIPPET: &str = "Нет описания";

/// Identifies one outstanding request. A response is applied only while its
/// ticket is still the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestTicket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Response(WikiSearchResponse),
    Transport(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerateOutcome {
    Response(GenerateResponse),
    Transport(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeButton {
    pub mode: Mode,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub input_label: &'static str,
    pub show_author: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiCard {
    pub title: String,
    pub description: String,
    pub wordcount: Option<u64>,
    pub checked: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WikiResultsView {
    Empty,
    Loading(&'static str),
    NoResults(&'static str),
    Error(String),
    Cards(Vec<WikiCard>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WikiStatus {
    #[default]
    Idle,
    Searching,
    Found(usize),
    NotFound,
    Failed,
}

impl WikiStatus {
    pub fn text(self) -> String {
        match self {
            WikiStatus::Idle => "Готов к поиску".to_string(),
            WikiStatus::Searching => "🔍 Поиск...".to_string(),
            WikiStatus::Found(count) => format!("✅ Найдено: {count}"),
            WikiStatus::NotFound => "❌ Не найдено".to_string(),
            WikiStatus::Failed => "❌ Ошибка".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum WikiPanel {
    Empty,
    Loading,
    NoResults,
    Error(String),
    Results(Vec<WikiSearchResult>),
}

#[derive(Debug, Clone)]
struct PendingGeneration {
    ticket: RequestTicket,
    started_at: Instant,
    captions: CaptionSchedule,
}

#[derive(Debug, Clone)]
pub struct ComposerState {
    pub topic: String,
    pub volume: Volume,
    pub style: Style,
    pub author: AuthorInfo,
    pub wiki_query: String,
    pub wiki_lang: String,
    mode: Mode,
    use_wikipedia: bool,
    wiki_status: WikiStatus,
    wiki_panel: WikiPanel,
    selected: Vec<String>,
    search: Option<RequestTicket>,
    generation: Option<PendingGeneration>,
    result_text: String,
    stats_text: String,
    result_visible: bool,
    copied_at: Option<Instant>,
    next_ticket: u64,
}

impl Default for ComposerState {
    fn default() -> Self {
        Self {
            topic: String::new(),
            volume: Volume::default(),
            style: Style::default(),
            author: AuthorInfo::default(),
            wiki_query: String::new(),
            wiki_lang: DEFAULT_WIKI_LANG.to_string(),
            mode: Mode::default(),
            use_wikipedia: false,
            wiki_status: WikiStatus::Idle,
            wiki_panel: WikiPanel::Empty,
            selected: Vec::new(),
            search: None,
            generation: None,
            result_text: String::new(),
            stats_text: String::new(),
            result_visible: false,
            copied_at: None,
            next_ticket: 0,
        }
    }
}

impl ComposerState {
    pub fn new() -> Self {
        Self::default()
    }

    fn issue_ticket(&mut self) -> RequestTicket {
        self.next_ticket += 1;
        RequestTicket(self.next_ticket)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn select_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            debug!(mode = mode.key(), "mode selected");
        }
        self.mode = mode;
    }

    pub fn mode_buttons(&self) -> Vec<ModeButton> {
        Mode::ALL
            .iter()
            .map(|mode| ModeButton {
                mode: *mode,
                label: mode.descriptor().menu_label,
                active: *mode == self.mode,
            })
            .collect()
    }

    pub fn header(&self) -> Header {
        let descriptor = self.mode.descriptor();
        Header {
            title: descriptor.title,
            subtitle: descriptor.subtitle,
            input_label: descriptor.input_label,
            show_author: descriptor.show_author,
        }
    }

    // Wikipedia assist

    pub fn use_wikipedia(&self) -> bool {
        self.use_wikipedia
    }

    /// Turning the panel off drops the current selection.
    pub fn set_use_wikipedia(&mut self, enabled: bool) {
        self.use_wikipedia = enabled;
        if !enabled {
            self.selected.clear();
        }
    }

    pub fn begin_search(&mut self) -> Result<(RequestTicket, WikiSearchRequest), ValidationPrompt> {
        let mut query = self.wiki_query.trim().to_string();
        if query.is_empty() {
            query = self.topic.trim().to_string();
        }
        if query.is_empty() {
            return Err(ValidationPrompt::EmptyQuery);
        }
        self.wiki_query = query.clone();

        let ticket = self.issue_ticket();
        self.search = Some(ticket);
        self.wiki_status = WikiStatus::Searching;
        self.wiki_panel = WikiPanel::Loading;

        let lang = match self.wiki_lang.trim() {
            "" => DEFAULT_WIKI_LANG.to_string(),
            lang => lang.to_string(),
        };
        debug!(?ticket, %query, %lang, "wiki search started");
        Ok((
            ticket,
            WikiSearchRequest {
                query,
                lang: Some(lang),
            },
        ))
    }

    /// Applies a search outcome. Returns `false` when the ticket is stale
    /// and nothing changed.
    pub fn finish_search(&mut self, ticket: RequestTicket, outcome: SearchOutcome) -> bool {
        if self.search != Some(ticket) {
            debug!(?ticket, "stale search response dropped");
            return false;
        }
        self.search = None;

        match outcome {
            SearchOutcome::Response(response) if response.success => {
                if response.results.is_empty() {
                    self.wiki_panel = WikiPanel::NoResults;
                    self.wiki_status = WikiStatus::NotFound;
                } else {
                    self.wiki_status = WikiStatus::Found(response.results.len());
                    self.wiki_panel = WikiPanel::Results(response.results);
                }
            }
            SearchOutcome::Response(response) => {
                let message = response
                    .error
                    .unwrap_or_else(|| "неизвестная ошибка".to_string());
                warn!(%message, "wiki search rejected");
                self.wiki_panel = WikiPanel::Error(format!("Ошибка поиска: {message}"));
                self.wiki_status = WikiStatus::Failed;
            }
            SearchOutcome::Transport(message) => {
                warn!(%message, "wiki search failed");
                self.wiki_panel = WikiPanel::Error(format!("Ошибка поиска: {message}"));
                self.wiki_status = WikiStatus::Failed;
            }
        }
        true
    }

    /// Releases the search trigger and invalidates the outstanding ticket.
    pub fn cancel_search(&mut self) -> bool {
        let Some(ticket) = self.search.take() else {
            return false;
        };
        info!(?ticket, "wiki search cancelled");
        self.wiki_panel = WikiPanel::Empty;
        self.wiki_status = WikiStatus::Idle;
        true
    }

    pub fn search_in_flight(&self) -> bool {
        self.search.is_some()
    }

    pub fn wiki_status(&self) -> WikiStatus {
        self.wiki_status
    }

    pub fn wiki_results(&self) -> WikiResultsView {
        match &self.wiki_panel {
            WikiPanel::Empty => WikiResultsView::Empty,
            WikiPanel::Loading => WikiResultsView::Loading(SEARCH_LOADING),
            WikiPanel::NoResults => WikiResultsView::NoResults(NO_RESULTS),
            WikiPanel::Error(message) => WikiResultsView::Error(message.clone()),
            WikiPanel::Results(results) => {
                let full = self.selected.len() >= MAX_WIKI_TITLES;
                WikiResultsView::Cards(
                    results
                        .iter()
                        .map(|result| {
                            let checked = self.is_selected(&result.title);
                            let description = match result.snippet.trim() {
                                "" => NO_SNIPPET.to_string(),
                                snippet => snippet.to_string(),
                            };
                            WikiCard {
                                title: result.title.clone(),
                                description,
                                wordcount: result.wordcount,
                                checked,
                                enabled: checked || !full,
                            }
                        })
                        .collect(),
                )
            }
        }
    }

    pub fn is_selected(&self, title: &str) -> bool {
        self.selected.iter().any(|known| known == title)
    }

    /// Checks or unchecks a title. Checking is refused once the selection is
    /// full; returns whether anything changed.
    pub fn toggle_selection(&mut self, title: &str) -> bool {
        if let Some(index) = self.selected.iter().position(|known| known == title) {
            self.selected.remove(index);
            return true;
        }
        if self.selected.len() >= MAX_WIKI_TITLES {
            return false;
        }
        self.selected.push(title.to_string());
        true
    }

    pub fn selected_titles(&self) -> &[String] {
        &self.selected
    }

    pub fn selection_badge(&self) -> usize {
        self.selected.len()
    }

    pub fn selection_banner_visible(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    // Generation

    pub fn begin_generation(
        &mut self,
        now: Instant,
    ) -> Result<(RequestTicket, GenerateRequest), ValidationPrompt> {
        let topic = self.topic.trim();
        if topic.is_empty() {
            return Err(ValidationPrompt::EmptyTopic);
        }

        let mut request = GenerateRequest {
            mode: self.mode,
            topic: topic.to_string(),
            volume: self.volume,
            style: self.style,
            use_wikipedia: self.use_wikipedia,
            author_info: self.author.clone(),
            ..GenerateRequest::default()
        };
        if self.use_wikipedia {
            request.wiki_titles = self.selected.clone();
            request.wiki_lang = Some(match self.wiki_lang.trim() {
                "" => DEFAULT_WIKI_LANG.to_string(),
                lang => lang.to_string(),
            });
        }

        let ticket = self.issue_ticket();
        self.generation = Some(PendingGeneration {
            ticket,
            started_at: now,
            captions: CaptionSchedule::for_generation(self.use_wikipedia),
        });
        self.result_visible = false;
        info!(
            ?ticket,
            mode = self.mode.key(),
            wiki_titles = request.wiki_titles.len(),
            "generation started"
        );
        Ok((ticket, request))
    }

    pub fn finish_generation(&mut self, ticket: RequestTicket, outcome: GenerateOutcome) -> bool {
        match &self.generation {
            Some(pending) if pending.ticket == ticket => {}
            _ => {
                debug!(?ticket, "stale generation response dropped");
                return false;
            }
        }
        self.generation = None;
        self.result_visible = true;

        match outcome {
            GenerateOutcome::Response(response) if response.success => {
                self.result_text = response.result.unwrap_or_default();
                self.stats_text = response.stats.map(|s| format_stats(&s)).unwrap_or_default();
            }
            GenerateOutcome::Response(response) => {
                let message = response.error.unwrap_or_default();
                warn!(%message, "generation rejected");
                self.result_text = format!("Ошибка: {message}");
                self.stats_text.clear();
            }
            GenerateOutcome::Transport(message) => {
                warn!(%message, "generation failed");
                self.result_text = format!("Ошибка соединения: {message}");
                self.stats_text.clear();
            }
        }
        true
    }

    /// Releases the generate trigger without a result. A response that
    /// arrives later for the cancelled ticket is dropped.
    pub fn cancel_generation(&mut self) -> bool {
        let Some(pending) = self.generation.take() else {
            return false;
        };
        info!(ticket = ?pending.ticket, "generation cancelled");
        true
    }

    pub fn is_generating(&self) -> bool {
        self.generation.is_some()
    }

    pub fn generate_enabled(&self) -> bool {
        self.generation.is_none()
    }

    pub fn generate_button_label(&self) -> &'static str {
        if self.is_generating() {
            GENERATING_LABEL
        } else {
            GENERATE_LABEL
        }
    }

    pub fn loading_visible(&self) -> bool {
        self.is_generating()
    }

    pub fn loading_caption(&self, now: Instant) -> Option<&'static str> {
        let pending = self.generation.as_ref()?;
        pending
            .captions
            .caption_at(now.saturating_duration_since(pending.started_at))
    }

    pub fn result_visible(&self) -> bool {
        self.result_visible
    }

    pub fn result_text(&self) -> &str {
        &self.result_text
    }

    pub fn stats_text(&self) -> &str {
        &self.stats_text
    }

    // Result actions

    /// Returns to the initial state. An in-flight search is invalidated
    /// along with its results; a running generation is left alone.
    pub fn clear(&mut self) {
        self.cancel_search();
        self.topic.clear();
        self.result_text.clear();
        self.stats_text.clear();
        self.wiki_query.clear();
        self.wiki_panel = WikiPanel::Empty;
        self.wiki_status = WikiStatus::Idle;
        self.selected.clear();
        self.copied_at = None;
    }

    pub fn copy_to(
        &mut self,
        sink: &mut dyn ClipboardSink,
        now: Instant,
    ) -> Result<(), ComposerError> {
        if self.result_text.is_empty() {
            return Err(ValidationPrompt::NothingToCopy.into());
        }
        sink.set_text(&self.result_text)
            .map_err(|err| ComposerError::Clipboard(err.to_string()))?;
        self.copied_at = Some(now);
        Ok(())
    }

    pub fn copy_button_label(&self, now: Instant) -> &'static str {
        match self.copied_at {
            Some(at) if now.saturating_duration_since(at) < COPY_FEEDBACK => COPIED_LABEL,
            _ => COPY_LABEL,
        }
    }

    pub fn download(&self, unix_millis: u128) -> Result<DownloadFile, ValidationPrompt> {
        if self.result_text.is_empty() {
            return Err(ValidationPrompt::NothingToDownload);
        }
        Ok(DownloadFile::new(self.mode, unix_millis, self.result_text.clone()))
    }
}

pub fn format_stats(stats: &GenerationStats) -> String {
    format!(
        "📊 {} слов | {} символов | ~{} стр.",
        stats.words,
        stats.chars,
        format_pages(stats.pages)
    )
}

/// Whole page counts print without a fractional part.
pub fn format_pages(pages: f64) -> String {
    if pages.fract() == 0.0 {
        format!("{pages:.0}")
    } else {
        format!("{pages:.1}")
    }
}

#[cfg(test)]
#[path = "tests/composer_tests.rs"]
mod tests;
