use serde::{Deserialize, Serialize};

use crate::domain::{EduType, Mode, Style, Volume};

/// Maximum number of Wikipedia articles attached to one generation.
pub const MAX_WIKI_TITLES: usize = 5;
/// Characters per printed page used for the page estimate.
pub const CHARS_PER_PAGE: f64 = 1800.0;

pub fn generate_route() -> &'static str {
    "/generate"
}

pub fn wiki_search_route() -> &'static str {
    "/wiki/search"
}

pub fn status_route() -> &'static str {
    "/status"
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiSearchRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiSearchResult {
    pub title: String,
    #[serde(default, alias = "description")]
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wordcount: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pageid: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiSearchResponse {
    pub success: bool,
    #[serde(default)]
    pub results: Vec<WikiSearchResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub edu_type: EduType,
    #[serde(default = "default_grade")]
    pub grade: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub teacher: String,
    #[serde(default)]
    pub include_title: bool,
}

fn default_grade() -> String {
    "1".to_string()
}

impl Default for AuthorInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            edu_type: EduType::default(),
            grade: default_grade(),
            institution: String::new(),
            group: String::new(),
            teacher: String::new(),
            include_title: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub volume: Volume,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub use_wikipedia: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wiki_titles: Vec<String>,
    /// Single-article form sent by older clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiki_article_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiki_lang: Option<String>,
    #[serde(default)]
    pub author_info: AuthorInfo,
}

impl GenerateRequest {
    /// Trimmed, de-duplicated titles from both the list and the legacy
    /// single-title field, capped at [`MAX_WIKI_TITLES`].
    pub fn selected_wiki_titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = Vec::new();
        let candidates = self
            .wiki_titles
            .iter()
            .chain(self.wiki_article_title.iter())
            .map(|title| title.trim())
            .filter(|title| !title.is_empty());
        for title in candidates {
            if titles.len() == MAX_WIKI_TITLES {
                break;
            }
            if !titles.iter().any(|known| known == title) {
                titles.push(title.to_string());
            }
        }
        titles
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub words: u64,
    pub chars: u64,
    pub pages: f64,
}

impl GenerationStats {
    pub fn measure(text: &str) -> Self {
        let words = text.split_whitespace().count() as u64;
        let chars = text.chars().count() as u64;
        let pages = (chars as f64 / CHARS_PER_PAGE * 10.0).round() / 10.0;
        Self {
            words,
            chars,
            pages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<GenerationStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateResponse {
    pub fn completed(result: String) -> Self {
        let stats = GenerationStats::measure(&result);
        Self {
            success: true,
            result: Some(result),
            stats: Some(stats),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            stats: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub api_ready: bool,
    pub model: String,
    pub key_exists: bool,
    pub key_length: usize,
}
