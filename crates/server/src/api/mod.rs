use std::{sync::Arc, time::Instant};

use chrono::{Datelike, Local};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{
        GenerateRequest, GenerateResponse, StatusResponse, WikiSearchRequest, WikiSearchResponse,
    },
};
use tracing::{info, warn};

use crate::{
    gemini::TextGenerator,
    wiki::{self, ArticleSource, Article},
};

pub mod prompts;

#[derive(Clone)]
pub struct ApiContext {
    pub generator: Arc<dyn TextGenerator>,
    pub wiki: Arc<dyn ArticleSource>,
    pub default_lang: String,
    pub api_key_length: usize,
}

pub fn resolve_lang(ctx: &ApiContext, requested: Option<&str>) -> Result<String, ApiError> {
    let lang = requested
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .unwrap_or(&ctx.default_lang)
        .to_ascii_lowercase();
    if !wiki::is_valid_lang(&lang) {
        return Err(ApiError::validation(format!(
            "Неподдерживаемый язык Википедии: {lang}"
        )));
    }
    Ok(lang)
}

pub async fn search_articles(
    ctx: &ApiContext,
    req: &WikiSearchRequest,
) -> Result<WikiSearchResponse, ApiError> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(ApiError::validation("Введите поисковый запрос!"));
    }
    let lang = resolve_lang(ctx, req.lang.as_deref())?;

    let results = ctx
        .wiki
        .search(&lang, query, wiki::SEARCH_LIMIT)
        .await
        .map_err(|error| {
            warn!(%lang, error = %error, "wikipedia search failed");
            ApiError::upstream(format!("Ошибка поиска в Википедии: {error}"))
        })?;

    info!(%lang, hits = results.len(), "wikipedia search finished");
    Ok(WikiSearchResponse {
        success: true,
        results,
        error: None,
    })
}

/// Titles the user picked, or the best hits for the topic when none were.
async fn gather_articles(ctx: &ApiContext, req: &GenerateRequest, lang: &str) -> Vec<Article> {
    let mut titles = req.selected_wiki_titles();
    if titles.is_empty() {
        match ctx
            .wiki
            .search(lang, req.topic.trim(), wiki::AUTO_SEARCH_LIMIT)
            .await
        {
            Ok(hits) => titles = hits.into_iter().map(|hit| hit.title).collect(),
            Err(error) => {
                warn!(%lang, error = %error, "automatic wikipedia search failed");
                return Vec::new();
            }
        }
    }
    wiki::fetch_articles(ctx.wiki.as_ref(), lang, &titles, wiki::MAX_TOTAL_CHARS).await
}

pub async fn generate(
    ctx: &ApiContext,
    req: &GenerateRequest,
) -> Result<GenerateResponse, ApiError> {
    let topic = req.topic.trim();
    if topic.is_empty() {
        return Err(ApiError::validation("Введите тему!"));
    }
    if !ctx.generator.is_ready() {
        return Err(ApiError::new(
            ErrorCode::Unavailable,
            "API ключ не настроен",
        ));
    }

    let started = Instant::now();
    let articles = if req.use_wikipedia {
        let lang = resolve_lang(ctx, req.wiki_lang.as_deref())?;
        gather_articles(ctx, req, &lang).await
    } else {
        Vec::new()
    };

    let prompt = prompts::build_prompt(req.mode, topic, req.volume, req.style, &articles);
    let mut result = ctx.generator.generate(&prompt).await.map_err(|error| {
        warn!(mode = %req.mode, error = %error, "text generation failed");
        ApiError::upstream(error.to_string())
    })?;

    if req.author_info.include_title && req.mode.supports_title_page() {
        let title_page =
            prompts::title_page(topic, &req.author_info, req.mode, Local::now().year());
        result = format!("{title_page}\n\n{result}");
    }
    if !articles.is_empty() {
        result = format!(
            "{}\n\n{}",
            result.trim_end(),
            prompts::sources_section(&articles)
        );
    }

    info!(
        mode = %req.mode,
        topic_chars = topic.chars().count(),
        articles = articles.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "generation finished"
    );
    Ok(GenerateResponse::completed(result))
}

pub fn status(ctx: &ApiContext) -> StatusResponse {
    StatusResponse {
        api_ready: ctx.generator.is_ready(),
        model: ctx.generator.model_name().to_string(),
        key_exists: ctx.api_key_length > 0,
        key_length: ctx.api_key_length,
    }
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
