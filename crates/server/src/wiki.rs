use std::{collections::HashMap, sync::LazyLock, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use shared::protocol::{WikiSearchResult, MAX_WIKI_TITLES};
use tracing::warn;

pub const SEARCH_LIMIT: u32 = 8;
/// Hits used when generation asks for Wikipedia context without a selection.
pub const AUTO_SEARCH_LIMIT: u32 = 3;
pub const MAX_TOTAL_CHARS: usize = 25_000;
const TRUNCATION_MARKER: &str = "\n\n[…текст сокращён…]";

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static regex"));
static LANG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2,3}(-[a-z]{2,8})?$").expect("static regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub content: String,
    pub url: String,
}

#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn search(&self, lang: &str, query: &str, limit: u32) -> Result<Vec<WikiSearchResult>>;
    async fn fetch_article(&self, lang: &str, title: &str, max_chars: usize)
        -> Result<Option<Article>>;
}

/// Fetches up to [`MAX_WIKI_TITLES`] articles, splitting `max_total_chars`
/// evenly between them. Articles that fail or are missing are skipped.
pub async fn fetch_articles(
    source: &dyn ArticleSource,
    lang: &str,
    titles: &[String],
    max_total_chars: usize,
) -> Vec<Article> {
    let titles = &titles[..titles.len().min(MAX_WIKI_TITLES)];
    if titles.is_empty() {
        return Vec::new();
    }
    let max_per_article = max_total_chars / titles.len();

    let mut articles = Vec::with_capacity(titles.len());
    for title in titles {
        match source.fetch_article(lang, title, max_per_article).await {
            Ok(Some(article)) => articles.push(article),
            Ok(None) => warn!(%title, %lang, "wikipedia article not found"),
            Err(error) => warn!(%title, %lang, error = %error, "failed to fetch wikipedia article"),
        }
    }
    articles
}

pub fn is_valid_lang(lang: &str) -> bool {
    LANG_RE.is_match(lang)
}

/// Removes search-highlight markup and the handful of entities the search
/// API leaves in snippets.
pub fn clean_snippet(raw: &str) -> String {
    TAG_RE
        .replace_all(raw, "")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&mdash;", "—")
        // last, so an escaped entity stays literal
        .replace("&amp;", "&")
}

/// Cuts `content` to `max_chars` characters, backing up to the last full
/// sentence when one ends past 60% of the budget.
pub fn truncate_extract(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }

    let cut = content
        .char_indices()
        .nth(max_chars)
        .map(|(offset, _)| offset)
        .unwrap_or(content.len());
    let mut truncated = &content[..cut];

    if let Some(dot) = truncated.rfind('.') {
        let dot_chars = truncated[..dot].chars().count();
        if dot_chars as f64 > max_chars as f64 * 0.6 {
            truncated = &truncated[..dot + 1];
        }
    }

    format!("{truncated}{TRUNCATION_MARKER}")
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    wordcount: Option<u64>,
    #[serde(default)]
    pageid: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PagesEnvelope {
    #[serde(default)]
    query: Option<PagesQuery>,
}

#[derive(Debug, Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: HashMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    fullurl: Option<String>,
}

/// MediaWiki action API client. `api_url` may contain a `{lang}` placeholder.
pub struct WikiClient {
    http: Client,
    api_url: String,
}

impl WikiClient {
    pub fn new(api_url: impl Into<String>, user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("build wikipedia http client")?;
        Ok(Self {
            http,
            api_url: api_url.into(),
        })
    }

    fn endpoint(&self, lang: &str) -> String {
        self.api_url.replace("{lang}", lang)
    }
}

#[async_trait]
impl ArticleSource for WikiClient {
    async fn search(&self, lang: &str, query: &str, limit: u32) -> Result<Vec<WikiSearchResult>> {
        let limit = limit.to_string();
        let envelope: SearchEnvelope = self
            .http
            .get(self.endpoint(lang))
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("srprop", "snippet|size|wordcount"),
                ("format", "json"),
                ("utf8", "1"),
            ])
            .send()
            .await
            .context("wikipedia search request")?
            .error_for_status()
            .context("wikipedia search status")?
            .json()
            .await
            .context("wikipedia search json")?;

        Ok(envelope
            .query
            .map(|query| query.search)
            .unwrap_or_default()
            .into_iter()
            .map(|hit| WikiSearchResult {
                title: hit.title,
                snippet: clean_snippet(&hit.snippet),
                wordcount: hit.wordcount,
                pageid: hit.pageid,
            })
            .collect())
    }

    async fn fetch_article(
        &self,
        lang: &str,
        title: &str,
        max_chars: usize,
    ) -> Result<Option<Article>> {
        let envelope: PagesEnvelope = self
            .http
            .get(self.endpoint(lang))
            .query(&[
                ("action", "query"),
                ("titles", title),
                ("prop", "extracts|info"),
                ("explaintext", "1"),
                ("inprop", "url"),
                ("format", "json"),
                ("utf8", "1"),
            ])
            .send()
            .await
            .context("wikipedia article request")?
            .error_for_status()
            .context("wikipedia article status")?
            .json()
            .await
            .context("wikipedia article json")?;

        let Some(query) = envelope.query else {
            return Ok(None);
        };
        let Some((_, page)) = query.pages.into_iter().find(|(page_id, _)| page_id != "-1") else {
            return Ok(None);
        };
        let content = page.extract.unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(None);
        }

        let url = page.fullurl.unwrap_or_else(|| {
            format!(
                "https://{lang}.wikipedia.org/wiki/{}",
                title.replace(' ', "_")
            )
        });
        Ok(Some(Article {
            title: page.title.unwrap_or_else(|| title.to_string()),
            content: truncate_extract(&content, max_chars),
            url,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, routing::get, Json, Router};
    use tokio::net::TcpListener;

    #[test]
    fn snippet_loses_markup_and_entities() {
        let raw = r#"<span class="searchmatch">Фотосинтез</span> &quot;света&quot; &amp;&nbsp;тьмы"#;
        assert_eq!(clean_snippet(raw), "Фотосинтез \"света\" & тьмы");
    }

    #[test]
    fn escaped_entities_are_decoded_once() {
        assert_eq!(clean_snippet("a &amp;lt;b&amp;gt;"), "a &lt;b&gt;");
        assert_eq!(clean_snippet("Луна &mdash; спутник"), "Луна — спутник");
    }

    #[test]
    fn short_extract_is_untouched() {
        assert_eq!(truncate_extract("Коротко.", 100), "Коротко.");
    }

    #[test]
    fn long_extract_backs_up_to_sentence_end() {
        let content = "Первое предложение. Второе предложение тут длинное";
        let truncated = truncate_extract(content, 28);
        assert_eq!(truncated, format!("Первое предложение.{TRUNCATION_MARKER}"));
    }

    #[test]
    fn early_sentence_end_is_not_used() {
        let content = "Да. Очень длинный хвост без точки вообще";
        let truncated = truncate_extract(content, 20);
        let kept: String = content.chars().take(20).collect();
        assert_eq!(truncated, format!("{kept}{TRUNCATION_MARKER}"));
    }

    #[test]
    fn language_codes_are_restricted() {
        assert!(is_valid_lang("ru"));
        assert!(is_valid_lang("en"));
        assert!(is_valid_lang("zh-yue"));
        assert!(!is_valid_lang("evil.com/"));
        assert!(!is_valid_lang(""));
        assert!(!is_valid_lang("RU"));
    }

    async fn fake_api(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
        if params.get("list").map(String::as_str) == Some("search") {
            return Json(serde_json::json!({
                "query": {"search": [
                    {"title": "Луна", "pageid": 7, "wordcount": 1200,
                     "snippet": "<span class=\"searchmatch\">Луна</span> &mdash; спутник"}
                ]}
            }));
        }
        match params.get("titles").map(String::as_str) {
            Some("Луна") => Json(serde_json::json!({
                "query": {"pages": {"7": {
                    "title": "Луна",
                    "extract": "Луна — естественный спутник Земли.",
                    "fullurl": "https://ru.wikipedia.org/wiki/Луна"
                }}}
            })),
            _ => Json(serde_json::json!({
                "query": {"pages": {"-1": {"title": "Нет", "missing": ""}}}
            })),
        }
    }

    #[tokio::test]
    async fn client_parses_search_and_article_responses() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let app = Router::new().route("/w/ru/api.php", get(fake_api));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        let client = WikiClient::new(
            format!("http://{addr}/w/{{lang}}/api.php"),
            "test-agent",
            Duration::from_secs(5),
        )
        .expect("client");

        let results = client.search("ru", "Луна", SEARCH_LIMIT).await.expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].snippet, "Луна — спутник");
        assert_eq!(results[0].wordcount, Some(1200));

        let article = client
            .fetch_article("ru", "Луна", 1000)
            .await
            .expect("article")
            .expect("present");
        assert_eq!(article.title, "Луна");
        assert!(article.content.starts_with("Луна"));

        let missing = client.fetch_article("ru", "Нет", 1000).await.expect("article");
        assert!(missing.is_none());

        let articles = fetch_articles(
            &client,
            "ru",
            &["Луна".to_string(), "Нет".to_string()],
            MAX_TOTAL_CHARS,
        )
        .await;
        assert_eq!(articles.len(), 1);
    }
}
