use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::protocol::WikiSearchResult;

use crate::{
    api::ApiContext,
    gemini::TextGenerator,
    wiki::{Article, ArticleSource},
};

pub(crate) struct FakeGenerator {
    pub ready: bool,
    pub reply: Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            ready: true,
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            ready: true,
            reply: Err(error.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            ready: false,
            reply: Err("not configured".to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().expect("prompts").last().cloned()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().expect("prompts").push(prompt.to_string());
        self.reply.clone().map_err(|error| anyhow!(error))
    }
}

#[derive(Default)]
pub(crate) struct FakeWiki {
    pub hits: Vec<WikiSearchResult>,
    pub pages: HashMap<String, String>,
    pub fail_search: bool,
    pub searches: Mutex<Vec<(String, String, u32)>>,
    pub fetches: Mutex<Vec<(String, usize)>>,
}

impl FakeWiki {
    pub fn with_page(mut self, title: &str, content: &str) -> Self {
        self.hits.push(WikiSearchResult {
            title: title.to_string(),
            snippet: format!("{title} snippet"),
            wordcount: Some(content.split_whitespace().count() as u64),
            pageid: Some(self.hits.len() as u64 + 1),
        });
        self.pages.insert(title.to_string(), content.to_string());
        self
    }
}

#[async_trait]
impl ArticleSource for FakeWiki {
    async fn search(&self, lang: &str, query: &str, limit: u32) -> Result<Vec<WikiSearchResult>> {
        self.searches
            .lock()
            .expect("searches")
            .push((lang.to_string(), query.to_string(), limit));
        if self.fail_search {
            return Err(anyhow!("wikipedia unreachable"));
        }
        Ok(self.hits.iter().take(limit as usize).cloned().collect())
    }

    async fn fetch_article(
        &self,
        lang: &str,
        title: &str,
        max_chars: usize,
    ) -> Result<Option<Article>> {
        self.fetches
            .lock()
            .expect("fetches")
            .push((title.to_string(), max_chars));
        Ok(self.pages.get(title).map(|content| Article {
            title: title.to_string(),
            content: content.clone(),
            url: format!("https://{lang}.wikipedia.org/wiki/{title}"),
        }))
    }
}

pub(crate) fn context(generator: Arc<FakeGenerator>, wiki: Arc<FakeWiki>) -> ApiContext {
    ApiContext {
        generator,
        wiki,
        default_lang: "ru".to_string(),
        api_key_length: 12,
    }
}
