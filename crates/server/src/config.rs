use std::{collections::HashMap, fs, time::Duration};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub wiki_default_lang: String,
    pub wiki_api_url: String,
    pub wiki_user_agent: String,
    pub generation_timeout_seconds: u64,
    pub wiki_timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:5000".into(),
            gemini_api_key: String::new(),
            gemini_model: "gemini-1.5-flash".into(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            wiki_default_lang: "ru".into(),
            wiki_api_url: "https://{lang}.wikipedia.org/w/api.php".into(),
            wiki_user_agent: "AutoConspect/2.0 (Educational Tool; Rust)".into(),
            generation_timeout_seconds: 120,
            wiki_timeout_seconds: 15,
        }
    }
}

impl Settings {
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_seconds.max(1))
    }

    pub fn wiki_timeout(&self) -> Duration {
        Duration::from_secs(self.wiki_timeout_seconds.max(1))
    }
}

pub fn load_settings() -> Settings {
    let file = fs::read_to_string("server.toml").ok();
    apply_overrides(file.as_deref(), |name| std::env::var(name).ok())
}

/// Defaults, then the flat `server.toml` table, then the environment.
pub fn apply_overrides(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        match toml::from_str::<HashMap<String, String>>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("bind_addr") {
                    settings.server_bind = v.clone();
                }
                if let Some(v) = file_cfg.get("gemini_api_key") {
                    settings.gemini_api_key = v.clone();
                }
                if let Some(v) = file_cfg.get("gemini_model") {
                    settings.gemini_model = v.clone();
                }
                if let Some(v) = file_cfg.get("gemini_base_url") {
                    settings.gemini_base_url = v.clone();
                }
                if let Some(v) = file_cfg.get("wiki_lang") {
                    settings.wiki_default_lang = v.clone();
                }
                if let Some(v) = file_cfg.get("wiki_api_url") {
                    settings.wiki_api_url = v.clone();
                }
            }
            Err(error) => {
                tracing::warn!(%error, "ignoring malformed server.toml");
            }
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("GEMINI_API_KEY") {
        settings.gemini_api_key = v;
    }
    if let Some(v) = env("APP__GEMINI_API_KEY") {
        settings.gemini_api_key = v;
    }

    if let Some(v) = env("GEMINI_MODEL") {
        settings.gemini_model = v;
    }
    if let Some(v) = env("APP__GEMINI_MODEL") {
        settings.gemini_model = v;
    }

    if let Some(v) = env("GEMINI_BASE_URL") {
        settings.gemini_base_url = v;
    }

    if let Some(v) = env("WIKI_LANG") {
        settings.wiki_default_lang = v;
    }
    if let Some(v) = env("APP__WIKI_LANG") {
        settings.wiki_default_lang = v;
    }

    if let Some(v) = env("WIKI_API_URL") {
        settings.wiki_api_url = v;
    }
    if let Some(v) = env("WIKI_USER_AGENT") {
        settings.wiki_user_agent = v;
    }

    if let Some(v) = env("APP__GENERATION_TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.generation_timeout_seconds = parsed;
        }
    }
    if let Some(v) = env("APP__WIKI_TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.wiki_timeout_seconds = parsed;
        }
    }

    settings.gemini_api_key = settings.gemini_api_key.trim().to_string();
    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
