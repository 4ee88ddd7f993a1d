use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn is_ready(&self) -> bool;
    fn model_name(&self) -> &str;
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<OutgoingPart<'a>>,
}

#[derive(Serialize)]
struct OutgoingPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<IncomingPart>,
}

#[derive(Debug, Deserialize)]
struct IncomingPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Google Gemini `generateContent` client. Without an API key it reports
/// itself as not ready and refuses to generate.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("build gemini http client")?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn is_ready(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        if !self.is_ready() {
            return Err(anyhow!("gemini api key is not configured"));
        }

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![OutgoingPart { text: prompt }],
            }],
        };

        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("gemini request")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("gemini http {status}: {text}"));
        }

        let parsed: GenerateContentResponse = resp.json().await.context("gemini json")?;
        extract_text(parsed)
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String> {
    let mut finish_reason = None;
    for candidate in response.candidates {
        let text: String = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        if !text.trim().is_empty() {
            return Ok(text);
        }
        finish_reason = finish_reason.or(candidate.finish_reason);
    }

    let reason = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
        .or(finish_reason)
        .unwrap_or_else(|| "no candidates".to_string());
    Err(anyhow!("gemini returned no text ({reason})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::HeaderMap, routing::post, Json, Router};
    use tokio::net::TcpListener;

    async fn fake_generate(
        Path(rest): Path<String>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> Json<serde_json::Value> {
        if rest != "models/gemini-test:generateContent" {
            return Json(serde_json::json!({ "candidates": [] }));
        }
        let key = headers
            .get("x-goog-api-key")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let prompt = body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        Json(serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": format!("{key}:")}, {"text": prompt}]},
                "finishReason": "STOP"
            }]
        }))
    }

    #[tokio::test]
    async fn generates_text_from_candidate_parts() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let app = Router::new().route("/v1beta/*rest", post(fake_generate));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let client = GeminiClient::new(
            "k-123",
            "gemini-test",
            format!("http://{addr}/v1beta/"),
            Duration::from_secs(5),
        )
        .expect("client");
        assert!(client.is_ready());
        let text = client.generate("Напиши эссе").await.expect("generate");
        assert_eq!(text, "k-123:Напиши эссе");
    }

    #[tokio::test]
    async fn missing_key_is_not_ready() {
        let client = GeminiClient::new("", "m", "http://127.0.0.1:9", Duration::from_secs(1))
            .expect("client");
        assert!(!client.is_ready());
        assert!(client.generate("x").await.is_err());
    }

    #[test]
    fn blocked_prompt_reports_reason() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .expect("decode");
        let err = extract_text(response).expect_err("blocked");
        assert!(err.to_string().contains("SAFETY"));
    }
}
