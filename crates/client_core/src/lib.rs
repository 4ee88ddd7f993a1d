use std::{
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use shared::protocol::{
    generate_route, status_route, wiki_search_route, GenerateRequest, GenerateResponse,
    StatusResponse, WikiSearchRequest, WikiSearchResponse,
};
use tokio::sync::watch;
use tracing::{info, warn};
use url::Url;

pub mod actions;
pub mod captions;
pub mod composer;
pub mod error;

pub use actions::{ClipboardSink, DownloadFile};
pub use captions::{CaptionSchedule, CaptionStep};
pub use composer::{
    format_pages, format_stats, ComposerState, GenerateOutcome, Header, ModeButton,
    RequestTicket, SearchOutcome, WikiCard, WikiResultsView, WikiStatus, WIKI_LANGUAGES,
};
pub use error::{ComposerError, ValidationPrompt};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(180);

/// The two remote calls the composer depends on.
#[async_trait]
pub trait ComposerBackend: Send + Sync {
    async fn search_wikipedia(&self, request: &WikiSearchRequest) -> Result<WikiSearchResponse>;
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse>;
}

pub struct MissingComposerBackend;

#[async_trait]
impl ComposerBackend for MissingComposerBackend {
    async fn search_wikipedia(&self, _request: &WikiSearchRequest) -> Result<WikiSearchResponse> {
        Err(anyhow!("composer backend is not configured"))
    }

    async fn generate(&self, _request: &GenerateRequest) -> Result<GenerateResponse> {
        Err(anyhow!("composer backend is not configured"))
    }
}

#[async_trait]
impl<T> ComposerBackend for Arc<T>
where
    T: ComposerBackend + ?Sized,
{
    async fn search_wikipedia(&self, request: &WikiSearchRequest) -> Result<WikiSearchResponse> {
        self.as_ref().search_wikipedia(request).await
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        self.as_ref().generate(request).await
    }
}

/// Talks to the generation service over HTTP. Response bodies are decoded
/// whatever the status code, so error envelopes reach the composer as
/// ordinary `success: false` responses.
#[derive(Clone)]
pub struct HttpBackend {
    http: Client,
    server_url: Url,
}

impl HttpBackend {
    pub fn new(server_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self> {
        let mut server_url = Url::parse(server_url.trim())
            .with_context(|| format!("invalid server url: {server_url}"))?;
        if server_url.cannot_be_a_base() {
            return Err(anyhow!("server url cannot be used as a base: {server_url}"));
        }
        if !server_url.path().ends_with('/') {
            let path = format!("{}/", server_url.path());
            server_url.set_path(&path);
        }
        Ok(Self { http, server_url })
    }

    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    fn endpoint(&self, route: &str) -> Result<Url> {
        self.server_url
            .join(route.trim_start_matches('/'))
            .with_context(|| format!("failed to build endpoint for {route}"))
    }

    async fn decode<T: DeserializeOwned>(url: &Url, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .with_context(|| format!("failed to read response from {url}"))?;
        serde_json::from_slice(&body)
            .with_context(|| format!("unexpected response from {url} (HTTP {status})"))
    }

    async fn post_json<Req, Resp>(&self, route: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = self.endpoint(route)?;
        let response = self
            .http
            .post(url.clone())
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        Self::decode(&url, response).await
    }

    pub async fn status(&self) -> Result<StatusResponse> {
        let url = self.endpoint(status_route())?;
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()?;
        Self::decode(&url, response).await
    }
}

#[async_trait]
impl ComposerBackend for HttpBackend {
    async fn search_wikipedia(&self, request: &WikiSearchRequest) -> Result<WikiSearchResponse> {
        self.post_json(wiki_search_route(), request).await
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        self.post_json(generate_route(), request).await
    }
}

fn timeout_message(limit: Duration) -> String {
    format!("превышено время ожидания ({} с)", limit.as_secs())
}

/// Runs a search with a deadline. Every failure, including the deadline,
/// comes back as [`SearchOutcome::Transport`].
pub async fn request_search<B>(
    backend: &B,
    request: &WikiSearchRequest,
    limit: Duration,
) -> SearchOutcome
where
    B: ComposerBackend + ?Sized,
{
    match tokio::time::timeout(limit, backend.search_wikipedia(request)).await {
        Ok(Ok(response)) => SearchOutcome::Response(response),
        Ok(Err(err)) => SearchOutcome::Transport(format!("{err:#}")),
        Err(_) => {
            warn!(query = %request.query, ?limit, "wiki search timed out");
            SearchOutcome::Transport(timeout_message(limit))
        }
    }
}

pub async fn request_generation<B>(
    backend: &B,
    request: &GenerateRequest,
    limit: Duration,
) -> GenerateOutcome
where
    B: ComposerBackend + ?Sized,
{
    match tokio::time::timeout(limit, backend.generate(request)).await {
        Ok(Ok(response)) => GenerateOutcome::Response(response),
        Ok(Err(err)) => GenerateOutcome::Transport(format!("{err:#}")),
        Err(_) => {
            warn!(mode = request.mode.key(), ?limit, "generation timed out");
            GenerateOutcome::Transport(timeout_message(limit))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestEnd {
    Completed,
    Cancelled,
}

/// Async driver that owns a [`ComposerState`] and a backend and runs each
/// request from `begin_*` to `finish_*` (or `cancel_*`), so the controls are
/// always released.
pub struct Composer<B> {
    state: ComposerState,
    backend: B,
    search_timeout: Duration,
    generation_timeout: Duration,
    captions: watch::Sender<Option<String>>,
}

impl<B: ComposerBackend> Composer<B> {
    pub fn new(backend: B) -> Self {
        let (captions, _) = watch::channel(None);
        Self {
            state: ComposerState::new(),
            backend,
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
            captions,
        }
    }

    pub fn with_timeouts(mut self, search: Duration, generation: Duration) -> Self {
        self.search_timeout = search;
        self.generation_timeout = generation;
        self
    }

    pub fn state(&self) -> &ComposerState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ComposerState {
        &mut self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Current loading caption; `None` while idle.
    pub fn subscribe_captions(&self) -> watch::Receiver<Option<String>> {
        self.captions.subscribe()
    }

    pub async fn search(&mut self) -> Result<WikiStatus, ValidationPrompt> {
        self.search_until(std::future::pending()).await?;
        Ok(self.state.wiki_status())
    }

    pub async fn search_until<C>(&mut self, cancel: C) -> Result<RequestEnd, ValidationPrompt>
    where
        C: Future<Output = ()>,
    {
        let (ticket, request) = self.state.begin_search()?;
        let call = request_search(&self.backend, &request, self.search_timeout);
        let outcome = tokio::select! {
            outcome = call => Some(outcome),
            () = cancel => None,
        };
        match outcome {
            Some(outcome) => {
                self.state.finish_search(ticket, outcome);
                Ok(RequestEnd::Completed)
            }
            None => {
                self.state.cancel_search();
                Ok(RequestEnd::Cancelled)
            }
        }
    }

    pub async fn generate(&mut self) -> Result<RequestEnd, ValidationPrompt> {
        self.generate_until(std::future::pending()).await
    }

    /// Sends the generation request while playing the caption schedule.
    /// The caption timer is dropped as soon as the request settles.
    pub async fn generate_until<C>(&mut self, cancel: C) -> Result<RequestEnd, ValidationPrompt>
    where
        C: Future<Output = ()>,
    {
        let started = Instant::now();
        let (ticket, request) = self.state.begin_generation(started)?;
        let schedule = CaptionSchedule::for_generation(request.use_wikipedia);

        let outcome = {
            let call = request_generation(&self.backend, &request, self.generation_timeout);
            let captions = schedule.play(&self.captions);
            tokio::select! {
                outcome = call => Some(outcome),
                () = cancel => None,
                never = captions => match never {},
            }
        };
        self.captions.send_replace(None);

        let end = match outcome {
            Some(outcome) => {
                self.state.finish_generation(ticket, outcome);
                RequestEnd::Completed
            }
            None => {
                self.state.cancel_generation();
                RequestEnd::Cancelled
            }
        };
        info!(?end, elapsed_ms = started.elapsed().as_millis() as u64, "generation settled");
        Ok(end)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
