use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{
        generate_route, status_route, wiki_search_route, GenerateRequest, GenerateResponse,
        StatusResponse, WikiSearchRequest, WikiSearchResponse,
    },
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;
mod gemini;
mod wiki;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

use api::ApiContext;
use app_state::AppState;
use config::load_settings;
use gemini::GeminiClient;
use wiki::WikiClient;

const MAX_BODY_BYTES: usize = 1024 * 1024;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    info!(
        key_configured = !settings.gemini_api_key.is_empty(),
        key_length = settings.gemini_api_key.len(),
        model = %settings.gemini_model,
        "gemini settings loaded"
    );

    let generator = GeminiClient::new(
        settings.gemini_api_key.clone(),
        settings.gemini_model.clone(),
        settings.gemini_base_url.clone(),
        settings.generation_timeout(),
    )?;
    let wiki = WikiClient::new(
        settings.wiki_api_url.clone(),
        &settings.wiki_user_agent,
        settings.wiki_timeout(),
    )?;
    let api = ApiContext {
        generator: Arc::new(generator),
        wiki: Arc::new(wiki),
        default_lang: settings.wiki_default_lang.clone(),
        api_key_length: settings.gemini_api_key.len(),
    };

    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(status_route(), get(http_status))
        .route(generate_route(), post(http_generate))
        .route(wiki_search_route(), post(http_wiki_search))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn status_code_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::Upstream => StatusCode::BAD_GATEWAY,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(error: ApiError) -> (StatusCode, Json<ApiError>) {
    (status_code_for(error.code), Json(error))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(api::status(&state.api))
}

async fn http_generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> ApiResult<GenerateResponse> {
    let response = api::generate(&state.api, &req).await.map_err(reject)?;
    Ok(Json(response))
}

async fn http_wiki_search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WikiSearchRequest>,
) -> ApiResult<WikiSearchResponse> {
    let response = api::search_articles(&state.api, &req)
        .await
        .map_err(reject)?;
    Ok(Json(response))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
