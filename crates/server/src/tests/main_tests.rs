use super::*;
use crate::test_support::{context, FakeGenerator, FakeWiki};
use axum::{
    body::{self, Body},
    http::Request,
    response::Response,
};
use tower::ServiceExt;

fn test_app(generator: FakeGenerator, wiki: FakeWiki) -> Router {
    let api = context(Arc::new(generator), Arc::new(wiki));
    build_router(Arc::new(AppState { api }))
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let app = test_app(FakeGenerator::replying("x"), FakeWiki::default());
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn generate_route_returns_result_and_stats() {
    let app = test_app(FakeGenerator::replying("ABC"), FakeWiki::default());
    let response = app
        .oneshot(post_json(
            "/generate",
            serde_json::json!({
                "mode": "essay",
                "topic": "Дружба",
                "volume": "long",
                "style": "simple",
                "author_info": {"name": "", "edu_type": "Студент", "grade": "2",
                                "institution": "", "group": "", "teacher": "",
                                "include_title": false}
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let dto: GenerateResponse = json_body(response).await;
    assert!(dto.success);
    assert_eq!(dto.result.as_deref(), Some("ABC"));
    let stats = dto.stats.expect("stats");
    assert_eq!((stats.words, stats.chars), (1, 3));
}

#[tokio::test]
async fn generate_route_rejects_empty_topic_with_error_envelope() {
    let app = test_app(FakeGenerator::replying("x"), FakeWiki::default());
    let response = app
        .oneshot(post_json("/generate", serde_json::json!({ "mode": "referat" })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let dto: GenerateResponse = json_body(response).await;
    assert!(!dto.success);
    assert_eq!(dto.error.as_deref(), Some("Введите тему!"));
}

#[tokio::test]
async fn generate_route_maps_generator_failure_to_bad_gateway() {
    let app = test_app(FakeGenerator::failing("boom"), FakeWiki::default());
    let response = app
        .oneshot(post_json("/generate", serde_json::json!({ "topic": "Тема" })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let err: ApiError = json_body(response).await;
    assert_eq!(err.code, ErrorCode::Upstream);
    assert!(err.message.contains("boom"));
}

#[tokio::test]
async fn generate_route_reports_missing_key() {
    let app = test_app(FakeGenerator::unconfigured(), FakeWiki::default());
    let response = app
        .oneshot(post_json("/generate", serde_json::json!({ "topic": "Тема" })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn wiki_search_route_returns_results() {
    let wiki = FakeWiki::default()
        .with_page("Луна", "Луна — спутник.")
        .with_page("Лунная орбита", "Орбита.");
    let app = test_app(FakeGenerator::replying("x"), wiki);
    let response = app
        .oneshot(post_json(
            "/wiki/search",
            serde_json::json!({ "query": "Луна", "lang": "ru" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let dto: WikiSearchResponse = json_body(response).await;
    assert!(dto.success);
    assert_eq!(dto.results.len(), 2);
    assert_eq!(dto.results[1].title, "Лунная орбита");
}

#[tokio::test]
async fn wiki_search_route_rejects_empty_query() {
    let app = test_app(FakeGenerator::replying("x"), FakeWiki::default());
    let response = app
        .oneshot(post_json("/wiki/search", serde_json::json!({ "query": "" })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_route_exposes_model_and_key_presence() {
    let app = test_app(FakeGenerator::replying("x"), FakeWiki::default());
    let request = Request::get("/status")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let dto: StatusResponse = json_body(response).await;
    assert!(dto.api_ready);
    assert_eq!(dto.model, "fake-model");
    assert!(dto.key_exists);
}

#[tokio::test]
async fn oversized_body_is_refused() {
    let app = test_app(FakeGenerator::replying("x"), FakeWiki::default());
    let topic = "а".repeat(MAX_BODY_BYTES);
    let response = app
        .oneshot(post_json("/generate", serde_json::json!({ "topic": topic })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
