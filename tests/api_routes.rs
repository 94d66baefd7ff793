mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use common::{available, fast_config, unavailable, Fault, MockEngine, TEST_HTML};
use pagepress_lib::{build_router, AppState, Config, EngineStatus};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app(engine: &Arc<MockEngine>, status: EngineStatus, config: Config) -> Router {
    build_router(AppState::new(engine.clone(), status, config))
}

fn render_post(path: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json body")
}

#[tokio::test]
async fn html_request_returns_inline_pdf() {
    let engine = Arc::new(MockEngine::healthy());
    let app = app(&engine, available(), fast_config());

    let response = app
        .oneshot(render_post(
            "/api/generate-pdf",
            json!({ "html": TEST_HTML }).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "inline; filename=\"document.pdf\""
    );
    let declared: usize = headers[header::CONTENT_LENGTH]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();

    let bytes = body_bytes(response).await;
    assert_eq!(&bytes[..5], b"%PDF-");
    assert_eq!(bytes.len(), declared);
    assert_eq!(engine.counters.closes(), 1);
}

#[tokio::test]
async fn missing_input_is_rejected_without_launching() {
    let engine = Arc::new(MockEngine::healthy());
    let app = app(&engine, available(), fast_config());

    let response = app
        .oneshot(render_post("/api/generate-pdf", json!({}).to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Missing url or html content"));
    assert_eq!(engine.counters.launches(), 0);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let engine = Arc::new(MockEngine::healthy());
    let app = app(&engine, available(), fast_config());

    let response = app
        .oneshot(render_post("/api/generate-pdf", "{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["category"], "invalidInput");
    assert_eq!(engine.counters.launches(), 0);
}

#[tokio::test]
async fn non_http_url_is_a_bad_request() {
    let engine = Arc::new(MockEngine::healthy());
    let app = app(&engine, available(), fast_config());

    let response = app
        .oneshot(render_post(
            "/api/generate-pdf",
            json!({ "url": "file:///etc/passwd" }).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(engine.counters.launches(), 0);
}

#[tokio::test]
async fn html_at_ceiling_is_accepted_and_one_byte_more_is_rejected() {
    let mut config = fast_config();
    config.limits.max_html_bytes = 1024;

    let at_limit = "x".repeat(1024);
    let engine = Arc::new(MockEngine::healthy());
    let response = app(&engine, available(), config.clone())
        .oneshot(render_post(
            "/api/generate-pdf",
            json!({ "html": at_limit }).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let over_limit = "x".repeat(1025);
    let engine = Arc::new(MockEngine::healthy());
    let response = app(&engine, available(), config)
        .oneshot(render_post(
            "/api/generate-pdf",
            json!({ "html": over_limit }).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["category"], "payloadTooLarge");
    assert_eq!(engine.counters.launches(), 0);
}

#[tokio::test]
async fn body_over_transport_limit_is_payload_too_large() {
    let mut config = fast_config();
    config.limits.max_html_bytes = 16;
    let limit = config.limits.max_body_bytes();

    let engine = Arc::new(MockEngine::healthy());
    let oversized = format!(r#"{{"html":"{}"}}"#, "y".repeat(limit + 10));
    let response = app(&engine, available(), config)
        .oneshot(render_post("/api/generate-pdf", oversized))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["category"], "payloadTooLarge");
    assert_eq!(engine.counters.launches(), 0);
}

#[tokio::test]
async fn unavailable_engine_returns_503_for_valid_requests() {
    let engine = Arc::new(MockEngine::healthy());
    let app = app(&engine, unavailable(), fast_config());

    let response = app
        .oneshot(render_post(
            "/api/generate-pdf",
            json!({ "html": TEST_HTML }).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(engine.counters.launches(), 0);
}

#[tokio::test]
async fn render_failure_maps_to_500_with_payload() {
    let engine = Arc::new(MockEngine::new(Fault::NotPdf));
    let app = app(&engine, available(), fast_config());

    let response = app
        .oneshot(render_post(
            "/api/generate-pdf",
            json!({ "html": TEST_HTML }).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].is_string());
    assert_eq!(engine.counters.closes(), 1);
}

#[tokio::test]
async fn disallowed_origin_is_forbidden() {
    let engine = Arc::new(MockEngine::healthy());
    let app = app(&engine, available(), fast_config());

    let request = Request::builder()
        .method("POST")
        .uri("/api/generate-pdf")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ORIGIN, "https://evil.example.com")
        .body(Body::from(json!({ "html": TEST_HTML }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(engine.counters.launches(), 0);
}

#[tokio::test]
async fn allowed_origin_gets_cors_headers() {
    let engine = Arc::new(MockEngine::healthy());
    let app = app(&engine, available(), fast_config());

    let request = Request::builder()
        .method("POST")
        .uri("/api/generate-pdf")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::from(json!({ "html": TEST_HTML }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
}

#[tokio::test]
async fn root_post_only_renders_when_enabled() {
    let engine = Arc::new(MockEngine::healthy());
    let response = app(&engine, available(), fast_config())
        .oneshot(render_post("/", json!({ "html": TEST_HTML }).to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(engine.counters.launches(), 0);

    let mut config = fast_config();
    config.server.root_render_route = true;
    let response = app(&engine, available(), config)
        .oneshot(render_post("/", json!({ "html": TEST_HTML }).to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(engine.counters.launches(), 1);
}

#[tokio::test]
async fn root_get_is_empty_ok() {
    let engine = Arc::new(MockEngine::healthy());
    let response = app(&engine, available(), fast_config())
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn health_reports_ok_even_without_engine() {
    let engine = Arc::new(MockEngine::healthy());
    let response = app(&engine, unavailable(), fast_config())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "OK");
    assert!(body["timestamp"].as_str().unwrap().contains('T'));
    assert!(body["uptime"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn info_describes_engine_and_limits() {
    let engine = Arc::new(MockEngine::healthy());
    let response = app(&engine, available(), fast_config())
        .oneshot(Request::builder().uri("/info").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "pagepress");
    assert_eq!(body["engine"]["status"], "available");
    assert_eq!(body["maxConcurrentRenders"], 4);
    assert!(body["limits"].is_object());
}

#[tokio::test]
async fn repeated_requests_each_get_a_fresh_browser() {
    let engine = Arc::new(MockEngine::healthy());
    let app = app(&engine, available(), fast_config());
    let body = json!({ "html": TEST_HTML, "pdfOptions": { "format": "Letter" } }).to_string();

    let first = app
        .clone()
        .oneshot(render_post("/api/generate-pdf", body.clone()))
        .await
        .unwrap();
    let second = app
        .oneshot(render_post("/api/generate-pdf", body))
        .await
        .unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    let first = body_bytes(first).await;
    let second = body_bytes(second).await;
    assert_eq!(first.len(), second.len());
    assert_eq!(engine.counters.launches(), 2);
    assert_eq!(engine.counters.closes(), 2);
}

#[tokio::test]
async fn unreachable_url_is_a_render_timeout() {
    let engine = Arc::new(MockEngine::new(Fault::FailNavigation));
    let app = app(&engine, available(), fast_config());

    let response = app
        .oneshot(render_post(
            "/api/generate-pdf",
            json!({ "url": "https://example.invalid", "cookies": [] }).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["category"], "renderTimeout");
    assert_eq!(engine.counters.closes(), 1);
}
