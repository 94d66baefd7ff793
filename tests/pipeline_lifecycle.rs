mod common;

use common::{Fault, MockEngine, TEST_HTML};
use pagepress_lib::{
    classify_value, Config, PressError, RenderMode, RenderRequest, Renderer, Viewport,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

fn request(body: Value, config: &Config) -> RenderRequest {
    classify_value(body, &config.limits).expect("valid request")
}

fn renderer(engine: &Arc<MockEngine>, config: Config) -> Renderer {
    Renderer::new(engine.clone(), Arc::new(config))
}

fn stage_of(err: &PressError) -> &str {
    match err {
        PressError::RenderTimeout { stage, .. } => stage,
        other => panic!("expected a render timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn html_render_produces_pdf_and_closes_once() {
    let engine = Arc::new(MockEngine::healthy());
    let config = Config::default();
    let req = request(json!({ "html": TEST_HTML }), &config);

    let result = renderer(&engine, config).render(req).await.expect("render");

    assert!(result.pdf.starts_with(b"%PDF-"));
    assert_eq!(result.mode, RenderMode::Html);
    assert_eq!(engine.counters.launches(), 1);
    assert_eq!(engine.counters.closes(), 1);
    assert_eq!(engine.counters.kills(), 0);
    assert!(!engine.counters.ran_script_containing("pagepress-isolation"));
}

#[tokio::test(start_paused = true)]
async fn url_render_isolates_export_section_and_redispatches_load() {
    let engine = Arc::new(MockEngine::healthy());
    let config = Config::default();
    let req = request(json!({ "url": "https://example.com/report" }), &config);

    let result = renderer(&engine, config).render(req).await.expect("render");

    assert_eq!(result.mode, RenderMode::Url);
    assert_eq!(engine.counters.navigations(), 1);
    assert!(engine.counters.ran_script_containing("pagepress-isolation"));
    assert!(engine.counters.ran_script_containing("dispatchEvent"));
    assert_eq!(engine.counters.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn viewport_follows_mode_profile_and_overrides() {
    let engine = Arc::new(MockEngine::healthy());
    let config = Config::default();
    let renderer = renderer(&engine, config.clone());

    renderer
        .render(request(json!({ "url": "https://example.com" }), &config))
        .await
        .expect("url render");
    renderer
        .render(request(json!({ "html": TEST_HTML }), &config))
        .await
        .expect("html render");
    renderer
        .render(request(
            json!({ "html": TEST_HTML, "pdfOptions": { "width": "800px", "height": "600px" } }),
            &config,
        ))
        .await
        .expect("html render with overrides");

    let viewports = engine.counters.viewports.lock().unwrap().clone();
    assert_eq!(
        viewports,
        vec![
            Viewport { width: 1152, height: 864 },
            Viewport { width: 1200, height: 900 },
            Viewport { width: 800, height: 600 },
        ]
    );
    assert_eq!(engine.counters.launches(), 3);
    assert_eq!(engine.counters.closes(), 3);
}

#[tokio::test(start_paused = true)]
async fn navigation_hang_times_out_and_still_closes_browser() {
    let engine = Arc::new(MockEngine::new(Fault::HangNavigation));
    let config = Config::default();
    let req = request(json!({ "url": "https://slow.example.com" }), &config);

    let err = renderer(&engine, config).render(req).await.unwrap_err();

    assert_eq!(stage_of(&err), "navigation");
    assert_eq!(err.status_code(), 500);
    assert_eq!(engine.counters.closes(), 1);
    assert_eq!(engine.counters.prints(), 0);
}

#[tokio::test(start_paused = true)]
async fn navigation_failure_reports_engine_detail() {
    let engine = Arc::new(MockEngine::new(Fault::FailNavigation));
    let config = Config::default();
    let req = request(json!({ "url": "https://unresolvable.invalid" }), &config);

    let err = renderer(&engine, config).render(req).await.unwrap_err();

    let stage = stage_of(&err);
    assert!(stage.starts_with("navigation"), "got: {stage}");
    assert!(stage.contains("ERR_NAME_NOT_RESOLVED"), "got: {stage}");
    assert_eq!(engine.counters.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn content_hang_times_out_in_content_stage() {
    let engine = Arc::new(MockEngine::new(Fault::HangContent));
    let config = Config::default();
    let req = request(json!({ "html": TEST_HTML }), &config);

    let err = renderer(&engine, config).render(req).await.unwrap_err();

    assert_eq!(stage_of(&err), "content load");
    assert_eq!(engine.counters.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn images_that_never_load_end_in_readiness_timeout() {
    let engine = Arc::new(MockEngine::new(Fault::ImagesNeverLoad));
    let config = Config::default();
    let req = request(json!({ "html": TEST_HTML }), &config);

    let err = renderer(&engine, config).render(req).await.unwrap_err();

    assert_eq!(stage_of(&err), "readiness");
    assert_eq!(engine.counters.prints(), 0);
    assert_eq!(engine.counters.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn url_without_export_section_never_becomes_ready() {
    let engine = Arc::new(MockEngine::new(Fault::NoExportSection));
    let config = Config::default();
    let req = request(json!({ "url": "https://example.com/plain" }), &config);

    let err = renderer(&engine, config).render(req).await.unwrap_err();

    assert_eq!(stage_of(&err), "readiness");
    assert_eq!(engine.counters.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn html_without_export_section_renders_whole_document() {
    let engine = Arc::new(MockEngine::new(Fault::NoExportSection));
    let config = Config::default();
    let req = request(json!({ "html": TEST_HTML }), &config);

    let result = renderer(&engine, config).render(req).await.expect("render");

    assert!(result.pdf.starts_with(b"%PDF-"));
}

#[tokio::test(start_paused = true)]
async fn oversized_output_is_rejected_after_closing_browser() {
    let engine = Arc::new(MockEngine::new(Fault::OversizedPdf(4096)));
    let mut config = Config::default();
    config.limits.max_pdf_bytes = 1024;
    let req = request(json!({ "html": TEST_HTML }), &config);

    let err = renderer(&engine, config).render(req).await.unwrap_err();

    assert!(
        matches!(err, PressError::ResultTooLarge { size: 4096, limit: 1024 }),
        "got {err:?}"
    );
    assert_eq!(engine.counters.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn non_pdf_output_is_an_engine_fault() {
    let engine = Arc::new(MockEngine::new(Fault::NotPdf));
    let config = Config::default();
    let req = request(json!({ "html": TEST_HTML }), &config);

    let err = renderer(&engine, config).render(req).await.unwrap_err();

    assert!(matches!(err, PressError::EngineFault(_)), "got {err:?}");
    assert_eq!(engine.counters.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn panic_inside_render_becomes_engine_fault() {
    let engine = Arc::new(MockEngine::new(Fault::PanicOnPrint));
    let config = Config::default();
    let req = request(json!({ "html": TEST_HTML }), &config);

    let err = renderer(&engine, config).render(req).await.unwrap_err();

    match &err {
        PressError::EngineFault(msg) => assert!(msg.contains("mock print crashed"), "got: {msg}"),
        other => panic!("expected engine fault, got {other:?}"),
    }
    assert_eq!(engine.counters.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn stalled_close_falls_back_to_kill() {
    let engine = Arc::new(MockEngine::new(Fault::HangClose));
    let config = Config::default();
    let req = request(json!({ "html": TEST_HTML }), &config);

    let result = renderer(&engine, config).render(req).await.expect("render");

    assert!(!result.is_empty());
    assert_eq!(engine.counters.closes(), 1);
    assert_eq!(engine.counters.kills(), 1);
}

#[tokio::test(start_paused = true)]
async fn launch_failure_leaves_nothing_to_close() {
    let engine = Arc::new(MockEngine::new(Fault::LaunchFails));
    let config = Config::default();
    let req = request(json!({ "html": TEST_HTML }), &config);

    let err = renderer(&engine, config).render(req).await.unwrap_err();

    assert!(matches!(err, PressError::EngineFault(_)));
    assert_eq!(engine.counters.launches(), 1);
    assert_eq!(engine.counters.closes(), 0);
}

#[tokio::test(start_paused = true)]
async fn rejected_cookie_does_not_fail_render() {
    let engine = Arc::new(MockEngine::new(Fault::RejectCookie("broken".into())));
    let config = Config::default();
    let req = request(
        json!({
            "url": "https://app.example.com/dashboard",
            "cookies": [
                { "name": "session", "value": "abc" },
                { "name": "broken", "value": "x" }
            ]
        }),
        &config,
    );

    renderer(&engine, config).render(req).await.expect("render");

    assert_eq!(engine.counters.cookies(), 1);
}

#[tokio::test(start_paused = true)]
async fn html_mode_skips_cookies_without_scope() {
    let engine = Arc::new(MockEngine::healthy());
    let config = Config::default();
    let req = request(
        json!({
            "html": TEST_HTML,
            "cookies": [
                { "name": "loose", "value": "1" },
                { "name": "scoped", "value": "2", "domain": "example.com" }
            ]
        }),
        &config,
    );

    renderer(&engine, config).render(req).await.expect("render");

    assert_eq!(engine.counters.cookies(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancelled_render_still_closes_browser() {
    let engine = Arc::new(MockEngine::new(Fault::HangNavigation));
    let config = Config::default();
    let req = request(json!({ "url": "https://slow.example.com" }), &config);
    let renderer = renderer(&engine, config);

    let outcome = tokio::time::timeout(Duration::from_secs(5), renderer.render(req)).await;
    assert!(outcome.is_err(), "render should still be navigating");

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(engine.counters.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn identical_requests_produce_identical_output() {
    let engine = Arc::new(MockEngine::healthy());
    let config = Config::default();
    let renderer = renderer(&engine, config.clone());
    let body = json!({ "html": TEST_HTML, "pdfOptions": { "format": "A4" } });

    let first = renderer.render(request(body.clone(), &config)).await.expect("first");
    let second = renderer.render(request(body, &config)).await.expect("second");

    assert_eq!(first.pdf, second.pdf);
    assert_eq!(engine.counters.launches(), 2);
    assert_eq!(engine.counters.closes(), 2);
}

#[tokio::test(start_paused = true)]
async fn stalled_cookie_is_bounded_by_navigation_budget() {
    let engine = Arc::new(MockEngine::new(Fault::HangCookie));
    let config = Config::default();
    let worst_case = config.worst_case_latency(RenderMode::Url);
    let req = request(
        json!({ "url": "https://example.com", "cookies": [{ "name": "a", "value": "1" }] }),
        &config,
    );

    let started = tokio::time::Instant::now();
    let err = renderer(&engine, config).render(req).await.unwrap_err();

    assert_eq!(stage_of(&err), "navigation");
    assert!(started.elapsed() <= worst_case);
    assert_eq!(engine.counters.navigations(), 0);
    assert_eq!(engine.counters.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn stalled_cookie_is_bounded_by_content_budget() {
    let engine = Arc::new(MockEngine::new(Fault::HangCookie));
    let config = Config::default();
    let req = request(
        json!({
            "html": TEST_HTML,
            "cookies": [{ "name": "a", "value": "1", "domain": "example.com" }]
        }),
        &config,
    );

    let err = renderer(&engine, config).render(req).await.unwrap_err();

    assert_eq!(stage_of(&err), "content load");
    assert_eq!(engine.counters.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn margins_wider_than_page_are_rejected_before_launch() {
    let engine = Arc::new(MockEngine::healthy());
    let config = Config::default();
    let req = request(
        json!({
            "html": TEST_HTML,
            "pdfOptions": { "width": "4in", "margin": { "left": "3in", "right": "2in" } }
        }),
        &config,
    );

    let err = renderer(&engine, config).render(req).await.unwrap_err();

    assert!(matches!(err, PressError::InvalidInput(_)), "got {err:?}");
    assert_eq!(err.status_code(), 400);
    assert_eq!(engine.counters.launches(), 0);
}
