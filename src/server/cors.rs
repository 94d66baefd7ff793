//! Origin allowlist shared by the CORS layer and the origin gate.

use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, ORIGIN};
use axum::http::{HeaderValue, Method};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::PressError;

/// Requests without an `Origin` are allowed; `"*"` in the list allows all.
pub fn is_origin_allowed(origin: Option<&str>, allowlist: &[String]) -> bool {
    let Some(origin) = origin else {
        return true;
    };
    let origin = origin.trim().trim_end_matches('/');
    allowlist.iter().any(|allowed| {
        let allowed = allowed.trim();
        allowed == "*" || allowed.trim_end_matches('/').eq_ignore_ascii_case(origin)
    })
}

pub fn cors_layer(allowlist: Arc<Vec<String>>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|origin| is_origin_allowed(Some(origin), &allowlist))
                .unwrap_or(false)
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

/// Rejects requests from origins outside the allowlist with 403.
pub async fn enforce_origin(
    State(allowlist): State<Arc<Vec<String>>>,
    request: Request,
    next: Next,
) -> Result<Response, PressError> {
    let origin = request
        .headers()
        .get(ORIGIN)
        .map(|v| v.to_str().unwrap_or_default().to_string());
    if !is_origin_allowed(origin.as_deref(), &allowlist) {
        return Err(PressError::OriginNotAllowed(origin.unwrap_or_default()));
    }
    Ok(next.run(request).await)
}
