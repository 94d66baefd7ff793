use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, info, warn};

use super::AppState;
use crate::render::RenderResult;
use crate::validate::classify;
use crate::{PressError, Result};

impl IntoResponse for PressError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }
        (status, Json(self.to_payload())).into_response()
    }
}

/// `POST /api/generate-pdf` (and `POST /` when enabled).
pub async fn generate_pdf(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Response> {
    let body = body.map_err(|rejection| body_rejection(rejection, &headers, &state))?;
    let request = classify(&body, &state.engine_status, &state.config.limits)?;
    info!(mode = %request.mode(), target = %request.describe(), "render request accepted");

    let permit = state
        .render_permits
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| PressError::ServiceUnavailable("render admission closed".to_string()))?;

    // The render owns its permit and session; a dropped connection does not cancel it.
    let renderer = state.renderer.clone();
    let task = tokio::spawn(async move {
        let _permit = permit;
        renderer.render(request).await
    });
    let result = task
        .await
        .map_err(|e| PressError::engine_fault(format!("render task failed: {}", e)))??;

    Ok(pdf_response(result))
}

fn body_rejection(rejection: BytesRejection, headers: &HeaderMap, state: &AppState) -> PressError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        let limit = state.config.limits.max_body_bytes();
        let size = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(limit.saturating_add(1));
        return PressError::PayloadTooLarge { size, limit };
    }
    PressError::invalid_input(format!("could not read request body: {}", rejection.body_text()))
}

fn pdf_response(result: RenderResult) -> Response {
    let length = result.len().to_string();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_LENGTH, length.as_str()),
            (header::CONTENT_DISPOSITION, "inline; filename=\"document.pdf\""),
        ],
        result.pdf,
    )
        .into_response()
}
