//! Liveness and service information routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::browser::EngineStatus;
use crate::config::Limits;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub physical_bytes: usize,
    pub virtual_bytes: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    /// Seconds since the server started.
    pub uptime: f64,
    pub memory: Option<MemoryUsage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub engine: EngineStatus,
    pub limits: Limits,
    pub max_concurrent_renders: usize,
    pub root_render_route: bool,
}

pub async fn root() -> StatusCode {
    StatusCode::OK
}

/// Always 200, even when the render engine is unavailable.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let memory = memory_stats::memory_stats().map(|stats| MemoryUsage {
        physical_bytes: stats.physical_mem,
        virtual_bytes: stats.virtual_mem,
    });
    Json(HealthResponse {
        status: "OK",
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime: state.started.elapsed().as_secs_f64(),
        memory,
    })
}

pub async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        engine: (*state.engine_status).clone(),
        limits: state.config.limits,
        max_concurrent_renders: state.config.server.max_concurrent_renders,
        root_render_route: state.config.server.root_render_route,
    })
}
