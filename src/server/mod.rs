//! HTTP surface: routes, shared state and graceful shutdown.
//!
//! | Route               | Method | Purpose                                  |
//! |---------------------|--------|------------------------------------------|
//! | `/api/generate-pdf` | POST   | render a URL or inline HTML to PDF       |
//! | `/`                 | POST   | same, when `server.root_render_route`    |
//! | `/`                 | GET    | liveness, empty 200                      |
//! | `/health`           | GET    | status, timestamp, uptime, memory        |
//! | `/info`             | GET    | engine status and limits                 |

pub mod cors;
pub mod handlers;
pub mod health;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::browser::{EngineStatus, RenderEngine};
use crate::config::Config;
use crate::render::Renderer;
use crate::Result;

pub use cors::is_origin_allowed;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub renderer: Renderer,
    pub engine_status: Arc<EngineStatus>,
    pub config: Arc<Config>,
    /// Admission limit for concurrent renders.
    pub render_permits: Arc<Semaphore>,
    pub started: Instant,
}

impl AppState {
    pub fn new(engine: Arc<dyn RenderEngine>, engine_status: EngineStatus, config: Config) -> Self {
        let config = Arc::new(config);
        let permits = config.server.max_concurrent_renders.max(1);
        Self {
            renderer: Renderer::new(engine, config.clone()),
            engine_status: Arc::new(engine_status),
            config,
            render_permits: Arc::new(Semaphore::new(permits)),
            started: Instant::now(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let allowlist = Arc::new(state.config.server.allowed_origins.clone());

    let mut render_routes = Router::new().route("/api/generate-pdf", post(handlers::generate_pdf));
    if state.config.server.root_render_route {
        render_routes = render_routes.route("/", post(handlers::generate_pdf));
    }
    let render_routes = render_routes
        .layer(DefaultBodyLimit::max(state.config.limits.max_body_bytes()))
        .layer(middleware::from_fn_with_state(
            allowlist.clone(),
            cors::enforce_origin,
        ));

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/info", get(health::info))
        .merge(render_routes)
        .layer(cors::cors_layer(allowlist))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until `shutdown` is cancelled, then drains in-flight requests.
pub async fn serve(listener: TcpListener, state: AppState, shutdown: CancellationToken) -> Result<()> {
    let addr = listener.local_addr()?;
    let root_route = state.config.server.root_render_route;
    let app = build_router(state);

    info!("pagepress listening on http://{}", addr);
    info!("  - POST /api/generate-pdf");
    if root_route {
        info!("  - POST /");
    }
    info!("  - GET  /health");
    info!("  - GET  /info");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("server stopped");
    Ok(())
}

/// Cancels `token` on Ctrl-C or SIGTERM.
pub fn spawn_shutdown_listener(token: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("failed to listen for ctrl-c: {e}");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::warn!("failed to listen for SIGTERM: {e}");
                    std::future::pending::<()>().await;
                }
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("ctrl-c received, shutting down"),
            _ = terminate => info!("SIGTERM received, shutting down"),
        }
        token.cancel();
    });
}
