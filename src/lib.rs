//! Pagepress Library
//!
//! Renders a remote URL (with session cookies) or an inline HTML document to
//! a print-quality PDF with a fresh headless Chromium per request, behind an
//! HTTP API.
//!
//! # Module Overview
//!
//! - [`validate`] - Request classification and size ceilings
//! - [`render`] - Acquire, isolate, readiness, print; session lifecycle guard
//! - [`browser`] - Engine traits, Chromium backend and startup probe
//! - [`options`] - Page geometry options and their layered merge
//! - [`server`] - axum routes, CORS and admission control
//! - [`config`] - Configuration file support
//!
//! # Example
//!
//! ```no_run
//! use pagepress_lib::{classify, probe_browser, ChromiumEngine, Config, EngineStatus, Renderer};
//! use std::sync::Arc;
//!
//! # async fn example() -> pagepress_lib::Result<()> {
//! let config = Config::default();
//! let status = probe_browser(&config.browser).await;
//! let EngineStatus::Available { executable, .. } = &status else {
//!     return Ok(());
//! };
//! let engine = ChromiumEngine::new(executable, config.browser.clone(), &config.timeouts);
//!
//! let body = br#"{"html": "<html><body><h1>Test</h1></body></html>"}"#;
//! let request = classify(body, &status, &config.limits)?;
//! let renderer = Renderer::new(Arc::new(engine), Arc::new(config));
//! let result = renderer.render(request).await?;
//! println!("{} bytes", result.len());
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod config;
pub mod error;
pub mod length;
pub mod options;
pub mod render;
pub mod request;
pub mod server;
pub mod validate;
pub mod viewport;

pub use browser::{
    probe_browser, ChromiumEngine, EngineSession, EngineStatus, RenderEngine, BROWSER_CANDIDATES,
};
pub use config::{Config, Limits, Timeouts, WaitCondition};
pub use error::{ErrorCategory, ErrorPayload, PressError, Result};
pub use length::{Length, LengthUnit};
pub use options::{Margins, PaperFormat, PdfParams, RenderOptions};
pub use render::{ReadinessOutcome, RenderResult, Renderer, SessionGuard};
pub use request::{CookieSpec, RenderMode, RenderRequest, SameSite};
pub use server::{build_router, is_origin_allowed, AppState};
pub use validate::{classify, classify_value};
pub use viewport::Viewport;
