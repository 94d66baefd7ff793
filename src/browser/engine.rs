//! Engine seam between the render pipeline and a concrete headless browser.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::options::PdfParams;
use crate::request::CookieSpec;
use crate::viewport::Viewport;
use crate::{PressError, Result};

/// Whether a browser binary was found at startup.
///
/// Held by the application state and checked before any per-request work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum EngineStatus {
    #[serde(rename_all = "camelCase")]
    Available {
        executable: String,
        version: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Unavailable { reason: String },
}

impl EngineStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, EngineStatus::Available { .. })
    }

    pub fn ensure_available(&self) -> Result<()> {
        match self {
            EngineStatus::Available { .. } => Ok(()),
            EngineStatus::Unavailable { reason } => {
                Err(PressError::ServiceUnavailable(reason.clone()))
            }
        }
    }
}

/// Launches one fresh browser per render.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Starts a browser process with a single blank page sized to `viewport`.
    async fn launch(&self, viewport: Viewport) -> Result<Box<dyn EngineSession>>;
}

/// One browser process and its page, owned by a single render.
#[async_trait]
pub trait EngineSession: Send {
    async fn set_cookie(&mut self, cookie: &CookieSpec) -> Result<()>;

    /// Navigates and waits for the `load` event.
    async fn navigate(&mut self, url: &Url) -> Result<()>;

    /// Replaces the document and waits for the `load` event.
    async fn set_content(&mut self, html: &str) -> Result<()>;

    /// Evaluates an expression, awaiting promises, and returns its JSON value.
    async fn evaluate(&mut self, expression: &str) -> Result<Value>;

    async fn emulate_screen_media(&mut self) -> Result<()>;

    async fn print_pdf(&mut self, params: &PdfParams) -> Result<Vec<u8>>;

    /// Graceful shutdown of page and process.
    async fn close(&mut self) -> Result<()>;

    /// Forced termination after a failed or stalled close.
    async fn kill(&mut self);
}
