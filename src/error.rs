use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PressError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("HTML payload too large: {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Rendered PDF too large: {size} bytes exceeds the {limit} byte limit")]
    ResultTooLarge { size: usize, limit: usize },

    #[error("Origin '{0}' is not allowed by CORS")]
    OriginNotAllowed(String),

    #[error("Render engine unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Render timed out during {stage} after {budget:?}")]
    RenderTimeout { stage: String, budget: Duration },

    #[error("Render engine fault: {0}")]
    EngineFault(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PressError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        PressError::InvalidInput(message.into())
    }

    pub fn engine_fault(message: impl Into<String>) -> Self {
        PressError::EngineFault(message.into())
    }

    pub fn timeout(stage: impl Into<String>, budget: Duration) -> Self {
        PressError::RenderTimeout {
            stage: stage.into(),
            budget,
        }
    }

    /// HTTP status code reported for this error at the handler boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            PressError::InvalidInput(_) | PressError::PayloadTooLarge { .. } => 400,
            PressError::OriginNotAllowed(_) => 403,
            PressError::ServiceUnavailable(_) => 503,
            PressError::ResultTooLarge { .. }
            | PressError::RenderTimeout { .. }
            | PressError::EngineFault(_)
            | PressError::Io(_)
            | PressError::Serialization(_)
            | PressError::Config(_) => 500,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PressError::RenderTimeout { .. })
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            PressError::InvalidInput(_) => ErrorPayload::new(
                ErrorCategory::InvalidInput,
                self.to_string(),
                "Send a JSON body with a non-empty `url` (http/https) or `html` string.",
            ),
            PressError::PayloadTooLarge { limit, .. } => ErrorPayload::new(
                ErrorCategory::PayloadTooLarge,
                self.to_string(),
                format!("Keep the HTML document under {} bytes or host it and send `url` instead.", limit),
            ),
            PressError::ResultTooLarge { .. } => ErrorPayload::new(
                ErrorCategory::ResultTooLarge,
                self.to_string(),
                "Reduce page count or embedded image sizes, or raise limits.max_pdf_bytes.",
            ),
            PressError::OriginNotAllowed(_) => ErrorPayload::new(
                ErrorCategory::OriginNotAllowed,
                self.to_string(),
                "Call the service from an allowed origin or add it to server.allowed_origins.",
            ),
            PressError::ServiceUnavailable(_) => ErrorPayload::new(
                ErrorCategory::ServiceUnavailable,
                self.to_string(),
                "Install Chromium (or set PAGEPRESS_CHROME / browser.executable) and restart the service.",
            ),
            PressError::RenderTimeout { stage, .. } => {
                let lower = stage.to_ascii_lowercase();
                let remediation = if lower.contains("readiness") {
                    "Check that the export section exists and that its images load; raise timeouts.readiness for image-heavy documents."
                } else if lower.contains("navigation") {
                    "Verify the URL resolves and responds; raise timeouts.navigation for slow pages."
                } else if lower.contains("pdf") {
                    "Simplify the document or raise timeouts.pdf."
                } else {
                    "Raise the matching value under [timeouts] and ensure the page finishes loading."
                };
                ErrorPayload::new(ErrorCategory::RenderTimeout, self.to_string(), remediation)
            }
            PressError::EngineFault(_) => ErrorPayload::new(
                ErrorCategory::EngineFault,
                self.to_string(),
                "The browser crashed or misbehaved; retrying the request may succeed.",
            ),
            PressError::Io(_) | PressError::Serialization(_) | PressError::Config(_) => {
                ErrorPayload::new(
                    ErrorCategory::Config,
                    self.to_string(),
                    "Check config file paths and values; run with --verbose for details.",
                )
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, PressError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCategory {
    InvalidInput,
    PayloadTooLarge,
    ResultTooLarge,
    OriginNotAllowed,
    ServiceUnavailable,
    RenderTimeout,
    EngineFault,
    Config,
}

/// JSON error body returned by the render routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub error: String,
    pub category: ErrorCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, error: String, remediation: impl Into<String>) -> Self {
        Self {
            error,
            category,
            remediation: Some(remediation.into()),
        }
    }
}
