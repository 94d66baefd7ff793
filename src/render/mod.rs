//! The rendering pipeline.
//!
//! [`Renderer::render`] launches a session, then runs the stages in order:
//!
//! 1. [`acquire`] loads the URL or inline HTML
//! 2. [`isolate`] hides everything but the export section (per mode)
//! 3. [`readiness`] waits for fonts and images
//! 4. [`pdf`] prints and checks the output
//!
//! [`guard::SessionGuard`] closes the session on every exit path.

pub mod acquire;
pub mod guard;
pub mod isolate;
pub mod pdf;
mod pipeline;
pub mod readiness;

pub use guard::SessionGuard;
pub use pipeline::{RenderResult, Renderer};
pub use readiness::ReadinessOutcome;
