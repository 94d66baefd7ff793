//! Headless browser engine: the trait seam, the Chromium backend and the
//! startup probe.
//!
//! # Module Structure
//!
//! - [`engine`] - `RenderEngine` / `EngineSession` traits and `EngineStatus`
//! - [`chromium`] - `chromiumoxide` implementation, one process per render
//! - [`detect`] - browser binary discovery at startup
//! - [`scripts`] - JavaScript evaluated in the page

pub mod chromium;
pub mod detect;
pub mod engine;
pub mod scripts;

pub use chromium::{ChromiumEngine, ChromiumSession};
pub use detect::{probe_browser, BROWSER_CANDIDATES};
pub use engine::{EngineSession, EngineStatus, RenderEngine};
