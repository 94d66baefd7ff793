mod check;
mod render;
mod serve;

pub use check::run_check;
pub use render::run_render;
pub use serve::run_serve;

use std::path::PathBuf;
use std::sync::Arc;

use pagepress_lib::{ChromiumEngine, Config, EngineStatus, RenderEngine};

/// Chromium engine for the probed executable. When the probe failed the
/// engine is never launched: validation answers 503 first.
fn build_engine(status: &EngineStatus, config: &Config) -> Arc<dyn RenderEngine> {
    let executable = match status {
        EngineStatus::Available { executable, .. } => PathBuf::from(executable),
        EngineStatus::Unavailable { .. } => config
            .browser
            .executable
            .clone()
            .unwrap_or_else(|| PathBuf::from("chromium")),
    };
    Arc::new(ChromiumEngine::new(
        executable,
        config.browser.clone(),
        &config.timeouts,
    ))
}
