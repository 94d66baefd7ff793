use std::path::PathBuf;
use std::process::ExitCode;

use pagepress_lib::{probe_browser, EngineStatus};

use crate::cli::OutputFormat;
use crate::formatting::{render_error, write_output};
use crate::settings::load_config;

/// Run the check command: probe the browser and report its status.
pub async fn run_check(config_path: Option<PathBuf>, format: OutputFormat) -> ExitCode {
    let config = match load_config(config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, format),
    };

    let status = probe_browser(&config.browser).await;
    if let Err(err) = status.ensure_available() {
        return render_error(err, format);
    }

    let summary = match &status {
        EngineStatus::Available {
            executable,
            version,
        } => format!(
            "Browser available: {} ({})",
            executable,
            version.as_deref().unwrap_or("unknown version")
        ),
        EngineStatus::Unavailable { reason } => format!("Browser unavailable: {}", reason),
    };
    if let Err(err) = write_output(&status, format, &summary) {
        eprintln!("Failed to write output: {}", err);
        return ExitCode::from(2);
    }
    ExitCode::SUCCESS
}
