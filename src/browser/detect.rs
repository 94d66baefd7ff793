//! Startup probe for a Chromium-family browser binary.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::engine::EngineStatus;
use crate::config::BrowserSettings;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Binaries tried in order when no executable is configured.
pub const BROWSER_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
];

#[derive(Debug, Error)]
enum ProbeError {
    #[error("not found")]
    NotFound,
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
    #[error("{0}")]
    Failed(String),
}

async fn probe_version(executable: &Path) -> Result<Option<String>, ProbeError> {
    let mut cmd = Command::new(executable);
    cmd.arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let output = tokio::time::timeout(PROBE_TIMEOUT, cmd.output())
        .await
        .map_err(|_| ProbeError::TimedOut(PROBE_TIMEOUT))?
        .map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => ProbeError::NotFound,
            _ => ProbeError::Failed(err.to_string()),
        })?;

    if !output.status.success() {
        return Err(ProbeError::Failed(format!("exit {}", output.status)));
    }

    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok((!version.is_empty()).then_some(version))
}

fn candidates(settings: &BrowserSettings) -> Vec<PathBuf> {
    match &settings.executable {
        Some(path) => vec![path.clone()],
        None => BROWSER_CANDIDATES.iter().map(PathBuf::from).collect(),
    }
}

/// Probes the configured executable, or each well-known name on `PATH`.
pub async fn probe_browser(settings: &BrowserSettings) -> EngineStatus {
    let mut failures = Vec::new();

    for candidate in candidates(settings) {
        match probe_version(&candidate).await {
            Ok(version) => {
                info!(
                    executable = %candidate.display(),
                    version = version.as_deref().unwrap_or("unknown"),
                    "browser available"
                );
                return EngineStatus::Available {
                    executable: candidate.display().to_string(),
                    version,
                };
            }
            Err(err) => {
                debug!(executable = %candidate.display(), error = %err, "browser probe failed");
                failures.push(format!("{} ({})", candidate.display(), err));
            }
        }
    }

    let reason = format!("no usable browser found: {}", failures.join(", "));
    warn!(%reason, "render routes will answer 503");
    EngineStatus::Unavailable { reason }
}
