//! Hides everything on the page except the export section.

use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::browser::scripts::{count_sections, inject_style, isolation_css};
use crate::browser::EngineSession;
use crate::{PressError, Result};

/// Injects the isolation style block and returns how many sections matched.
pub async fn isolate(
    session: &mut dyn EngineSession,
    selector: &str,
    budget: Duration,
) -> Result<u64> {
    let run = async {
        session
            .evaluate(&inject_style(&isolation_css(selector)))
            .await?;
        let count = session.evaluate(&count_sections(selector)).await?;
        Ok::<_, PressError>(count.as_u64().unwrap_or(0))
    };
    let sections = timeout(budget, run)
        .await
        .map_err(|_| PressError::timeout("isolation", budget))??;

    if sections == 0 {
        warn!(selector, "no export section found; showing the whole page");
    } else {
        info!(selector, sections, "isolated export section");
    }
    Ok(sections)
}
