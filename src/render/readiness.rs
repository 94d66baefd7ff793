//! Readiness gate: fonts, then images inside the target region, then a
//! short settle delay.

use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::browser::scripts::{readiness_probe, ReadinessSnapshot, FONTS_READY};
use crate::browser::EngineSession;
use crate::config::Config;
use crate::{PressError, Result};

/// How a bounded poll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessOutcome {
    Ready { polls: u32, snapshot: ReadinessSnapshot },
    TimedOut { polls: u32, last: Option<ReadinessSnapshot> },
}

/// Polls the image probe every `interval` until it reports ready or
/// `deadline` passes. A section must exist when `selector` is given.
pub async fn poll_images(
    session: &mut dyn EngineSession,
    selector: Option<&str>,
    deadline: Instant,
    interval: Duration,
) -> Result<ReadinessOutcome> {
    let script = readiness_probe(selector);
    let mut polls = 0;
    let mut last = None;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(ReadinessOutcome::TimedOut { polls, last });
        }

        let value = match timeout(remaining, session.evaluate(&script)).await {
            Ok(value) => value?,
            Err(_) => return Ok(ReadinessOutcome::TimedOut { polls, last }),
        };
        polls += 1;

        let snapshot: ReadinessSnapshot = serde_json::from_value(value)
            .map_err(|e| PressError::engine_fault(format!("unexpected readiness probe result: {}", e)))?;
        if snapshot.is_ready(selector.is_some()) {
            return Ok(ReadinessOutcome::Ready { polls, snapshot });
        }
        last = Some(snapshot);

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(ReadinessOutcome::TimedOut { polls, last });
        }
        sleep(interval.min(remaining)).await;
    }
}

/// Runs the full gate under the readiness budget.
pub async fn await_readiness(
    session: &mut dyn EngineSession,
    config: &Config,
    selector: Option<&str>,
) -> Result<()> {
    let budget = config.timeouts.readiness;
    let deadline = Instant::now() + budget;

    timeout(budget, session.evaluate(FONTS_READY))
        .await
        .map_err(|_| PressError::timeout("readiness (fonts)", budget))??;
    debug!("fonts ready");

    match poll_images(session, selector, deadline, config.readiness.poll_interval).await? {
        ReadinessOutcome::Ready { polls, snapshot } => {
            info!(
                polls,
                images = snapshot.images,
                backgrounds = snapshot.backgrounds,
                sections = snapshot.sections,
                "page ready"
            );
        }
        ReadinessOutcome::TimedOut { polls, last } => {
            match last {
                Some(s) if selector.is_some() && s.sections == 0 => {
                    warn!(polls, selector, "readiness timed out: export section never appeared")
                }
                Some(s) => warn!(polls, pending = s.pending, "readiness timed out with images pending"),
                None => warn!(polls, "readiness timed out before the first probe finished"),
            }
            return Err(PressError::timeout("readiness", budget));
        }
    }

    if !config.readiness.settle_delay.is_zero() {
        sleep(config.readiness.settle_delay).await;
    }
    Ok(())
}
