//! Loads request content into the page: URL navigation or inline HTML.

use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::scripts::{NetworkSnapshot, NETWORK_SNAPSHOT, REDISPATCH_LOAD};
use crate::browser::EngineSession;
use crate::config::{Config, ReadinessConfig, WaitCondition};
use crate::request::{CookieSpec, RenderRequest};
use crate::{PressError, Result};

pub async fn acquire(
    session: &mut dyn EngineSession,
    request: &RenderRequest,
    config: &Config,
) -> Result<()> {
    match request {
        RenderRequest::Url { url, cookies, .. } => load_url(session, url, cookies, config).await,
        RenderRequest::Html { html, cookies, .. } => load_html(session, html, cookies, config).await,
    }
}

async fn load_url(
    session: &mut dyn EngineSession,
    url: &Url,
    cookies: &[CookieSpec],
    config: &Config,
) -> Result<()> {
    let scoped: Vec<CookieSpec> = cookies.iter().map(|c| c.scoped_to(url)).collect();
    let budget = config.timeouts.navigation;
    let started = Instant::now();

    // Cookies, navigation and the load re-dispatch all share the navigation budget.
    let load = async {
        apply_cookies(session, &scoped).await;
        info!(%url, "navigating");
        session.navigate(url).await.map_err(|err| {
            warn!(%url, error = %err, "navigation failed");
            PressError::timeout(format!("navigation ({})", engine_detail(&err)), budget)
        })?;
        wait_for_load_state(session, &config.readiness).await?;
        if config.acquire.redispatch_load {
            if let Err(err) = session.evaluate(REDISPATCH_LOAD).await {
                warn!(error = %err, "failed to re-dispatch load event");
            }
        }
        Ok::<(), PressError>(())
    };
    timeout(budget, load)
        .await
        .map_err(|_| PressError::timeout("navigation", budget))??;

    info!(%url, elapsed_ms = started.elapsed().as_millis() as u64, "navigation finished");

    if !config.acquire.hydration_delay.is_zero() {
        sleep(config.acquire.hydration_delay).await;
    }
    Ok(())
}

async fn load_html(
    session: &mut dyn EngineSession,
    html: &str,
    cookies: &[CookieSpec],
    config: &Config,
) -> Result<()> {
    let (scoped, unscoped): (Vec<CookieSpec>, Vec<CookieSpec>) =
        cookies.iter().cloned().partition(CookieSpec::has_scope);
    for cookie in &unscoped {
        warn!(name = %cookie.name, "skipping cookie without url or domain for inline html");
    }
    let budget = config.timeouts.content;
    let started = Instant::now();
    let load = async {
        apply_cookies(session, &scoped).await;
        session.set_content(html).await?;
        wait_for_load_state(session, &config.readiness).await
    };
    timeout(budget, load)
        .await
        .map_err(|_| PressError::timeout("content load", budget))??;

    info!(
        bytes = html.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "content loaded"
    );
    Ok(())
}

/// Installs cookies one at a time; a failing cookie never aborts the render.
pub async fn apply_cookies(session: &mut dyn EngineSession, cookies: &[CookieSpec]) -> usize {
    let mut applied = 0;
    for cookie in cookies {
        match session.set_cookie(cookie).await {
            Ok(()) => applied += 1,
            Err(err) => warn!(name = %cookie.name, error = %err, "failed to set cookie"),
        }
    }
    if !cookies.is_empty() {
        debug!(applied, total = cookies.len(), "cookies applied");
    }
    applied
}

async fn wait_for_load_state(
    session: &mut dyn EngineSession,
    readiness: &ReadinessConfig,
) -> Result<()> {
    match readiness.wait_condition {
        WaitCondition::Load => Ok(()),
        WaitCondition::NetworkIdle => {
            wait_for_network_idle(session, readiness.network_idle_window, readiness.poll_interval)
                .await
        }
    }
}

/// Returns once the document is complete and the resource count has not
/// changed for `window`. Callers bound this with their own deadline.
pub async fn wait_for_network_idle(
    session: &mut dyn EngineSession,
    window: Duration,
    interval: Duration,
) -> Result<()> {
    let mut last: Option<NetworkSnapshot> = None;
    let mut stable_since = Instant::now();

    loop {
        let value = session.evaluate(NETWORK_SNAPSHOT).await?;
        let snapshot: NetworkSnapshot = serde_json::from_value(value)
            .map_err(|e| PressError::engine_fault(format!("unexpected load-state probe result: {}", e)))?;

        if !snapshot.is_complete() || last.as_ref() != Some(&snapshot) {
            stable_since = Instant::now();
            last = Some(snapshot);
        } else if stable_since.elapsed() >= window {
            return Ok(());
        }
        sleep(interval).await;
    }
}

fn engine_detail(err: &PressError) -> String {
    match err {
        PressError::EngineFault(detail) => detail.clone(),
        other => other.to_string(),
    }
}
