//! Orchestrates one render from launch to teardown.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, error, info};

use super::guard::{panic_message, SessionGuard};
use super::{acquire, isolate, pdf, readiness};
use crate::browser::RenderEngine;
use crate::config::Config;
use crate::options::PdfParams;
use crate::request::{RenderMode, RenderRequest};
use crate::validate::summarize_html;
use crate::{PressError, Result};

/// PDF bytes produced by a successful render.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub pdf: Vec<u8>,
    pub mode: RenderMode,
    pub elapsed: Duration,
}

impl RenderResult {
    pub fn len(&self) -> usize {
        self.pdf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pdf.is_empty()
    }
}

/// Runs validated requests through a fresh browser session each.
#[derive(Clone)]
pub struct Renderer {
    engine: Arc<dyn RenderEngine>,
    config: Arc<Config>,
}

impl Renderer {
    pub fn new(engine: Arc<dyn RenderEngine>, config: Arc<Config>) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn render(&self, request: RenderRequest) -> Result<RenderResult> {
        let started = Instant::now();
        let mode = request.mode();
        let params = request
            .option_layers()
            .merged_over(self.config.profiles.for_mode(mode))
            .resolve();
        params.check_printable()?;

        if let RenderRequest::Html { html, .. } = &request {
            let summary = summarize_html(html);
            debug!(
                bytes = summary.bytes,
                has_head = summary.has_head,
                styles = summary.styles,
                links = summary.links,
                images = summary.images,
                scripts = summary.scripts,
                "inline html summary"
            );
        }
        info!(%mode, target = %request.describe(), engine = self.engine.name(), "render started");

        let launch_budget = self.config.timeouts.launch;
        let session = timeout(launch_budget, self.engine.launch(params.viewport()))
            .await
            .map_err(|_| PressError::timeout("browser launch", launch_budget))??;
        let mut guard = SessionGuard::new(session, self.config.timeouts.close);

        let outcome = AssertUnwindSafe(self.run_stages(&mut guard, &request, &params))
            .catch_unwind()
            .await;
        guard.release().await;

        let elapsed = started.elapsed();
        let pdf = match outcome {
            Ok(Ok(pdf)) => pdf,
            Ok(Err(err)) => {
                error!(%mode, error = %err, elapsed_ms = elapsed.as_millis() as u64, "render failed");
                return Err(err);
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(%mode, panic = %message, "render panicked");
                return Err(PressError::engine_fault(format!("render panicked: {}", message)));
            }
        };

        info!(
            %mode,
            bytes = pdf.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "render finished"
        );
        Ok(RenderResult { pdf, mode, elapsed })
    }

    async fn run_stages(
        &self,
        guard: &mut SessionGuard,
        request: &RenderRequest,
        params: &PdfParams,
    ) -> Result<Vec<u8>> {
        let config = &*self.config;
        let session = guard.session()?;

        acquire::acquire(session, request, config).await?;

        let selector = config
            .isolation
            .enabled_for(request.mode())
            .then_some(config.isolation.selector.as_str());
        if let Some(selector) = selector {
            isolate::isolate(session, selector, config.timeouts.content).await?;
        }

        readiness::await_readiness(session, config, selector).await?;
        pdf::print(session, params, &config.limits, config.timeouts.pdf).await
    }
}
