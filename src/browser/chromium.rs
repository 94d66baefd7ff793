//! Chromium backend driven over the DevTools protocol with `chromiumoxide`.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetEmulatedMediaParams,
};
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, CookieSameSite};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::handler::viewport::Viewport as EmulatedViewport;
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use super::engine::{EngineSession, RenderEngine};
use crate::config::{BrowserSettings, Timeouts};
use crate::options::PdfParams;
use crate::request::{CookieSpec, SameSite};
use crate::viewport::Viewport;
use crate::{PressError, Result};

static PROFILE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A DevTools request that outlived `budget` is a timeout of that step; any
/// other protocol failure is an engine fault.
pub(crate) fn map_cdp_error(context: &str, err: CdpError, budget: Duration) -> PressError {
    match err {
        CdpError::Timeout => PressError::timeout(context, budget),
        other => PressError::engine_fault(format!("{}: {}", context, other)),
    }
}

fn cookie_param(cookie: &CookieSpec) -> Result<CookieParam> {
    let mut builder = CookieParam::builder()
        .name(cookie.name.clone())
        .value(cookie.value.clone());
    if let Some(url) = &cookie.url {
        builder = builder.url(url.clone());
    }
    if let Some(domain) = &cookie.domain {
        builder = builder.domain(domain.clone());
    }
    if let Some(path) = &cookie.path {
        builder = builder.path(path.clone());
    }
    if let Some(secure) = cookie.secure {
        builder = builder.secure(secure);
    }
    if let Some(http_only) = cookie.http_only {
        builder = builder.http_only(http_only);
    }
    if let Some(same_site) = cookie.same_site {
        builder = builder.same_site(match same_site {
            SameSite::Strict => CookieSameSite::Strict,
            SameSite::Lax => CookieSameSite::Lax,
            SameSite::None => CookieSameSite::None,
        });
    }
    builder
        .build()
        .map_err(|e| PressError::invalid_input(format!("cookie '{}': {}", cookie.name, e)))
}

fn print_params(params: &PdfParams) -> PrintToPdfParams {
    let mut builder = PrintToPdfParams::builder()
        .paper_width(params.paper_width)
        .paper_height(params.paper_height)
        .scale(params.scale)
        .margin_top(params.margin_top)
        .margin_right(params.margin_right)
        .margin_bottom(params.margin_bottom)
        .margin_left(params.margin_left)
        .print_background(params.print_background)
        .prefer_css_page_size(params.prefer_css_page_size);
    if let Some(ranges) = &params.page_ranges {
        builder = builder.page_ranges(ranges.clone());
    }
    // Paper axes are already swapped for landscape.
    builder.landscape(false).build()
}

/// Launches a dedicated Chromium process per render.
#[derive(Debug, Clone)]
pub struct ChromiumEngine {
    executable: PathBuf,
    settings: BrowserSettings,
    launch_timeout: Duration,
    request_timeout: Duration,
}

impl ChromiumEngine {
    pub fn new(executable: impl Into<PathBuf>, settings: BrowserSettings, timeouts: &Timeouts) -> Self {
        // DevTools requests must outlive every stage budget; the pipeline owns the real deadlines.
        let request_timeout = [timeouts.navigation, timeouts.content, timeouts.readiness, timeouts.pdf]
            .into_iter()
            .max()
            .unwrap_or(timeouts.navigation)
            + Duration::from_secs(5);
        Self {
            executable: executable.into(),
            settings,
            launch_timeout: timeouts.launch,
            request_timeout,
        }
    }

    fn profile_dir() -> PathBuf {
        let n = PROFILE_COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("pagepress-{}-{}", std::process::id(), n))
    }

    fn browser_config(&self, viewport: Viewport, profile_dir: &Path) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .chrome_executable(&self.executable)
            .user_data_dir(profile_dir)
            .window_size(viewport.width, viewport.height)
            .viewport(Option::<EmulatedViewport>::None)
            .launch_timeout(self.launch_timeout)
            .request_timeout(self.request_timeout)
            .args(self.settings.args.iter().cloned());
        if !self.settings.sandbox {
            builder = builder.no_sandbox();
        }
        builder
            .build()
            .map_err(|e| PressError::engine_fault(format!("invalid browser configuration: {}", e)))
    }
}

#[async_trait]
impl RenderEngine for ChromiumEngine {
    fn name(&self) -> &str {
        "chromium"
    }

    async fn launch(&self, viewport: Viewport) -> Result<Box<dyn EngineSession>> {
        let profile_dir = Self::profile_dir();
        let config = self.browser_config(viewport, &profile_dir)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| map_cdp_error("launch browser", e, self.launch_timeout))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler error: {e}");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.kill().await;
                handler.abort();
                remove_profile(&profile_dir).await;
                return Err(map_cdp_error("open page", e, self.request_timeout));
            }
        };

        let mut session = ChromiumSession {
            browser,
            page,
            handler,
            profile_dir,
            request_timeout: self.request_timeout,
        };

        if let Err(err) = session.set_viewport(viewport).await {
            session.kill().await;
            return Err(err);
        }

        info!(executable = %self.executable.display(), %viewport, "browser launched");
        Ok(Box::new(session))
    }
}

async fn remove_profile(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!(dir = %dir.display(), "failed to remove browser profile: {e}");
        }
    }
}

pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    profile_dir: PathBuf,
    request_timeout: Duration,
}

impl ChromiumSession {
    async fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        let params = SetDeviceMetricsOverrideParams::builder()
            .width(viewport.width as i64)
            .height(viewport.height as i64)
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(PressError::engine_fault)?;
        self.page
            .execute(params)
            .await
            .map_err(|e| map_cdp_error("set viewport", e, self.request_timeout))?;
        Ok(())
    }
}

#[async_trait]
impl EngineSession for ChromiumSession {
    async fn set_cookie(&mut self, cookie: &CookieSpec) -> Result<()> {
        let param = cookie_param(cookie)?;
        self.page
            .set_cookie(param)
            .await
            .map_err(|e| map_cdp_error("set cookie", e, self.request_timeout))?;
        Ok(())
    }

    async fn navigate(&mut self, url: &Url) -> Result<()> {
        self.page
            .goto(url.as_str())
            .await
            .map_err(|e| map_cdp_error("navigate", e, self.request_timeout))?;
        Ok(())
    }

    async fn set_content(&mut self, html: &str) -> Result<()> {
        self.page
            .set_content(html)
            .await
            .map_err(|e| map_cdp_error("set content", e, self.request_timeout))?;
        Ok(())
    }

    async fn evaluate(&mut self, expression: &str) -> Result<Value> {
        let params = EvaluateParams::builder()
            .expression(expression)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(PressError::engine_fault)?;
        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|e| map_cdp_error("evaluate script", e, self.request_timeout))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn emulate_screen_media(&mut self) -> Result<()> {
        let params = SetEmulatedMediaParams::builder().media("screen").build();
        self.page
            .execute(params)
            .await
            .map_err(|e| map_cdp_error("emulate screen media", e, self.request_timeout))?;
        Ok(())
    }

    async fn print_pdf(&mut self, params: &PdfParams) -> Result<Vec<u8>> {
        self.page
            .pdf(print_params(params))
            .await
            .map_err(|e| map_cdp_error("print to pdf", e, self.request_timeout))
    }

    async fn close(&mut self) -> Result<()> {
        if let Err(e) = self.page.clone().close().await {
            debug!("page close failed: {e}");
        }
        self.browser
            .close()
            .await
            .map_err(|e| map_cdp_error("close browser", e, self.request_timeout))?;
        self.browser.wait().await?;
        self.handler.abort();
        remove_profile(&self.profile_dir).await;
        Ok(())
    }

    async fn kill(&mut self) {
        match self.browser.kill().await {
            Some(Err(e)) => warn!("failed to kill browser process: {e}"),
            Some(Ok(())) => debug!("browser process killed"),
            None => {}
        }
        self.handler.abort();
        remove_profile(&self.profile_dir).await;
    }
}
