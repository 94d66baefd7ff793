#![allow(dead_code)]

use async_trait::async_trait;
use pagepress_lib::{
    Config, CookieSpec, EngineSession, EngineStatus, PdfParams, PressError, RenderEngine, Result,
    Viewport,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Behaviour injected into the mock browser.
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    None,
    LaunchFails,
    HangNavigation,
    FailNavigation,
    HangContent,
    HangCookie,
    ImagesNeverLoad,
    NoExportSection,
    OversizedPdf(usize),
    NotPdf,
    PanicOnPrint,
    HangClose,
    RejectCookie(String),
}

#[derive(Debug, Default)]
pub struct Counters {
    pub launches: AtomicUsize,
    pub closes: AtomicUsize,
    pub kills: AtomicUsize,
    pub cookies: AtomicUsize,
    pub navigations: AtomicUsize,
    pub contents: AtomicUsize,
    pub prints: AtomicUsize,
    pub viewports: Mutex<Vec<Viewport>>,
    pub scripts: Mutex<Vec<String>>,
}

impl Counters {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn kills(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }

    pub fn cookies(&self) -> usize {
        self.cookies.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> usize {
        self.navigations.load(Ordering::SeqCst)
    }

    pub fn prints(&self) -> usize {
        self.prints.load(Ordering::SeqCst)
    }

    pub fn ran_script_containing(&self, needle: &str) -> bool {
        self.scripts
            .lock()
            .map(|scripts| scripts.iter().any(|s| s.contains(needle)))
            .unwrap_or(false)
    }
}

pub struct MockEngine {
    pub counters: Arc<Counters>,
    fault: Fault,
}

impl MockEngine {
    pub fn new(fault: Fault) -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            fault,
        }
    }

    pub fn healthy() -> Self {
        Self::new(Fault::None)
    }
}

#[async_trait]
impl RenderEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn launch(&self, viewport: Viewport) -> Result<Box<dyn EngineSession>> {
        self.counters.launches.fetch_add(1, Ordering::SeqCst);
        if self.fault == Fault::LaunchFails {
            return Err(PressError::engine_fault("mock launch failure"));
        }
        if let Ok(mut viewports) = self.counters.viewports.lock() {
            viewports.push(viewport);
        }
        Ok(Box::new(MockSession {
            counters: self.counters.clone(),
            fault: self.fault.clone(),
            content_len: 0,
        }))
    }
}

struct MockSession {
    counters: Arc<Counters>,
    fault: Fault,
    content_len: usize,
}

#[async_trait]
impl EngineSession for MockSession {
    async fn set_cookie(&mut self, cookie: &CookieSpec) -> Result<()> {
        if self.fault == Fault::HangCookie {
            std::future::pending::<()>().await;
        }
        if let Fault::RejectCookie(name) = &self.fault {
            if *name == cookie.name {
                return Err(PressError::engine_fault("mock cookie rejected"));
            }
        }
        self.counters.cookies.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn navigate(&mut self, url: &Url) -> Result<()> {
        self.counters.navigations.fetch_add(1, Ordering::SeqCst);
        match self.fault {
            Fault::HangNavigation => std::future::pending::<()>().await,
            Fault::FailNavigation => {
                return Err(PressError::engine_fault(format!(
                    "net::ERR_NAME_NOT_RESOLVED at {}",
                    url
                )))
            }
            _ => {}
        }
        self.content_len = url.as_str().len();
        Ok(())
    }

    async fn set_content(&mut self, html: &str) -> Result<()> {
        self.counters.contents.fetch_add(1, Ordering::SeqCst);
        if self.fault == Fault::HangContent {
            std::future::pending::<()>().await;
        }
        self.content_len = html.len();
        Ok(())
    }

    async fn evaluate(&mut self, expression: &str) -> Result<Value> {
        if let Ok(mut scripts) = self.counters.scripts.lock() {
            scripts.push(expression.to_string());
        }
        let sections = if self.fault == Fault::NoExportSection { 0 } else { 1 };

        if expression.contains("__pagepressBackgrounds") {
            let pending = if self.fault == Fault::ImagesNeverLoad { 1 } else { 0 };
            return Ok(json!({
                "sections": sections,
                "images": 2,
                "backgrounds": 1,
                "pending": pending
            }));
        }
        if expression.contains("readyState") {
            return Ok(json!({"readyState": "complete", "resources": 3}));
        }
        if expression.contains(".length") {
            return Ok(json!(sections));
        }
        Ok(Value::Bool(true))
    }

    async fn emulate_screen_media(&mut self) -> Result<()> {
        Ok(())
    }

    async fn print_pdf(&mut self, params: &PdfParams) -> Result<Vec<u8>> {
        self.counters.prints.fetch_add(1, Ordering::SeqCst);
        match self.fault {
            Fault::PanicOnPrint => panic!("mock print crashed"),
            Fault::NotPdf => return Ok(b"<html>not a pdf</html>".to_vec()),
            Fault::OversizedPdf(size) => {
                let mut bytes = b"%PDF-1.7\n".to_vec();
                bytes.resize(size, b' ');
                return Ok(bytes);
            }
            _ => {}
        }
        Ok(format!(
            "%PDF-1.7\n% mock {:.2}x{:.2}in scale {:.2} content {}\n%%EOF\n",
            params.paper_width, params.paper_height, params.scale, self.content_len
        )
        .into_bytes())
    }

    async fn close(&mut self) -> Result<()> {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        if self.fault == Fault::HangClose {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn kill(&mut self) {
        self.counters.kills.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn available() -> EngineStatus {
    EngineStatus::Available {
        executable: "mock-chromium".into(),
        version: Some("Mock 1.0".into()),
    }
}

pub fn unavailable() -> EngineStatus {
    EngineStatus::Unavailable {
        reason: "no usable browser found: chromium (not found)".into(),
    }
}

/// Defaults with the fixed delays shortened for real-time tests.
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.readiness.network_idle_window = Duration::from_millis(20);
    config.readiness.poll_interval = Duration::from_millis(5);
    config.readiness.settle_delay = Duration::ZERO;
    config.acquire.hydration_delay = Duration::ZERO;
    config
}

pub const TEST_HTML: &str = "<html><body><h1>Test</h1></body></html>";
