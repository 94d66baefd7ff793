use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::options::RenderOptions;
use crate::request::RenderMode;

/// 50 MiB, the default ceiling for both inbound HTML and outbound PDFs.
pub const DEFAULT_SIZE_CEILING: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub limits: Limits,
    pub timeouts: Timeouts,
    pub readiness: ReadinessConfig,
    pub acquire: AcquireConfig,
    pub isolation: IsolationConfig,
    pub browser: BrowserSettings,
    pub profiles: Profiles,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Also accept render requests on `POST /`.
    pub root_render_route: bool,
    pub max_concurrent_renders: usize,
    /// Origins allowed by the CORS gate; `"*"` allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3001,
            root_render_route: false,
            max_concurrent_renders: 4,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:3001".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_html_bytes: usize,
    pub max_pdf_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_html_bytes: DEFAULT_SIZE_CEILING,
            max_pdf_bytes: DEFAULT_SIZE_CEILING,
        }
    }
}

impl Limits {
    /// Transport limit for request bodies; JSON escaping can double HTML size.
    pub fn max_body_bytes(&self) -> usize {
        self.max_html_bytes
            .saturating_mul(2)
            .saturating_add(1024 * 1024)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    #[serde(with = "humantime_serde")]
    pub launch: Duration,
    #[serde(with = "humantime_serde")]
    pub navigation: Duration,
    #[serde(with = "humantime_serde")]
    pub content: Duration,
    #[serde(with = "humantime_serde")]
    pub readiness: Duration,
    #[serde(with = "humantime_serde")]
    pub pdf: Duration,
    #[serde(with = "humantime_serde")]
    pub close: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            launch: Duration::from_secs(30),
            navigation: Duration::from_secs(60),
            content: Duration::from_secs(60),
            readiness: Duration::from_secs(120),
            pdf: Duration::from_secs(60),
            close: Duration::from_secs(10),
        }
    }
}

/// Page-load completion heuristic used after navigation or content-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WaitCondition {
    Load,
    NetworkIdle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub wait_condition: WaitCondition,
    #[serde(with = "humantime_serde")]
    pub network_idle_window: Duration,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub settle_delay: Duration,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            wait_condition: WaitCondition::NetworkIdle,
            network_idle_window: Duration::from_millis(500),
            poll_interval: Duration::from_millis(100),
            settle_delay: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquireConfig {
    /// Fire a synthetic `load` event after URL navigation.
    pub redispatch_load: bool,
    #[serde(with = "humantime_serde")]
    pub hydration_delay: Duration,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            redispatch_load: true,
            hydration_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsolationConfig {
    pub selector: String,
    pub url_mode: bool,
    pub html_mode: bool,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self {
            selector: ".pdf-export".to_string(),
            url_mode: true,
            html_mode: false,
        }
    }
}

impl IsolationConfig {
    pub fn enabled_for(&self, mode: RenderMode) -> bool {
        match mode {
            RenderMode::Url => self.url_mode,
            RenderMode::Html => self.html_mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Browser binary; auto-detected on PATH when unset.
    pub executable: Option<PathBuf>,
    pub args: Vec<String>,
    /// Keep the Chromium sandbox. Off by default for container deployments.
    pub sandbox: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            executable: None,
            args: vec![
                "--disable-dev-shm-usage".to_string(),
                "--disable-gpu".to_string(),
            ],
            sandbox: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profiles {
    pub url: RenderOptions,
    pub html: RenderOptions,
}

impl Default for Profiles {
    fn default() -> Self {
        Self {
            url: RenderOptions::url_profile(),
            html: RenderOptions::html_profile(),
        }
    }
}

impl Profiles {
    pub fn for_mode(&self, mode: RenderMode) -> &RenderOptions {
        match mode {
            RenderMode::Url => &self.url,
            RenderMode::Html => &self.html,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

impl Config {
    /// Load from `path`, else the central config file, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigLoadError> {
        let candidate = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Config::central_config_path().filter(|p| p.is_file()),
        };

        let Some(candidate) = candidate else {
            return Ok(Config::default());
        };

        let text = std::fs::read_to_string(&candidate).map_err(|source| ConfigLoadError::Io {
            path: candidate.display().to_string(),
            source,
        })?;
        Config::from_toml(&text).map_err(|source| ConfigLoadError::Parse {
            path: candidate.display().to_string(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(text)
    }

    /// `$XDG_CONFIG_HOME/pagepress/config.toml`, falling back to `~/.config`.
    pub fn central_config_path() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
        Some(base.join("pagepress").join("config.toml"))
    }

    /// Applies `PORT` and `PAGEPRESS_CHROME` from the given environment lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").filter(|v| !v.trim().is_empty()) {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| format!("PORT must be a TCP port number, got '{}'", port))?;
        }
        if let Some(chrome) = lookup("PAGEPRESS_CHROME").filter(|v| !v.trim().is_empty()) {
            self.browser.executable = Some(PathBuf::from(chrome.trim()));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.limits.max_html_bytes == 0 {
            return Err("limits.max_html_bytes must be greater than zero".to_string());
        }
        if self.limits.max_pdf_bytes == 0 {
            return Err("limits.max_pdf_bytes must be greater than zero".to_string());
        }

        let t = &self.timeouts;
        for (name, value) in [
            ("launch", t.launch),
            ("navigation", t.navigation),
            ("content", t.content),
            ("readiness", t.readiness),
            ("pdf", t.pdf),
            ("close", t.close),
        ] {
            if value.is_zero() {
                return Err(format!("timeouts.{} must be greater than zero", name));
            }
        }

        if self.readiness.poll_interval.is_zero() {
            return Err("readiness.poll_interval must be greater than zero".to_string());
        }
        if self.isolation.selector.trim().is_empty() {
            return Err("isolation.selector must not be empty".to_string());
        }
        if self.server.max_concurrent_renders == 0 {
            return Err("server.max_concurrent_renders must be at least 1".to_string());
        }

        self.profiles
            .url
            .validate()
            .map_err(|e| format!("profiles.url: {}", e))?;
        self.profiles
            .html
            .validate()
            .map_err(|e| format!("profiles.html: {}", e))?;
        Ok(())
    }

    /// Sum of every budget a single render can spend, for capacity planning.
    pub fn worst_case_latency(&self, mode: RenderMode) -> Duration {
        let t = &self.timeouts;
        let load = match mode {
            RenderMode::Url => t.navigation + self.acquire.hydration_delay,
            RenderMode::Html => t.content,
        };
        let isolation = if self.isolation.enabled_for(mode) {
            t.content
        } else {
            Duration::ZERO
        };
        t.launch + load + isolation + t.readiness + self.readiness.settle_delay + t.pdf + t.close
    }
}
