use std::path::Path;

use pagepress_lib::{Config, PressError, RenderMode};

/// Tracks which CLI flags were explicitly provided vs. defaulted.
#[derive(Debug, Default)]
pub struct ServeFlagSources {
    pub bind: bool,
    pub port: bool,
    pub max_concurrent: bool,
    pub root_route: bool,
}

impl ServeFlagSources {
    pub fn from_args(args: &[String]) -> Self {
        Self {
            bind: flag_present(args, "--bind"),
            port: flag_present(args, "--port"),
            max_concurrent: flag_present(args, "--max-concurrent"),
            root_route: flag_present(args, "--root-route"),
        }
    }
}

/// Checks if a flag was present in the command-line arguments.
pub fn flag_present(args: &[String], flag: &str) -> bool {
    args.iter()
        .any(|arg| arg == flag || arg.starts_with(&format!("{flag}=")))
}

/// Resolved server settings after merging CLI args and config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedServeSettings {
    pub bind: String,
    pub port: u16,
    pub max_concurrent: usize,
    pub root_route: bool,
}

/// Merge CLI arguments with config, preferring CLI when flags are present.
pub fn resolve_serve_settings(
    cli_bind: String,
    cli_port: u16,
    cli_max_concurrent: usize,
    cli_root_route: bool,
    config: &Config,
    flags: &ServeFlagSources,
) -> ResolvedServeSettings {
    let server = &config.server;
    ResolvedServeSettings {
        bind: if flags.bind {
            cli_bind
        } else {
            server.bind.clone()
        },
        port: if flags.port { cli_port } else { server.port },
        max_concurrent: if flags.max_concurrent {
            cli_max_concurrent.max(1)
        } else {
            server.max_concurrent_renders
        },
        root_route: if flags.root_route {
            cli_root_route
        } else {
            server.root_render_route
        },
    }
}

impl ResolvedServeSettings {
    pub fn apply(&self, config: &mut Config) {
        config.server.bind = self.bind.clone();
        config.server.port = self.port;
        config.server.max_concurrent_renders = self.max_concurrent;
        config.server.root_render_route = self.root_route;
    }
}

/// Load config from a TOML file, central config, or return defaults, then
/// apply environment overrides.
/// Priority: explicit path > ~/.config/pagepress/config.toml > defaults
pub fn load_config(path: Option<&Path>) -> Result<Config, PressError> {
    let mut cfg = Config::load(path).map_err(|e| {
        let loc = path
            .map(|p| p.display().to_string())
            .or_else(|| Config::central_config_path().map(|p| p.display().to_string()))
            .unwrap_or_else(|| "defaults".to_string());
        PressError::Config(format!("Failed to read config {}: {}", loc, e))
    })?;

    cfg.apply_env_overrides(|key| std::env::var(key).ok())
        .map_err(PressError::Config)?;

    cfg.validate().map_err(|e| {
        let prefix = path
            .map(|p| format!("Invalid config ({}): {}", p.display(), e))
            .unwrap_or_else(|| format!("Invalid config: {}", e));
        PressError::Config(prefix)
    })?;
    Ok(cfg)
}

/// Format effective config as a single-line string.
pub fn format_effective_config(config: &Config, config_source: Option<&Path>) -> String {
    let source = config_source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    let t = &config.timeouts;
    format!(
        "Effective config [{source}]: bind={}:{}, max_concurrent={}, root_route={}, limits: html={}B, pdf={}B, timeouts: launch={:?}, navigation={:?}, content={:?}, readiness={:?}, pdf={:?}, close={:?}, worst_case: url={:?}, html={:?}, isolation={} (url={}, html={})",
        config.server.bind,
        config.server.port,
        config.server.max_concurrent_renders,
        config.server.root_render_route,
        config.limits.max_html_bytes,
        config.limits.max_pdf_bytes,
        t.launch,
        t.navigation,
        t.content,
        t.readiness,
        t.pdf,
        t.close,
        config.worst_case_latency(RenderMode::Url),
        config.worst_case_latency(RenderMode::Html),
        config.isolation.selector,
        config.isolation.url_mode,
        config.isolation.html_mode,
    )
}
