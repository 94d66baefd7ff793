use std::path::PathBuf;
use std::process::ExitCode;

use pagepress_lib::server::{serve, spawn_shutdown_listener, AppState};
use pagepress_lib::{probe_browser, PressError};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::build_engine;
use crate::cli::OutputFormat;
use crate::formatting::render_error;
use crate::settings::{format_effective_config, load_config, resolve_serve_settings, ServeFlagSources};

/// Run the serve command until Ctrl-C or SIGTERM.
pub async fn run_serve(
    raw_args: &[String],
    config_path: Option<PathBuf>,
    verbose: bool,
    bind: String,
    port: u16,
    max_concurrent: usize,
    root_route: bool,
) -> ExitCode {
    let mut config = match load_config(config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, OutputFormat::Pretty),
    };
    let flags = ServeFlagSources::from_args(raw_args);
    resolve_serve_settings(bind, port, max_concurrent, root_route, &config, &flags)
        .apply(&mut config);

    let summary = format_effective_config(&config, config_path.as_deref());
    if verbose {
        info!("{summary}");
    } else {
        debug!("{summary}");
    }
    info!(
        url = ?config.worst_case_latency(pagepress_lib::RenderMode::Url),
        html = ?config.worst_case_latency(pagepress_lib::RenderMode::Html),
        "worst-case render latency"
    );

    let status = probe_browser(&config.browser).await;
    let engine = build_engine(&status, &config);

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            return render_error(
                PressError::Config(format!("Failed to bind {}: {}", addr, err)),
                OutputFormat::Pretty,
            )
        }
    };

    let shutdown = CancellationToken::new();
    spawn_shutdown_listener(shutdown.clone());

    let state = AppState::new(engine, status, config);
    match serve(listener, state, shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => render_error(err, OutputFormat::Pretty),
    }
}
