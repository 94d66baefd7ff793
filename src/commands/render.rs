use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use pagepress_lib::{classify_value, probe_browser, PressError, RenderMode, Renderer, Result};

use super::build_engine;
use crate::cli::OutputFormat;
use crate::formatting::{render_error, write_output};
use crate::settings::load_config;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderSummary {
    mode: &'static str,
    render_mode: RenderMode,
    output: String,
    bytes: usize,
    elapsed_ms: u64,
}

/// Run the render command.
#[allow(clippy::too_many_arguments)]
pub async fn run_render(
    config_path: Option<PathBuf>,
    url: Option<String>,
    html_file: Option<PathBuf>,
    cookies: Option<PathBuf>,
    options: Option<String>,
    pdf_options: Option<String>,
    output: PathBuf,
    format: OutputFormat,
) -> ExitCode {
    let result = render_to_file(
        config_path.as_deref(),
        url,
        html_file.as_deref(),
        cookies.as_deref(),
        options.as_deref(),
        pdf_options.as_deref(),
        &output,
    )
    .await;

    match result {
        Ok(summary) => {
            let line = format!(
                "Wrote {} ({} bytes, {} mode, {} ms)",
                summary.output, summary.bytes, summary.render_mode, summary.elapsed_ms
            );
            if let Err(err) = write_output(&summary, format, &line) {
                eprintln!("Failed to write output: {}", err);
            }
            ExitCode::SUCCESS
        }
        Err(err) => render_error(err, format),
    }
}

async fn render_to_file(
    config_path: Option<&Path>,
    url: Option<String>,
    html_file: Option<&Path>,
    cookies: Option<&Path>,
    options: Option<&str>,
    pdf_options: Option<&str>,
    output: &Path,
) -> Result<RenderSummary> {
    let config = load_config(config_path)?;

    let mut body = Map::new();
    if let Some(url) = url {
        body.insert("url".into(), Value::String(url));
    }
    if let Some(path) = html_file {
        let html = tokio::fs::read_to_string(path).await?;
        body.insert("html".into(), Value::String(html));
    }
    if let Some(path) = cookies {
        let raw = tokio::fs::read_to_string(path).await?;
        body.insert("cookies".into(), serde_json::from_str(&raw)?);
    }
    if let Some(raw) = options {
        body.insert("options".into(), parse_json_arg("--options", raw)?);
    }
    if let Some(raw) = pdf_options {
        body.insert("pdfOptions".into(), parse_json_arg("--pdf-options", raw)?);
    }

    let status = probe_browser(&config.browser).await;
    status.ensure_available()?;
    let request = classify_value(Value::Object(body), &config.limits)?;

    let engine = build_engine(&status, &config);
    let renderer = Renderer::new(engine, Arc::new(config));
    let result = renderer.render(request).await?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(output, &result.pdf).await?;

    Ok(RenderSummary {
        mode: "render",
        render_mode: result.mode,
        output: output.display().to_string(),
        bytes: result.len(),
        elapsed_ms: result.elapsed.as_millis() as u64,
    })
}

fn parse_json_arg(flag: &str, raw: &str) -> Result<Value> {
    serde_json::from_str(raw)
        .map_err(|e| PressError::invalid_input(format!("{} is not valid JSON: {}", flag, e)))
}
