//! Request validation and size limiting.
//!
//! Everything here is pure: no browser is touched before a request has
//! passed [`classify`].

use serde_json::Value;
use url::Url;

use crate::browser::EngineStatus;
use crate::config::Limits;
use crate::options::RenderOptions;
use crate::request::{json_kind, parse_cookies, OptionLayers, RenderBody, RenderRequest};
use crate::{PressError, Result};

/// Classifies a raw request body into a [`RenderRequest`].
pub fn classify(body: &[u8], status: &EngineStatus, limits: &Limits) -> Result<RenderRequest> {
    status.ensure_available()?;

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| PressError::invalid_input(format!("request body is not valid JSON: {}", e)))?;
    classify_value(value, limits)
}

/// Same as [`classify`] for an already-parsed body and an available engine.
pub fn classify_value(value: Value, limits: &Limits) -> Result<RenderRequest> {
    if !value.is_object() {
        return Err(PressError::invalid_input(format!(
            "request body must be a JSON object, got {}",
            json_kind(&value)
        )));
    }
    let body: RenderBody = serde_json::from_value(value)?;

    let options = OptionLayers {
        options: parse_options(body.options.as_ref(), "options")?,
        pdf_options: parse_options(body.pdf_options.as_ref(), "pdfOptions")?,
    };
    let cookies = parse_cookies(body.cookies.as_ref());

    if let Some(url) = non_empty_string(body.url.as_ref(), "url")? {
        return Ok(RenderRequest::Url {
            url: parse_target_url(url)?,
            cookies,
            options,
        });
    }

    if let Some(html) = non_empty_string(body.html.as_ref(), "html")? {
        check_html_size(html, limits)?;
        return Ok(RenderRequest::Html {
            html: html.to_string(),
            cookies,
            options,
        });
    }

    Err(PressError::invalid_input(
        "Missing url or html content: provide a non-empty `url` or `html` string",
    ))
}

fn non_empty_string<'a>(value: Option<&'a Value>, field: &str) -> Result<Option<&'a str>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(PressError::invalid_input(format!(
            "`{}` must be a string, got {}",
            field,
            json_kind(other)
        ))),
    }
}

/// Accepts only absolute `http` and `https` URLs.
pub fn parse_target_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| PressError::invalid_input(format!("invalid url '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(PressError::invalid_input(format!(
            "unsupported url scheme '{}': only http and https are rendered",
            other
        ))),
    }
}

/// Documents of exactly `max_html_bytes` are accepted.
pub fn check_html_size(html: &str, limits: &Limits) -> Result<()> {
    let size = html.len();
    if size > limits.max_html_bytes {
        return Err(PressError::PayloadTooLarge {
            size,
            limit: limits.max_html_bytes,
        });
    }
    Ok(())
}

fn parse_options(raw: Option<&Value>, field: &str) -> Result<Option<RenderOptions>> {
    let raw = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(raw @ Value::Object(_)) => raw,
        Some(other) => {
            return Err(PressError::invalid_input(format!(
                "`{}` must be an object, got {}",
                field,
                json_kind(other)
            )))
        }
    };

    let options: RenderOptions = serde_json::from_value(raw.clone())
        .map_err(|e| PressError::invalid_input(format!("invalid `{}`: {}", field, e)))?;
    options
        .validate()
        .map_err(|e| PressError::invalid_input(format!("invalid `{}`: {}", field, e)))?;
    Ok(Some(options))
}

/// Shape of an inline document, logged at debug level instead of the markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HtmlSummary {
    pub bytes: usize,
    pub has_head: bool,
    pub styles: usize,
    pub links: usize,
    pub images: usize,
    pub scripts: usize,
}

pub fn summarize_html(html: &str) -> HtmlSummary {
    let lower = html.to_ascii_lowercase();
    let count = |tag: &str| {
        lower
            .match_indices(tag)
            .filter(|(idx, matched)| {
                lower[idx + matched.len()..]
                    .chars()
                    .next()
                    .map_or(false, |c| c.is_whitespace() || c == '>' || c == '/')
            })
            .count()
    };

    HtmlSummary {
        bytes: html.len(),
        has_head: count("<head") > 0,
        styles: count("<style"),
        links: count("<link"),
        images: count("<img"),
        scripts: count("<script"),
    }
}
