//! Render request model: the two input modes and their cookies.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::warn;
use url::Url;

use crate::options::RenderOptions;

/// Raw JSON body accepted by the render routes.
///
/// Fields stay untyped here so shape errors surface as `InvalidInput`
/// from the validator instead of opaque deserialisation failures.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderBody {
    #[serde(default)]
    pub url: Option<Value>,
    #[serde(default)]
    pub html: Option<Value>,
    #[serde(default)]
    pub cookies: Option<Value>,
    #[serde(default)]
    pub options: Option<Value>,
    #[serde(default)]
    pub pdf_options: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    Url,
    Html,
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Url => f.write_str("url"),
            RenderMode::Html => f.write_str("html"),
        }
    }
}

/// Caller-supplied option layers, kept apart until merged over a profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionLayers {
    pub options: Option<RenderOptions>,
    pub pdf_options: Option<RenderOptions>,
}

impl OptionLayers {
    pub fn merged_over(&self, profile: &RenderOptions) -> RenderOptions {
        RenderOptions::layered(profile, self.options.as_ref(), self.pdf_options.as_ref())
    }
}

/// A validated request. URL mode wins when a body carries both inputs.
#[derive(Debug, Clone)]
pub enum RenderRequest {
    Url {
        url: Url,
        cookies: Vec<CookieSpec>,
        options: OptionLayers,
    },
    Html {
        html: String,
        cookies: Vec<CookieSpec>,
        options: OptionLayers,
    },
}

impl RenderRequest {
    pub fn mode(&self) -> RenderMode {
        match self {
            RenderRequest::Url { .. } => RenderMode::Url,
            RenderRequest::Html { .. } => RenderMode::Html,
        }
    }

    pub fn cookies(&self) -> &[CookieSpec] {
        match self {
            RenderRequest::Url { cookies, .. } | RenderRequest::Html { cookies, .. } => cookies,
        }
    }

    pub fn option_layers(&self) -> &OptionLayers {
        match self {
            RenderRequest::Url { options, .. } | RenderRequest::Html { options, .. } => options,
        }
    }

    /// Short description for log lines; never includes the HTML itself.
    pub fn describe(&self) -> String {
        match self {
            RenderRequest::Url { url, .. } => url.to_string(),
            RenderRequest::Html { html, .. } => format!("inline html ({} bytes)", html.len()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(SameSite::Strict),
            "lax" => Some(SameSite::Lax),
            "none" => Some(SameSite::None),
            _ => None,
        }
    }
}

/// A cookie to install in the page before content loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSpec {
    pub name: String,
    pub value: String,
    pub url: Option<String>,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub secure: Option<bool>,
    pub http_only: Option<bool>,
    pub same_site: Option<SameSite>,
}

impl CookieSpec {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            url: None,
            domain: None,
            path: None,
            secure: None,
            http_only: None,
            same_site: None,
        }
    }

    pub fn has_scope(&self) -> bool {
        self.url.is_some() || self.domain.is_some()
    }

    /// Copy of this cookie scoped to `target` when it carries no scope of its own.
    pub fn scoped_to(&self, target: &Url) -> CookieSpec {
        let mut cookie = self.clone();
        if !cookie.has_scope() {
            cookie.url = Some(target.to_string());
        }
        cookie
    }
}

/// Text form handed to the browser for any JSON cookie value.
pub fn coerce_cookie_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn optional_string(entry: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match entry.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn optional_bool(entry: &serde_json::Map<String, Value>, key: &str) -> Option<bool> {
    entry.get(key).and_then(Value::as_bool)
}

/// Parses a cookie list leniently: malformed entries are logged and dropped.
pub fn parse_cookies(raw: Option<&Value>) -> Vec<CookieSpec> {
    let entries = match raw {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            warn!(kind = json_kind(other), "ignoring cookies: expected an array");
            return Vec::new();
        }
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let Some(entry) = entry.as_object() else {
                warn!(index, kind = json_kind(entry), "skipping cookie: not an object");
                return None;
            };
            let Some(name) = optional_string(entry, "name") else {
                warn!(index, "skipping cookie: missing name");
                return None;
            };

            let same_site = match entry.get("sameSite") {
                Some(Value::String(raw)) => {
                    let parsed = SameSite::parse(raw);
                    if parsed.is_none() {
                        warn!(index, name = %name, same_site = %raw, "ignoring unknown sameSite value");
                    }
                    parsed
                }
                _ => None,
            };

            Some(CookieSpec {
                value: entry
                    .get("value")
                    .map(coerce_cookie_value)
                    .unwrap_or_default(),
                url: optional_string(entry, "url"),
                domain: optional_string(entry, "domain"),
                path: optional_string(entry, "path"),
                secure: optional_bool(entry, "secure"),
                http_only: optional_bool(entry, "httpOnly"),
                same_site,
                name,
            })
        })
        .collect()
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
