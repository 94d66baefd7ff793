//! JavaScript evaluated inside the page.
//!
//! Selectors and CSS are embedded as JSON string literals so arbitrary
//! configuration values cannot break out of the script.

use serde::Deserialize;

pub const ISOLATION_STYLE_ID: &str = "pagepress-isolation";

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// Style rules that hide everything except the export section.
///
/// The selector is wrapped in `:is()` so a selector list stays one compound
/// in every rule. When the document has no matching section, the `:has()`
/// fallback rule reveals every body child again.
pub fn isolation_css(selector: &str) -> String {
    let sel = format!(":is({})", selector);
    format!(
        "body > * {{ display: none !important; }}\n\
         body > {sel}, body > *:has({sel}) {{ display: block !important; }}\n\
         {sel}, {sel} * {{ visibility: visible !important; }}\n\
         {sel} {{ display: block !important; width: 100% !important; height: auto !important; \
         margin: 0 !important; }}\n\
         body:not(:has({sel})) > * {{ display: revert !important; }}\n",
        sel = sel
    )
}

/// Appends (or replaces) the isolation style block; evaluates to `true`.
pub fn inject_style(css: &str) -> String {
    format!(
        r#"(() => {{
  const id = {id};
  const existing = document.getElementById(id);
  if (existing) existing.remove();
  const style = document.createElement('style');
  style.id = id;
  style.textContent = {css};
  (document.head || document.documentElement).appendChild(style);
  return true;
}})()"#,
        id = js_string(ISOLATION_STYLE_ID),
        css = js_string(css)
    )
}

/// Counts elements matching `selector`.
pub fn count_sections(selector: &str) -> String {
    format!(
        "document.querySelectorAll({}).length",
        js_string(selector)
    )
}

pub const FONTS_READY: &str =
    "(document.fonts && document.fonts.ready) ? document.fonts.ready.then(() => true) : true";

pub const REDISPATCH_LOAD: &str = "(() => { window.dispatchEvent(new Event('load')); return true; })()";

pub const NETWORK_SNAPSHOT: &str = r#"(() => ({
  readyState: document.readyState,
  resources: (performance.getEntriesByType ? performance.getEntriesByType('resource').length : 0)
}))()"#;

/// Page load state sampled while waiting for network idle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSnapshot {
    pub ready_state: String,
    pub resources: u64,
}

impl NetworkSnapshot {
    pub fn is_complete(&self) -> bool {
        self.ready_state == "complete"
    }
}

/// Image readiness probe over the export sections, or the whole document.
///
/// Background images are loaded through detached `Image` objects whose
/// state is cached on `window` between polls.
pub fn readiness_probe(selector: Option<&str>) -> String {
    let selector = selector.map(js_string).unwrap_or_else(|| "null".to_string());
    format!(
        r#"(() => {{
  const selector = {selector};
  const roots = selector
    ? Array.from(document.querySelectorAll(selector))
    : [document.body || document.documentElement].filter(Boolean);
  const cache = (window.__pagepressBackgrounds = window.__pagepressBackgrounds || {{}});
  let images = 0, backgrounds = 0, pending = 0;
  const seen = new Set();
  for (const root of roots) {{
    const elements = [root, ...root.querySelectorAll('*')];
    for (const el of elements) {{
      if (seen.has(el)) continue;
      seen.add(el);
      if (el.tagName === 'IMG') {{
        images += 1;
        if (!(el.complete && el.naturalWidth > 0 && el.naturalHeight > 0)) pending += 1;
      }}
      const bg = getComputedStyle(el).backgroundImage;
      if (!bg || bg === 'none') continue;
      for (const match of bg.matchAll(/url\(\s*(['"]?)(.*?)\1\s*\)/g)) {{
        const src = match[2];
        if (!src) continue;
        backgrounds += 1;
        const state = cache[src];
        if (state === undefined) {{
          cache[src] = 'pending';
          const probe = new Image();
          probe.onload = () => {{ cache[src] = 'loaded'; }};
          probe.onerror = () => {{ cache[src] = 'failed'; }};
          probe.src = src;
          pending += 1;
        }} else if (state !== 'loaded') {{
          pending += 1;
        }}
      }}
    }}
  }}
  return {{ sections: selector ? roots.length : 1, images, backgrounds, pending }};
}})()"#,
        selector = selector
    )
}

/// Result of one readiness poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReadinessSnapshot {
    pub sections: u64,
    pub images: u64,
    pub backgrounds: u64,
    pub pending: u64,
}

impl ReadinessSnapshot {
    pub fn is_ready(&self, require_section: bool) -> bool {
        self.pending == 0 && (!require_section || self.sections > 0)
    }
}
