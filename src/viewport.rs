use serde::Serialize;

/// CSS pixels per inch, as used by the browser's print pipeline.
pub const CSS_PX_PER_INCH: f64 = 96.0;
/// Widest or tallest viewport handed to the browser.
pub const MAX_VIEWPORT_PX: u32 = 20_000;

/// Layout size of the page before printing, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Viewport matching a page size given in inches, clamped to
    /// `1..=MAX_VIEWPORT_PX` on each axis.
    pub fn from_page_inches(width_in: f64, height_in: f64) -> Self {
        let to_px = |inches: f64| {
            let px = (inches * CSS_PX_PER_INCH).round();
            if px.is_nan() {
                1
            } else {
                px.clamp(1.0, f64::from(MAX_VIEWPORT_PX)) as u32
            }
        };
        Self {
            width: to_px(width_in),
            height: to_px(height_in),
        }
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
