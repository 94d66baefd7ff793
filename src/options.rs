//! Page geometry options and their layered merge.
//!
//! Every field of [`RenderOptions`] is optional so that the three layers a
//! render sees can be folded together with [`RenderOptions::layered`]:
//!
//! | Layer (lowest to highest) | Source                                 |
//! |---------------------------|----------------------------------------|
//! | 1                         | mode profile (`[profiles.url]` / `[profiles.html]`) |
//! | 2                         | request body `options`                 |
//! | 3                         | request body `pdfOptions`              |
//!
//! A higher layer wins field by field; margin sides merge independently.
//! The merged value is then resolved into concrete [`PdfParams`].

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::length::Length;
use crate::viewport::Viewport;
use crate::{PressError, Result};

/// Lowest scale the print engine accepts.
pub const MIN_PDF_SCALE: f64 = 0.1;
/// Highest scale the print engine accepts.
pub const MAX_PDF_SCALE: f64 = 2.0;

/// Largest paper edge accepted, in inches.
pub const MAX_PAGE_INCHES: f64 = 200.0;

const FALLBACK_PAPER_WIDTH_IN: f64 = 8.5;
const FALLBACK_PAPER_HEIGHT_IN: f64 = 11.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Margins {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<Length>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Length>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<Length>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Length>,
}

impl Margins {
    pub fn uniform(length: Length) -> Self {
        Self {
            top: Some(length),
            right: Some(length),
            bottom: Some(length),
            left: Some(length),
        }
    }

    fn overlay(&self, top: &Margins) -> Margins {
        Margins {
            top: top.top.or(self.top),
            right: top.right.or(self.right),
            bottom: top.bottom.or(self.bottom),
            left: top.left.or(self.left),
        }
    }
}

/// Named paper sizes understood in the `format` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PaperFormat {
    Letter,
    Legal,
    Tabloid,
    Ledger,
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
}

impl PaperFormat {
    /// Portrait size in inches.
    pub fn size_inches(self) -> (f64, f64) {
        match self {
            PaperFormat::Letter => (8.5, 11.0),
            PaperFormat::Legal => (8.5, 14.0),
            PaperFormat::Tabloid => (11.0, 17.0),
            PaperFormat::Ledger => (17.0, 11.0),
            PaperFormat::A0 => (33.1, 46.8),
            PaperFormat::A1 => (23.4, 33.1),
            PaperFormat::A2 => (16.54, 23.4),
            PaperFormat::A3 => (11.7, 16.54),
            PaperFormat::A4 => (8.27, 11.7),
            PaperFormat::A5 => (5.83, 8.27),
            PaperFormat::A6 => (4.13, 5.83),
        }
    }

    fn name(self) -> &'static str {
        match self {
            PaperFormat::Letter => "Letter",
            PaperFormat::Legal => "Legal",
            PaperFormat::Tabloid => "Tabloid",
            PaperFormat::Ledger => "Ledger",
            PaperFormat::A0 => "A0",
            PaperFormat::A1 => "A1",
            PaperFormat::A2 => "A2",
            PaperFormat::A3 => "A3",
            PaperFormat::A4 => "A4",
            PaperFormat::A5 => "A5",
            PaperFormat::A6 => "A6",
        }
    }
}

impl FromStr for PaperFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "letter" => Ok(PaperFormat::Letter),
            "legal" => Ok(PaperFormat::Legal),
            "tabloid" => Ok(PaperFormat::Tabloid),
            "ledger" => Ok(PaperFormat::Ledger),
            "a0" => Ok(PaperFormat::A0),
            "a1" => Ok(PaperFormat::A1),
            "a2" => Ok(PaperFormat::A2),
            "a3" => Ok(PaperFormat::A3),
            "a4" => Ok(PaperFormat::A4),
            "a5" => Ok(PaperFormat::A5),
            "a6" => Ok(PaperFormat::A6),
            other => Err(format!(
                "unknown paper format '{}'; expected Letter, Legal, Tabloid, Ledger or A0-A6",
                other
            )),
        }
    }
}

impl TryFrom<String> for PaperFormat {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PaperFormat> for String {
    fn from(format: PaperFormat) -> Self {
        format.name().to_string()
    }
}

/// Caller- or profile-supplied page options. Absent fields defer to a lower layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Length>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Length>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<Margins>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<PaperFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landscape: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_background: Option<bool>,
    #[serde(
        default,
        rename = "preferCSSPageSize",
        alias = "preferCssPageSize",
        skip_serializing_if = "Option::is_none"
    )]
    pub prefer_css_page_size: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_ranges: Option<String>,
}

impl RenderOptions {
    /// Built-in URL-mode profile: 12in x 9in at scale 2.
    pub fn url_profile() -> Self {
        Self {
            width: Some(Length::inches(12.0)),
            height: Some(Length::inches(9.0)),
            scale: Some(2.0),
            margin: Some(Margins::uniform(Length::zero())),
            print_background: Some(true),
            prefer_css_page_size: Some(true),
            ..Self::default()
        }
    }

    /// Built-in HTML-mode profile: 1200px x 900px at scale 1.
    pub fn html_profile() -> Self {
        Self {
            width: Some(Length::px(1200.0)),
            height: Some(Length::px(900.0)),
            scale: Some(1.0),
            margin: Some(Margins::uniform(Length::zero())),
            print_background: Some(true),
            prefer_css_page_size: Some(true),
            ..Self::default()
        }
    }

    /// Returns `self` with every field present in `top` replaced by it.
    pub fn overlay(&self, top: &RenderOptions) -> RenderOptions {
        let margin = match (&self.margin, &top.margin) {
            (Some(base), Some(top)) => Some(base.overlay(top)),
            (base, top) => top.clone().or_else(|| base.clone()),
        };

        RenderOptions {
            width: top.width.or(self.width),
            height: top.height.or(self.height),
            scale: top.scale.or(self.scale),
            margin,
            format: top.format.or(self.format),
            landscape: top.landscape.or(self.landscape),
            print_background: top.print_background.or(self.print_background),
            prefer_css_page_size: top.prefer_css_page_size.or(self.prefer_css_page_size),
            page_ranges: top.page_ranges.clone().or_else(|| self.page_ranges.clone()),
        }
    }

    /// Folds layers lowest-first: profile, then `options`, then `pdfOptions`.
    pub fn layered(
        profile: &RenderOptions,
        options: Option<&RenderOptions>,
        pdf_options: Option<&RenderOptions>,
    ) -> RenderOptions {
        let mut merged = profile.clone();
        for layer in [options, pdf_options].into_iter().flatten() {
            merged = merged.overlay(layer);
        }
        merged
    }

    pub fn validate(&self) -> Result<()> {
        for (name, length) in [("width", self.width), ("height", self.height)] {
            if let Some(length) = length {
                let inches = length.to_inches();
                if !(inches > 0.0 && inches <= MAX_PAGE_INCHES) {
                    return Err(PressError::invalid_input(format!(
                        "{} must be greater than zero and at most {}in, got {}",
                        name, MAX_PAGE_INCHES, length
                    )));
                }
            }
        }
        if let Some(scale) = self.scale {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(PressError::invalid_input(format!(
                    "scale must be a positive number, got {}",
                    scale
                )));
            }
        }
        if let Some(ranges) = &self.page_ranges {
            let valid = ranges
                .chars()
                .all(|c| c.is_ascii_digit() || c == '-' || c == ',' || c == ' ');
            if !valid {
                return Err(PressError::invalid_input(format!(
                    "pageRanges must look like '1-3, 5', got '{}'",
                    ranges
                )));
            }
        }
        Ok(())
    }

    /// Produces concrete print parameters. `format` beats width/height.
    pub fn resolve(&self) -> PdfParams {
        let (mut paper_width, mut paper_height) = match self.format {
            Some(format) => format.size_inches(),
            None => (
                self.width
                    .map(|l| l.to_inches())
                    .unwrap_or(FALLBACK_PAPER_WIDTH_IN),
                self.height
                    .map(|l| l.to_inches())
                    .unwrap_or(FALLBACK_PAPER_HEIGHT_IN),
            ),
        };
        let landscape = self.landscape.unwrap_or(false);
        if landscape && paper_width < paper_height {
            std::mem::swap(&mut paper_width, &mut paper_height);
        }

        let margin = self.margin.clone().unwrap_or_default();
        let side = |l: Option<Length>| l.map(|l| l.to_inches()).unwrap_or(0.0);

        PdfParams {
            paper_width,
            paper_height,
            scale: self
                .scale
                .unwrap_or(1.0)
                .clamp(MIN_PDF_SCALE, MAX_PDF_SCALE),
            margin_top: side(margin.top),
            margin_right: side(margin.right),
            margin_bottom: side(margin.bottom),
            margin_left: side(margin.left),
            landscape,
            print_background: self.print_background.unwrap_or(true),
            prefer_css_page_size: self.prefer_css_page_size.unwrap_or(true),
            page_ranges: self
                .page_ranges
                .as_ref()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
        }
    }
}

/// Fully resolved print parameters, all lengths in inches.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfParams {
    pub paper_width: f64,
    pub paper_height: f64,
    pub scale: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub landscape: bool,
    pub print_background: bool,
    pub prefer_css_page_size: bool,
    pub page_ranges: Option<String>,
}

impl PdfParams {
    /// Fails when the margins leave no printable area on the paper.
    pub fn check_printable(&self) -> Result<()> {
        let across = self.margin_left + self.margin_right;
        let down = self.margin_top + self.margin_bottom;
        if across >= self.paper_width || down >= self.paper_height {
            return Err(PressError::invalid_input(format!(
                "margins ({:.2}in across, {:.2}in down) leave no printable area on a {:.2}x{:.2}in page",
                across, down, self.paper_width, self.paper_height
            )));
        }
        Ok(())
    }

    /// Viewport the page is laid out in before printing.
    pub fn viewport(&self) -> Viewport {
        Viewport::from_page_inches(self.paper_width, self.paper_height)
    }
}
