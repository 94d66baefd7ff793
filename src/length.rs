//! CSS-style lengths used for page geometry and margins.
//!
//! Request bodies may give a bare JSON number (CSS pixels) or a string such
//! as `"12in"`, `"10mm"` or `"0px"`. Everything is normalised to inches
//! before it reaches the print engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::viewport::CSS_PX_PER_INCH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Px,
    In,
    Cm,
    Mm,
    Pt,
    Pc,
}

impl LengthUnit {
    const ALL: [LengthUnit; 6] = [
        LengthUnit::Px,
        LengthUnit::In,
        LengthUnit::Cm,
        LengthUnit::Mm,
        LengthUnit::Pt,
        LengthUnit::Pc,
    ];

    fn suffix(self) -> &'static str {
        match self {
            LengthUnit::Px => "px",
            LengthUnit::In => "in",
            LengthUnit::Cm => "cm",
            LengthUnit::Mm => "mm",
            LengthUnit::Pt => "pt",
            LengthUnit::Pc => "pc",
        }
    }

    fn per_inch(self) -> f64 {
        match self {
            LengthUnit::Px => CSS_PX_PER_INCH,
            LengthUnit::In => 1.0,
            LengthUnit::Cm => 2.54,
            LengthUnit::Mm => 25.4,
            LengthUnit::Pt => 72.0,
            LengthUnit::Pc => 6.0,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum LengthParseError {
    #[error("empty length")]
    Empty,
    #[error("invalid length '{0}': expected a number with optional unit (px, in, cm, mm, pt, pc)")]
    Invalid(String),
    #[error("length '{0}' must be a finite, non-negative value")]
    OutOfRange(String),
}

/// A non-negative length with its original unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLength", into = "String")]
pub struct Length {
    value: f64,
    unit: LengthUnit,
}

impl Length {
    pub fn new(value: f64, unit: LengthUnit) -> Result<Self, LengthParseError> {
        if !value.is_finite() || value < 0.0 {
            return Err(LengthParseError::OutOfRange(format!(
                "{}{}",
                value,
                unit.suffix()
            )));
        }
        Ok(Self { value, unit })
    }

    pub fn px(value: f64) -> Self {
        Self {
            value: value.max(0.0),
            unit: LengthUnit::Px,
        }
    }

    pub fn inches(value: f64) -> Self {
        Self {
            value: value.max(0.0),
            unit: LengthUnit::In,
        }
    }

    pub fn zero() -> Self {
        Self::px(0.0)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> LengthUnit {
        self.unit
    }

    pub fn to_inches(&self) -> f64 {
        self.value / self.unit.per_inch()
    }
}

impl FromStr for Length {
    type Err = LengthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_ascii_lowercase();
        if trimmed.is_empty() {
            return Err(LengthParseError::Empty);
        }

        let (number, unit) = LengthUnit::ALL
            .iter()
            .find_map(|unit| {
                trimmed
                    .strip_suffix(unit.suffix())
                    .map(|number| (number.trim(), *unit))
            })
            .unwrap_or((trimmed.as_str(), LengthUnit::Px));

        let value: f64 = number
            .parse()
            .map_err(|_| LengthParseError::Invalid(s.trim().to_string()))?;

        Length::new(value, unit).map_err(|_| LengthParseError::OutOfRange(s.trim().to_string()))
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

impl From<Length> for String {
    fn from(length: Length) -> Self {
        length.to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLength {
    Number(f64),
    Text(String),
}

impl TryFrom<RawLength> for Length {
    type Error = LengthParseError;

    fn try_from(raw: RawLength) -> Result<Self, Self::Error> {
        match raw {
            RawLength::Number(value) => Length::new(value, LengthUnit::Px),
            RawLength::Text(text) => text.parse(),
        }
    }
}
