//! Root margin
//!
//! CSS margin shorthand (`"200px 0px"`) used to grow or shrink the viewport
//! before intersections are computed.

use std::fmt;
use std::str::FromStr;

use folio_dom::DOMRect;

use crate::ConfigError;

/// One margin component
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarginValue {
    Px(f32),
    /// Percentage of the viewport size along the same axis
    Percent(f32),
}

impl MarginValue {
    fn resolve(self, axis_len: f32) -> f32 {
        match self {
            Self::Px(px) => px,
            Self::Percent(pct) => axis_len * pct / 100.0,
        }
    }
}

impl FromStr for MarginValue {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidRootMargin(s.to_string());
        let (number, percent) = if let Some(n) = s.strip_suffix("px") {
            (n, false)
        } else if let Some(n) = s.strip_suffix('%') {
            (n, true)
        } else if s == "0" {
            (s, false)
        } else {
            return Err(invalid());
        };

        let value: f32 = number.parse().map_err(|_| invalid())?;
        if !value.is_finite() {
            return Err(invalid());
        }
        Ok(if percent { Self::Percent(value) } else { Self::Px(value) })
    }
}

impl fmt::Display for MarginValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(v) => write!(f, "{v}px"),
            Self::Percent(v) => write!(f, "{v}%"),
        }
    }
}

/// Parsed root margin (top, right, bottom, left)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootMargin {
    pub top: MarginValue,
    pub right: MarginValue,
    pub bottom: MarginValue,
    pub left: MarginValue,
}

impl RootMargin {
    pub const ZERO: RootMargin = RootMargin {
        top: MarginValue::Px(0.0),
        right: MarginValue::Px(0.0),
        bottom: MarginValue::Px(0.0),
        left: MarginValue::Px(0.0),
    };

    /// Viewport grown by this margin
    pub fn apply(&self, viewport: DOMRect) -> DOMRect {
        viewport.expand(
            self.top.resolve(viewport.height),
            self.right.resolve(viewport.width),
            self.bottom.resolve(viewport.height),
            self.left.resolve(viewport.width),
        )
    }
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::ZERO
    }
}

impl FromStr for RootMargin {
    type Err = ConfigError;

    /// Accepts 1 to 4 components with CSS shorthand expansion
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split_whitespace()
            .map(MarginValue::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        let (top, right, bottom, left) = match values.as_slice() {
            [all] => (*all, *all, *all, *all),
            [vertical, horizontal] => (*vertical, *horizontal, *vertical, *horizontal),
            [top, horizontal, bottom] => (*top, *horizontal, *bottom, *horizontal),
            [top, right, bottom, left] => (*top, *right, *bottom, *left),
            _ => return Err(ConfigError::InvalidRootMargin(s.to_string())),
        };
        Ok(Self { top, right, bottom, left })
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}
