//! Character style attributes.
//!
//! # Responsibility
//! - Define the per-run style record shared by the text model, the
//!   formatting session and the codec.
//!
//! # Invariants
//! - `font_size` is finite and positive for every style produced by core.
//! - Absence of a color (`None`) is a distinct value from any concrete color.

use serde::{Deserialize, Serialize};

/// Font size used when no explicit size has been chosen.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// 8-bit per channel color, compared and persisted bit-exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    pub const CLEAR: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, u8::MAX)
    }
}

/// Style shared by every character of one run.
///
/// Two styles are merge-equal exactly when they compare equal; adjacent runs
/// with merge-equal styles are always coalesced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleAttributes {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Point size.
    pub font_size: f64,
    pub text_color: Option<Rgba>,
    pub background_color: Option<Rgba>,
}

impl Default for StyleAttributes {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            underline: false,
            font_size: DEFAULT_FONT_SIZE,
            text_color: None,
            background_color: None,
        }
    }
}

impl StyleAttributes {
    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    pub fn with_underline(mut self, underline: bool) -> Self {
        self.underline = underline;
        self
    }

    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_text_color(mut self, color: Option<Rgba>) -> Self {
        self.text_color = color;
        self
    }

    pub fn with_background_color(mut self, color: Option<Rgba>) -> Self {
        self.background_color = color;
        self
    }

    /// Returns whether `font_size` can be rendered and persisted.
    pub fn has_valid_font_size(&self) -> bool {
        self.font_size.is_finite() && self.font_size > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::{Rgba, StyleAttributes, DEFAULT_FONT_SIZE};

    #[test]
    fn default_style_is_plain_sixteen_point() {
        let style = StyleAttributes::default();
        assert!(!style.bold && !style.italic && !style.underline);
        assert_eq!(style.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(style.text_color, None);
        assert_eq!(style.background_color, None);
    }

    #[test]
    fn missing_color_differs_from_clear_color() {
        let none = StyleAttributes::default();
        let clear = StyleAttributes::default().with_background_color(Some(Rgba::CLEAR));
        assert_ne!(none, clear);
    }

    #[test]
    fn non_finite_font_size_is_invalid() {
        assert!(!StyleAttributes::default()
            .with_font_size(f64::NAN)
            .has_valid_font_size());
        assert!(!StyleAttributes::default()
            .with_font_size(0.0)
            .has_valid_font_size());
    }
}
