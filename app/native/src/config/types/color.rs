//! Color types shared by the overlay configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An opaque RGB color triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Rgb {
    /// Red channel (0-255).
    pub r: u8,
    /// Green channel (0-255).
    pub g: u8,
    /// Blue channel (0-255).
    pub b: u8,
}

impl Rgb {
    /// Creates a new RGB triple.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self { Self { r, g, b } }

    /// Formats the color as a CSS `rgba()` string with the given alpha.
    ///
    /// Alpha is clamped to `[0, 1]` and rendered with two decimals, which
    /// is precise enough for a scrim and keeps the strings comparable.
    #[must_use]
    pub fn rgba(&self, alpha: f64) -> String {
        let alpha = alpha.clamp(0.0, 1.0);
        format!("rgba({}, {}, {}, {alpha:.2})", self.r, self.g, self.b)
    }
}

/// Parses a `#rrggbb` or `rrggbb` hex color string.
///
/// # Errors
///
/// Returns an error message if the string is not a 6-digit hex color.
pub fn parse_hex_color(value: &str) -> Result<Rgb, String> {
    let hex = value.trim().trim_start_matches('#');

    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("invalid hex color: {value}"));
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|e| e.to_string())
    };

    Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
