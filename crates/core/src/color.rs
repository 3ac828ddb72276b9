//! 8-bit RGB color used for grid cells and the frame average.
//!
//! `Color` is `Copy` and mutated in place by the reducer so a frame's worth
//! of cells never needs a fresh allocation. Each channel is a `u8`, which
//! keeps every channel inside [0, 255] by construction.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An opaque RGB color with 8 bits per channel.
///
/// Serializes as a hex string `"#rrggbb"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Pure black, the value every cell starts at.
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    /// Creates a color from its three channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Overwrites all three channels in place.
    pub fn set(&mut self, r: u8, g: u8, b: u8) {
        self.r = r;
        self.g = g;
        self.b = b;
    }

    /// Parses a hex color string like "#ff00aa" or "ff00aa" (case insensitive).
    ///
    /// Returns [`ParseColorError`] if the input is not a 6-digit hex color.
    pub fn from_hex(hex: &str) -> Result<Color, ParseColorError> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ParseColorError(format!(
                "expected 6 hex digits, got '{hex}'"
            )));
        }
        let channel = |range: std::ops::Range<usize>, name: &str| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|e| ParseColorError(format!("invalid {name} component: {e}")))
        };
        Ok(Color {
            r: channel(0..2, "red")?,
            g: channel(2..4, "green")?,
            b: channel(4..6, "blue")?,
        })
    }

    /// Formats the color as `"#rrggbb"`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.r, self.g, self.b)
    }
}

/// A hex color string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseColorError(String);

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color: {}", self.0)
    }
}

impl std::error::Error for ParseColorError {}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_black() {
        assert_eq!(Color::default(), Color::BLACK);
    }

    #[test]
    fn set_overwrites_channels_in_place() {
        let mut c = Color::BLACK;
        c.set(10, 20, 30);
        assert_eq!(c, Color::new(10, 20, 30));
    }

    #[test]
    fn from_hex_accepts_with_and_without_hash() {
        assert_eq!(Color::from_hex("#ff8000").unwrap(), Color::new(255, 128, 0));
        assert_eq!(Color::from_hex("FF8000").unwrap(), Color::new(255, 128, 0));
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = Color::from_hex("#fff").unwrap_err();
        assert!(err.to_string().contains("6 hex digits"), "got: {err}");
    }

    #[test]
    fn from_hex_rejects_non_hex_digits() {
        assert!(Color::from_hex("#gg0000").is_err());
    }

    #[test]
    fn from_hex_rejects_multibyte_input_without_panicking() {
        assert!(Color::from_hex("#ééé").is_err());
    }

    #[test]
    fn to_hex_is_lowercase_and_zero_padded() {
        assert_eq!(Color::new(1, 2, 171).to_hex(), "#0102ab");
    }

    #[test]
    fn display_shows_decimal_triple() {
        assert_eq!(Color::new(25, 35, 45).to_string(), "(25,35,45)");
    }

    #[test]
    fn serde_uses_hex_strings() {
        let json = serde_json::to_string(&Color::new(25, 35, 45)).unwrap();
        assert_eq!(json, "\"#19232d\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::new(25, 35, 45));
    }
}
