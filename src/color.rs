//! RGBA colors for the key surface.
//!
//! Colors arrive from the property inspector as HTML strings (`#FF0000`,
//! `#F00`, `#80FF0000` or a named color such as `yellow`). [`Rgba`] parses
//! all of these and converts back to a `#RRGGBB` string for terminal styling.
//!
//! ```rust
//! use streamtimer_widgets::color::Rgba;
//!
//! let red: Rgba = "#FF0000".parse().unwrap();
//! assert_eq!(red, Rgba::rgb(255, 0, 0));
//! assert_eq!("green".parse::<Rgba>().unwrap(), Rgba::GREEN);
//! ```

use crate::config::ConfigError;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A 32-bit color with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel, 255 is opaque.
    pub a: u8,
}

impl Rgba {
    /// Opaque black, also the "derive from remaining time" hourglass marker.
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    /// Hourglass color while more than half of the interval remains.
    pub const GREEN: Rgba = Rgba::rgb(0, 128, 0);
    /// Hourglass color between 20% and 50% remaining.
    pub const YELLOW: Rgba = Rgba::rgb(255, 255, 0);
    /// Hourglass color for the last 20% and the default alert color.
    pub const RED: Rgba = Rgba::rgb(255, 0, 0);

    /// Creates an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Creates a color with an explicit alpha channel.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// True when red, green and blue are all zero. Alpha is ignored.
    pub fn is_black(&self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }

    /// Formats the color as `#RRGGBB`, dropping alpha.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "{}", self.to_hex())
        } else {
            write!(
                f,
                "#{:02X}{:02X}{:02X}{:02X}",
                self.a, self.r, self.g, self.b
            )
        }
    }
}

// Web named colors, values as browsers and .NET's ColorTranslator report them.
static NAMED_COLORS: Lazy<HashMap<&'static str, Rgba>> = Lazy::new(|| {
    HashMap::from([
        ("black", Rgba::BLACK),
        ("white", Rgba::rgb(255, 255, 255)),
        ("red", Rgba::RED),
        ("green", Rgba::GREEN),
        ("lime", Rgba::rgb(0, 255, 0)),
        ("blue", Rgba::rgb(0, 0, 255)),
        ("yellow", Rgba::YELLOW),
        ("orange", Rgba::rgb(255, 165, 0)),
        ("purple", Rgba::rgb(128, 0, 128)),
        ("magenta", Rgba::rgb(255, 0, 255)),
        ("fuchsia", Rgba::rgb(255, 0, 255)),
        ("cyan", Rgba::rgb(0, 255, 255)),
        ("aqua", Rgba::rgb(0, 255, 255)),
        ("gray", Rgba::rgb(128, 128, 128)),
        ("grey", Rgba::rgb(128, 128, 128)),
        ("silver", Rgba::rgb(192, 192, 192)),
        ("maroon", Rgba::rgb(128, 0, 0)),
        ("navy", Rgba::rgb(0, 0, 128)),
        ("teal", Rgba::rgb(0, 128, 128)),
        ("olive", Rgba::rgb(128, 128, 0)),
        ("pink", Rgba::rgb(255, 192, 203)),
        ("transparent", Rgba::rgba(255, 255, 255, 0)),
    ])
});

fn hex_digit(c: u8) -> Option<u8> {
    (c as char).to_digit(16).map(|d| d as u8)
}

fn hex_pair(s: &[u8]) -> Option<u8> {
    Some(hex_digit(s[0])? << 4 | hex_digit(s[1])?)
}

impl FromStr for Rgba {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || ConfigError::InvalidColor(s.to_string());

        let Some(hex) = trimmed.strip_prefix('#') else {
            return NAMED_COLORS
                .get(trimmed.to_ascii_lowercase().as_str())
                .copied()
                .ok_or_else(invalid);
        };

        let bytes = hex.as_bytes();
        match bytes.len() {
            3 => {
                let expand = |c: u8| hex_digit(c).map(|d| d << 4 | d);
                Ok(Rgba::rgb(
                    expand(bytes[0]).ok_or_else(invalid)?,
                    expand(bytes[1]).ok_or_else(invalid)?,
                    expand(bytes[2]).ok_or_else(invalid)?,
                ))
            }
            6 => Ok(Rgba::rgb(
                hex_pair(&bytes[0..2]).ok_or_else(invalid)?,
                hex_pair(&bytes[2..4]).ok_or_else(invalid)?,
                hex_pair(&bytes[4..6]).ok_or_else(invalid)?,
            )),
            8 => Ok(Rgba::rgba(
                hex_pair(&bytes[2..4]).ok_or_else(invalid)?,
                hex_pair(&bytes[4..6]).ok_or_else(invalid)?,
                hex_pair(&bytes[6..8]).ok_or_else(invalid)?,
                hex_pair(&bytes[0..2]).ok_or_else(invalid)?,
            )),
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_six_digit_hex() {
        assert_eq!("#FF0000".parse::<Rgba>().unwrap(), Rgba::RED);
        assert_eq!("#0a0B0c".parse::<Rgba>().unwrap(), Rgba::rgb(10, 11, 12));
    }

    #[test]
    fn test_parse_short_hex_expands_digits() {
        assert_eq!("#F80".parse::<Rgba>().unwrap(), Rgba::rgb(255, 136, 0));
    }

    #[test]
    fn test_parse_argb_hex() {
        let c: Rgba = "#80102030".parse().unwrap();
        assert_eq!(c, Rgba::rgba(0x10, 0x20, 0x30, 0x80));
        assert_eq!(c.to_string(), "#80102030");
    }

    #[test]
    fn test_parse_named_colors_case_insensitive() {
        assert_eq!("Yellow".parse::<Rgba>().unwrap(), Rgba::YELLOW);
        assert_eq!(" green ".parse::<Rgba>().unwrap(), Rgba::GREEN);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Rgba>().is_err());
        assert!("#GG0000".parse::<Rgba>().is_err());
        assert!("#12345".parse::<Rgba>().is_err());
        assert!("not-a-color".parse::<Rgba>().is_err());
    }

    #[test]
    fn test_is_black_ignores_alpha() {
        assert!(Rgba::BLACK.is_black());
        assert!(Rgba::rgba(0, 0, 0, 10).is_black());
        assert!(!Rgba::rgb(0, 0, 1).is_black());
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(Rgba::GREEN.to_hex(), "#008000");
    }
}
