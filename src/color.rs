//! Hex color parsing shared by the renderer, compositor and color pickers

use std::fmt;

use thiserror::Error;

/// Keyword accepted wherever a color string is expected
pub const TRANSPARENT: &str = "transparent";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color '{0}' (expected #RGB, #RRGGBB, #RRGGBBAA or 'transparent')")]
pub struct ColorParseError(pub String);

/// Straight (non-premultiplied) RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);
    pub const CLEAR: Rgba = Rgba { r: 0, g: 0, b: 0, a: 0 };

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Linear interpolation in straight RGBA space, `t` clamped to 0..=1
    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgba {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

/// Parse a CSS-style hex color or the `transparent` keyword
pub fn parse_hex_color(value: &str) -> Result<Rgba, ColorParseError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case(TRANSPARENT) {
        return Ok(Rgba::CLEAR);
    }

    let err = || ColorParseError(value.to_string());
    let hex = trimmed.strip_prefix('#').ok_or_else(err)?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(err());
    }

    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map(|n| n * 17).map_err(|_| err());

    match hex.len() {
        3 => Ok(Rgba::opaque(nibble(0)?, nibble(1)?, nibble(2)?)),
        6 => Ok(Rgba::opaque(byte(0)?, byte(2)?, byte(4)?)),
        8 => Ok(Rgba {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: byte(6)?,
        }),
        _ => Err(err()),
    }
}

/// Format a color as `#RRGGBB`, `#RRGGBBAA` or `transparent`
pub fn format_hex_color(color: Rgba) -> String {
    match color.a {
        0 => TRANSPARENT.to_string(),
        255 => format!("#{:02X}{:02X}{:02X}", color.r, color.g, color.b),
        a => format!("#{:02X}{:02X}{:02X}{:02X}", color.r, color.g, color.b, a),
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_hex_color(*self))
    }
}
