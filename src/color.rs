use crate::error::AssetError;
use image::Rgba;
use serde::Deserialize;
use std::{fmt, str::FromStr};

/// An opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// `#01203F`, top of the background gradient.
pub const NIGHT_BLUE: Color = Color::new(0x01, 0x20, 0x3F);
/// `#054A2E`, middle of the background gradient.
pub const DEEP_GREEN: Color = Color::new(0x05, 0x4A, 0x2E);
/// `#0A7A50`, bottom of the background gradient.
pub const EMERALD: Color = Color::new(0x0A, 0x7A, 0x50);
/// `#FFD166`, coin center.
pub const COIN_LIGHT: Color = Color::new(0xFF, 0xD1, 0x66);
/// `#F2A900`, coin rim.
pub const COIN_GOLD: Color = Color::new(0xF2, 0xA9, 0x00);

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Interpolate towards `other`, rounding half up.
    pub fn lerp(self, other: Color, t: f64) -> Color {
        Color {
            r: lerp_channel(self.r, other.r, t),
            g: lerp_channel(self.g, other.g, t),
            b: lerp_channel(self.b, other.b, t),
        }
    }

    pub fn brighten(self, amount: u8) -> Color {
        Color {
            r: self.r.saturating_add(amount),
            g: self.g.saturating_add(amount),
            b: self.b.saturating_add(amount),
        }
    }

    /// Multiply each channel, truncating towards zero.
    pub fn scale(self, r: f64, g: f64, b: f64) -> Color {
        Color {
            r: scale_channel(self.r, r),
            g: scale_channel(self.g, g),
            b: scale_channel(self.b, b),
        }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }
}

fn lerp_channel(a: u8, b: u8, t: f64) -> u8 {
    let (a, b) = (a as f64, b as f64);
    (a + (b - a) * t + 0.5).floor().clamp(0.0, 255.0) as u8
}

fn scale_channel(v: u8, factor: f64) -> u8 {
    (v as f64 * factor).clamp(0.0, 255.0) as u8
}

impl FromStr for Color {
    type Err = AssetError;

    /// Accepts any CSS color (`#fff`, `#01203F`, `rgb(...)`, named colors).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let srgb = css_color::Srgb::from_str(s.trim())
            .map_err(|_| AssetError::InvalidConfig(format!("not a CSS color: {s:?}")))?;
        let channel = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        Ok(Color::new(
            channel(srgb.red),
            channel(srgb.green),
            channel(srgb.blue),
        ))
    }
}

impl TryFrom<String> for Color {
    type Error = AssetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}
