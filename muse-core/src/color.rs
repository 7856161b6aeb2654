//! RGBA colors, per-channel interpolation and the two easing curves.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ColorError;
use crate::theme::FormatMode;

/// An 8-bit-per-channel color.
///
/// Serialized as an `RRGGBBAA` hex string so config files stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 0xff)
    }

    /// Parse `RRGGBB` (opaque) or `RRGGBBAA`, with an optional leading `#`.
    pub fn parse(hex: &str) -> Result<Self, ColorError> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || ColorError::Invalid(hex.to_string());
        if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        let a = if digits.len() == 8 { channel(6)? } else { 0xff };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// `AARRGGBB`, the order bar-markup color directives expect.
    pub fn argb_hex(&self) -> String {
        format!("{:02x}{:02x}{:02x}{:02x}", self.a, self.r, self.g, self.b)
    }

    /// `RRGGBBAA`, the order pango markup expects.
    pub fn rgba_hex(&self) -> String {
        format!("{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }

    pub fn hex_for(&self, mode: FormatMode) -> String {
        match mode {
            FormatMode::Lemonbar => self.argb_hex(),
            FormatMode::I3 => self.rgba_hex(),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rgba_hex())
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.rgba_hex()
    }
}

fn clamp_unit(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Linear per-channel blend; `t` outside `[0, 1]` is clamped.
pub fn interpolate(a: Color, b: Color, t: f32) -> Color {
    let t = clamp_unit(t);
    let mix = |from: u8, to: u8| -> u8 {
        let value = f32::from(from) * (1.0 - t) + f32::from(to) * t;
        value.round().clamp(0.0, 255.0) as u8
    };
    Color::rgba(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b), mix(a.a, b.a))
}

/// `x^5`: slow start, fast finish. Used by [`crate::Fader`].
pub fn ease_quintic(x: f32) -> f32 {
    clamp_unit(x).powi(5)
}

/// `1 - |2x - 1|^3`: rises from 0 to 1 at the midpoint and back to 0, concave
/// throughout. Used for continuously pulsing colors.
pub fn ease_arc(x: f32) -> f32 {
    let x = clamp_unit(x);
    1.0 - (2.0 * x - 1.0).abs().powi(3)
}

/// Color of a periodic pulse from `from` toward `to`, keyed off wall-clock
/// milliseconds modulo `period`.
pub fn pulse_color_at(from: Color, to: Color, period: Duration, unix_millis: u128) -> Color {
    let period_ms = period.as_millis().max(1);
    let phase = (unix_millis % period_ms) as f32 / period_ms as f32;
    interpolate(from, to, ease_arc(phase))
}
