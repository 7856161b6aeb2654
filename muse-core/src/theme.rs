//! Process-wide formatting configuration, frozen once at startup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Which wire format the status line is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FormatMode {
    /// Inline `%{...}` directives for lemonbar-style renderers.
    #[default]
    Lemonbar,
    /// The i3bar JSON stream protocol with pango markup.
    I3,
}

impl fmt::Display for FormatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatMode::Lemonbar => write!(f, "lemonbar"),
            FormatMode::I3 => write!(f, "i3"),
        }
    }
}

impl FromStr for FormatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lemonbar" | "lemon" | "bar" => Ok(FormatMode::Lemonbar),
            "i3" | "i3bar" | "json" => Ok(FormatMode::I3),
            other => Err(format!(
                "unknown format mode '{other}'; expected: lemonbar, i3"
            )),
        }
    }
}

/// Immutable rendering configuration shared (via `Arc`) by the formatter and
/// every colorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub mode: FormatMode,
    pub font: String,
    pub primary: Color,
    pub secondary: Color,
    pub warning: Color,
    pub alarm: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            mode: FormatMode::default(),
            font: String::new(),
            primary: Color::rgba(0xff, 0xff, 0xff, 0xff),
            secondary: Color::rgba(0xff, 0xff, 0xff, 0xc0),
            warning: Color::rgb(0xff, 0xaa, 0x00),
            alarm: Color::rgb(0xff, 0x00, 0x00),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parse_and_display() {
        assert_eq!("i3".parse::<FormatMode>().unwrap(), FormatMode::I3);
        assert_eq!("Lemonbar".parse::<FormatMode>().unwrap(), FormatMode::Lemonbar);
        assert!("polybar".parse::<FormatMode>().is_err());
        assert_eq!(FormatMode::I3.to_string(), "i3");
    }
}
