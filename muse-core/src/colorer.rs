//! The colorer capability: icon / primary / secondary colors for one block.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::color::{pulse_color_at, Color};
use crate::fader::Fader;
use crate::theme::Theme;

/// Resolved colors for the three segments of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentColors {
    pub icon: Color,
    pub primary: Color,
    pub secondary: Color,
}

impl SegmentColors {
    pub const fn uniform(color: Color) -> Self {
        Self {
            icon: color,
            primary: color,
            secondary: color,
        }
    }

    /// What a block without a colorer renders with.
    pub fn defaults(theme: &Theme) -> Self {
        Self {
            icon: theme.primary,
            primary: theme.primary,
            secondary: theme.secondary,
        }
    }
}

/// Produces segment colors on demand. Each call is independent, so pulsing
/// and fading colorers can be sampled at any frame rate.
pub trait Colorer {
    fn colors(&self, theme: &Theme) -> SegmentColors;
}

/// Stock colorers shared by many blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    /// Primary icon and text, secondary detail.
    Default,
    /// Everything in the secondary color.
    Dim,
    /// Slow orange pulse (2 s period).
    Warning,
    /// Fast red pulse (1 s period).
    Alarm,
}

impl Tone {
    pub fn colors_at(&self, theme: &Theme, unix_millis: u128) -> SegmentColors {
        let pulse = |target: Color, secs: u64| {
            SegmentColors::uniform(pulse_color_at(
                theme.secondary,
                target,
                Duration::from_secs(secs),
                unix_millis,
            ))
        };

        match self {
            Tone::Default => SegmentColors::defaults(theme),
            Tone::Dim => SegmentColors::uniform(theme.secondary),
            Tone::Warning => pulse(theme.warning, 2),
            Tone::Alarm => pulse(theme.alarm, 1),
        }
    }

    /// True for tones whose color changes with wall-clock time.
    pub fn is_animated(&self) -> bool {
        matches!(self, Tone::Warning | Tone::Alarm)
    }
}

impl Colorer for Tone {
    fn colors(&self, theme: &Theme) -> SegmentColors {
        self.colors_at(theme, unix_millis_now())
    }
}

impl Colorer for Fader {
    fn colors(&self, _theme: &Theme) -> SegmentColors {
        SegmentColors::uniform(self.current_color())
    }
}

fn unix_millis_now() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tone_uses_theme_colors() {
        let theme = Theme::default();
        let colors = Tone::Default.colors(&theme);
        assert_eq!(colors.icon, theme.primary);
        assert_eq!(colors.primary, theme.primary);
        assert_eq!(colors.secondary, theme.secondary);
    }

    #[test]
    fn alarm_pulse_reaches_alarm_color_mid_period() {
        let theme = Theme::default();
        assert_eq!(Tone::Alarm.colors_at(&theme, 500).primary, theme.alarm);
        assert_eq!(Tone::Alarm.colors_at(&theme, 1_000).primary, theme.secondary);
    }

    #[test]
    fn warning_pulse_has_two_second_period() {
        let theme = Theme::default();
        assert_eq!(Tone::Warning.colors_at(&theme, 1_000).icon, theme.warning);
        assert_eq!(Tone::Warning.colors_at(&theme, 2_000).icon, theme.secondary);
    }

    #[test]
    fn resting_fader_colors_every_segment_with_end_color() {
        let theme = Theme::default();
        let fader = Fader::new(Duration::from_secs(3), theme.primary, theme.secondary);
        assert_eq!(fader.colors(&theme), SegmentColors::uniform(theme.secondary));
    }
}
