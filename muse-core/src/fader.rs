//! Flash-then-settle color state.
//!
//! Expiry is derived purely from the trigger instant; reading never mutates.

use std::time::{Duration, Instant};

use crate::color::{ease_quintic, interpolate, Color};

/// Interpolates from `start` back to `end` over `duration` after each
/// [`Fader::trigger`], with quintic easing.
#[derive(Debug, Clone, PartialEq)]
pub struct Fader {
    duration: Duration,
    start: Color,
    end: Color,
    triggered_at: Option<Instant>,
}

impl Fader {
    pub fn new(duration: Duration, start: Color, end: Color) -> Self {
        Self {
            duration,
            start,
            end,
            triggered_at: None,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Restart the fade. Re-triggering mid-fade restarts the countdown.
    pub fn trigger(&mut self) {
        self.trigger_at(Instant::now());
    }

    pub fn trigger_at(&mut self, now: Instant) {
        self.triggered_at = Some(now);
    }

    pub fn is_fading(&self) -> bool {
        self.is_fading_at(Instant::now())
    }

    pub fn is_fading_at(&self, now: Instant) -> bool {
        self.elapsed_at(now).is_some()
    }

    pub fn current_color(&self) -> Color {
        self.current_color_at(Instant::now())
    }

    pub fn current_color_at(&self, now: Instant) -> Color {
        match self.elapsed_at(now) {
            Some(elapsed) => {
                let x = elapsed.as_secs_f32() / self.duration.as_secs_f32();
                interpolate(self.start, self.end, ease_quintic(x))
            }
            None => self.end,
        }
    }

    /// Time since the trigger, or `None` once the fade is over.
    fn elapsed_at(&self, now: Instant) -> Option<Duration> {
        let triggered_at = self.triggered_at?;
        let elapsed = now.saturating_duration_since(triggered_at);
        (elapsed < self.duration).then_some(elapsed)
    }
}
