//! muse-status core library: colors, easing, faders, theme, configuration.
//!
//! Public API surface:
//! - [`color`]: [`Color`], interpolation and easing curves
//! - [`fader`]: [`Fader`], a time-boxed flash-then-settle color
//! - [`colorer`]: the [`Colorer`] capability and the stock [`Tone`]s
//! - [`theme`]: [`Theme`] and [`FormatMode`]
//! - [`config`]: YAML configuration and block specs
//! - [`error`]: [`ColorError`], [`ConfigError`]

pub mod color;
pub mod colorer;
pub mod config;
pub mod error;
pub mod fader;
pub mod theme;

pub use color::{ease_arc, ease_quintic, interpolate, pulse_color_at, Color};
pub use colorer::{Colorer, SegmentColors, Tone};
pub use config::{BlockSpec, Palette, StatusConfig, ZoneLayout};
pub use error::{ColorError, ConfigError};
pub use fader::Fader;
pub use theme::{FormatMode, Theme};
