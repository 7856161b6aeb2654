//! YAML configuration.
//!
//! # Location
//!
//! ```text
//! $XDG_CONFIG_HOME/muse-status/config.yaml   (or ~/.config/muse-status/config.yaml)
//! ```
//!
//! A missing file is not an error: [`StatusConfig::default`] is used instead.
//!
//! # Example
//!
//! ```yaml
//! mode: lemonbar
//! font: "Iosevka 11"
//! colors:
//!   primary: ffffff
//!   secondary: ffffffc0
//! blocks:
//!   left:
//!     - kind: bspwm
//!     - kind: window
//!   center:
//!     - kind: date
//!   right:
//!     - kind: brightness
//!       card: intel_backlight
//!     - kind: volume
//!       notify_only: true
//!     - kind: battery
//!       battery: BAT0
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::ConfigError;
use crate::theme::{FormatMode, Theme};

pub const CONFIG_DIR: &str = "muse-status";
pub const CONFIG_FILE: &str = "config.yaml";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Root of the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StatusConfig {
    pub mode: FormatMode,
    pub font: String,
    pub colors: Palette,
    /// Overrides the daemon socket location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket: Option<PathBuf>,
    pub blocks: ZoneLayout,
}

impl StatusConfig {
    /// Freeze mode, font and palette into the theme shared by every renderer.
    pub fn theme(&self) -> Theme {
        Theme {
            mode: self.mode,
            font: self.font.clone(),
            primary: self.colors.primary,
            secondary: self.colors.secondary,
            warning: self.colors.warning,
            alarm: self.colors.alarm,
        }
    }
}

/// Process-wide colors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub primary: Color,
    pub secondary: Color,
    pub warning: Color,
    pub alarm: Color,
}

impl Default for Palette {
    fn default() -> Self {
        let theme = Theme::default();
        Self {
            primary: theme.primary,
            secondary: theme.secondary,
            warning: theme.warning,
            alarm: theme.alarm,
        }
    }
}

/// Blocks per zone, in rendering order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneLayout {
    pub left: Vec<BlockSpec>,
    pub center: Vec<BlockSpec>,
    pub right: Vec<BlockSpec>,
}

impl Default for ZoneLayout {
    fn default() -> Self {
        Self {
            left: vec![BlockSpec::Window { rapidfire: false }],
            center: vec![BlockSpec::Date],
            right: vec![
                BlockSpec::Volume {
                    control: default_mixer_control(),
                    notify_only: false,
                },
                BlockSpec::Battery {
                    battery: default_battery(),
                    warning_level: default_warning_level(),
                    alarm_level: default_alarm_level(),
                },
            ],
        }
    }
}

/// One block entry in a zone, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlockSpec {
    Date,
    Window {
        /// Poll the focused title every 100 ms instead of waiting for
        /// `notify window` or a bspwm report.
        #[serde(default)]
        rapidfire: bool,
    },
    Playerctl,
    Mpd {
        #[serde(default = "default_mpd_host")]
        host: String,
        #[serde(default = "default_mpd_port")]
        port: u16,
    },
    Bspwm,
    I3,
    Brightness {
        card: String,
        /// Skip the fast poll loop; rely on `muse-status notify brightness`.
        #[serde(default)]
        notify_only: bool,
    },
    Volume {
        #[serde(default = "default_mixer_control")]
        control: String,
        #[serde(default)]
        notify_only: bool,
    },
    Battery {
        #[serde(default = "default_battery")]
        battery: String,
        #[serde(default = "default_warning_level")]
        warning_level: u8,
        #[serde(default = "default_alarm_level")]
        alarm_level: u8,
    },
    Network {
        interface: String,
        #[serde(default)]
        packet_loss_check: bool,
    },
    Weather {
        ipstack_key: String,
        openweathermap_key: String,
        #[serde(default = "default_units")]
        units: String,
    },
}

impl BlockSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            BlockSpec::Date => "date",
            BlockSpec::Window { .. } => "window",
            BlockSpec::Playerctl => "playerctl",
            BlockSpec::Mpd { .. } => "mpd",
            BlockSpec::Bspwm => "bspwm",
            BlockSpec::I3 => "i3",
            BlockSpec::Brightness { .. } => "brightness",
            BlockSpec::Volume { .. } => "volume",
            BlockSpec::Battery { .. } => "battery",
            BlockSpec::Network { .. } => "network",
            BlockSpec::Weather { .. } => "weather",
        }
    }
}

fn default_mixer_control() -> String {
    "Master".to_string()
}

fn default_mpd_host() -> String {
    "localhost".to_string()
}

fn default_mpd_port() -> u16 {
    6600
}

fn default_battery() -> String {
    "BAT0".to_string()
}

fn default_warning_level() -> u8 {
    15
}

fn default_alarm_level() -> u8 {
    5
}

fn default_units() -> String {
    "imperial".to_string()
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<config_home>/muse-status/config.yaml`. Pure, no I/O.
pub fn config_path_at(config_home: &Path) -> PathBuf {
    config_home.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// `config_path_at` convenience wrapper using `dirs::config_dir()`.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let config_home = dirs::config_dir().ok_or(ConfigError::HomeNotFound)?;
    Ok(config_path_at(&config_home))
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Load the config at `path`; a missing file yields the defaults.
///
/// Returns `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(path: &Path) -> Result<StatusConfig, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(StatusConfig::default())
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if contents.trim().is_empty() {
        return Ok(StatusConfig::default());
    }

    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// `load_at` convenience wrapper for the default location.
pub fn load() -> Result<StatusConfig, ConfigError> {
    load_at(&config_path()?)
}

/// Render the effective configuration back to YAML.
pub fn to_yaml(config: &StatusConfig) -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(config)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
