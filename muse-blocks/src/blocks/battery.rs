//! Battery charge from sysfs, with time-to-empty / time-to-full estimated
//! from a moving average of the observed charge rate.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use muse_core::{Colorer, SegmentColors, Theme, Tone};
use muse_format::BlockContent;
use tokio::sync::broadcast;

use crate::block::{lock, Block};
use crate::error::BlockError;
use crate::probe::{level_index, read_int, read_trimmed};
use crate::schedule::{poll, Cadence};
use crate::signal::SignalStream;

pub const POWER_SUPPLY_ROOT: &str = "/sys/class/power_supply";

const DISCHARGING_ICONS: [char; 11] = [
    '\u{f08e}', '\u{f07a}', '\u{f07b}', '\u{f07c}', '\u{f07d}', '\u{f07e}', '\u{f07f}',
    '\u{f080}', '\u{f081}', '\u{f082}', '\u{f079}',
];
const CHARGING_ICONS: [char; 11] = [
    '\u{f89e}', '\u{f89b}', '\u{f086}', '\u{f087}', '\u{f088}', '\u{f89c}', '\u{f089}',
    '\u{f89d}', '\u{f08a}', '\u{f08b}', '\u{f085}',
];

/// Reads kept in each moving average.
const MAX_READS: u32 = 40;
/// Shortest interval a rate sample may span.
const MIN_SAMPLE: Duration = Duration::from_secs(5);
/// Below this, the estimate is shown as minutes instead of a clock time.
const SHORT_ETA: Duration = Duration::from_secs(30 * 60);
const POLL: Duration = Duration::from_secs(5);
const FRAME: Duration = Duration::from_nanos(1_000_000_000 / 15);
const TIME_FORMAT: &str = "%-I:%M %P";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeStatus {
    Charging,
    Discharging,
    Full,
    NotCharging,
    Unknown,
}

impl ChargeStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Charging" => ChargeStatus::Charging,
            "Discharging" => ChargeStatus::Discharging,
            "Full" => ChargeStatus::Full,
            "Not charging" => ChargeStatus::NotCharging,
            _ => ChargeStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Read {
    at: Instant,
    status: ChargeStatus,
    charge: i64,
}

/// Running mean of seconds per charge unit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct RateAverage {
    secs_per_unit: f64,
    reads: u32,
}

impl RateAverage {
    fn add(&mut self, rate: f64) {
        let n = f64::from(self.reads);
        self.secs_per_unit = self.secs_per_unit * n / (n + 1.0) + rate / (n + 1.0);
        if self.reads < MAX_READS {
            self.reads += 1;
        }
    }

    fn rate(&self) -> Option<f64> {
        (self.reads > 0).then_some(self.secs_per_unit)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct BatteryState {
    full: i64,
    current: Option<Read>,
    anchor: Option<Read>,
    charging: RateAverage,
    discharging: RateAverage,
}

impl BatteryState {
    fn new(full: i64) -> Self {
        Self {
            full,
            current: None,
            anchor: None,
            charging: RateAverage::default(),
            discharging: RateAverage::default(),
        }
    }

    fn record(&mut self, read: Read) {
        self.current = Some(read);
        let Some(anchor) = self.anchor else {
            self.anchor = Some(read);
            return;
        };

        if anchor.status != read.status {
            match read.status {
                ChargeStatus::Charging => self.charging = RateAverage::default(),
                ChargeStatus::Discharging => self.discharging = RateAverage::default(),
                _ => {}
            }
            self.anchor = Some(read);
            return;
        }

        let delta = read.charge - anchor.charge;
        let elapsed = read.at.saturating_duration_since(anchor.at);
        if delta == 0 || elapsed < MIN_SAMPLE {
            return;
        }

        let rate = elapsed.as_secs_f64() / delta as f64;
        match read.status {
            ChargeStatus::Discharging if rate < 0.0 => self.discharging.add(rate),
            ChargeStatus::Charging if rate > 0.0 => self.charging.add(rate),
            _ => {}
        }
        self.anchor = Some(read);
    }

    fn status(&self) -> Option<ChargeStatus> {
        self.current.map(|read| read.status)
    }

    fn percent(&self) -> Option<u32> {
        self.current
            .map(|read| (read.charge.clamp(0, self.full) * 100 / self.full) as u32)
    }

    /// Time until empty (discharging) or full (charging).
    fn remaining(&self) -> Option<Duration> {
        let read = self.current?;
        let secs = match read.status {
            ChargeStatus::Discharging => -(read.charge as f64) * self.discharging.rate()?,
            ChargeStatus::Charging => (self.full - read.charge) as f64 * self.charging.rate()?,
            _ => return None,
        };
        (secs.is_finite() && secs > 0.0).then(|| Duration::from_secs_f64(secs))
    }
}

/// `"12 min left"`, `"Until 9:30 pm"` or `"Full at 9:30 pm"`.
pub fn eta_text(status: ChargeStatus, remaining: Duration, finish: DateTime<Local>) -> String {
    if remaining <= SHORT_ETA {
        let minutes = (remaining.as_secs() + 59) / 60;
        return format!("{minutes} min left");
    }
    match status {
        ChargeStatus::Charging => format!("Full at {}", finish.format(TIME_FORMAT)),
        ChargeStatus::Discharging => format!("Until {}", finish.format(TIME_FORMAT)),
        _ => String::new(),
    }
}

#[derive(Debug)]
pub struct BatteryBlock {
    dir: PathBuf,
    charge_file: &'static str,
    full_file: &'static str,
    warning_level: u32,
    alarm_level: u32,
    state: Mutex<BatteryState>,
}

impl BatteryBlock {
    pub fn new(battery: &str, warning_level: u8, alarm_level: u8) -> Result<Self, BlockError> {
        Self::with_root(Path::new(POWER_SUPPLY_ROOT), battery, warning_level, alarm_level)
    }

    /// Like [`BatteryBlock::new`] with the power-supply class directory at
    /// `root`.
    pub fn with_root(
        root: &Path,
        battery: &str,
        warning_level: u8,
        alarm_level: u8,
    ) -> Result<Self, BlockError> {
        let dir = root.join(battery);
        if !dir.is_dir() {
            return Err(BlockError::MissingPath { path: dir });
        }

        // Some batteries report energy (µWh) instead of charge (µAh).
        let (charge_file, full_file) = if dir.join("charge_now").exists() {
            ("charge_now", "charge_full")
        } else {
            ("energy_now", "energy_full")
        };
        let full = read_int(&dir.join(full_file))?;
        if full <= 0 {
            return Err(BlockError::Parse {
                what: "full charge",
                input: full.to_string(),
            });
        }

        Ok(Self {
            dir,
            charge_file,
            full_file,
            warning_level: u32::from(warning_level),
            alarm_level: u32::from(alarm_level),
            state: Mutex::new(BatteryState::new(full)),
        })
    }

    fn read(&self) -> Result<Read, BlockError> {
        let status = ChargeStatus::parse(&read_trimmed(&self.dir.join("status"))?);
        let charge = read_int(&self.dir.join(self.charge_file))?;
        Ok(Read {
            at: Instant::now(),
            status,
            charge,
        })
    }

    fn tone(&self) -> Option<Tone> {
        let state = lock(&self.state);
        let percent = state.percent()?;
        match state.status()? {
            ChargeStatus::Charging | ChargeStatus::Full => None,
            _ if percent <= self.alarm_level => Some(Tone::Alarm),
            _ if percent <= self.warning_level => Some(Tone::Warning),
            _ => None,
        }
    }
}

impl Block for BatteryBlock {
    fn name(&self) -> &str {
        "battery"
    }

    fn update(&self) {
        let read = match self.read() {
            Ok(read) => read,
            Err(err) => {
                tracing::debug!(error = %err, "battery probe failed");
                return;
            }
        };

        let mut state = lock(&self.state);
        // Full capacity drifts as the battery ages.
        if let Ok(full) = read_int(&self.dir.join(self.full_file)) {
            if full > 0 {
                state.full = full;
            }
        }
        state.record(read);
    }

    fn content(&self) -> BlockContent {
        let state = lock(&self.state);
        let (Some(status), Some(percent)) = (state.status(), state.percent()) else {
            return BlockContent {
                hidden: true,
                ..BlockContent::default()
            };
        };

        let icon = match status {
            ChargeStatus::Charging => CHARGING_ICONS[level_index(percent, CHARGING_ICONS.len())],
            ChargeStatus::Full => CHARGING_ICONS[CHARGING_ICONS.len() - 1],
            _ => DISCHARGING_ICONS[level_index(percent, DISCHARGING_ICONS.len())],
        };
        let secondary = state
            .remaining()
            .and_then(|remaining| {
                let finish = Local::now() + chrono::Duration::from_std(remaining).ok()?;
                Some(eta_text(status, remaining, finish))
            })
            .unwrap_or_default();

        BlockContent {
            icon: Some(icon),
            primary: format!("{percent}%"),
            secondary,
            hidden: status == ChargeStatus::Full,
            ..BlockContent::default()
        }
    }

    fn colors(&self, theme: &Theme) -> Option<SegmentColors> {
        self.tone().map(|tone| tone.colors(theme))
    }

    fn animating(&self) -> bool {
        self.tone().is_some_and(|tone| tone.is_animated())
    }

    fn start_broadcast(self: Arc<Self>, shutdown: broadcast::Receiver<()>) -> SignalStream {
        poll(self, Cadence::animated(POLL, FRAME), shutdown)
    }
}
