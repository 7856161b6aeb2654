//! Mixer volume via `amixer`, flashing on change.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use muse_core::{Colorer, Fader, SegmentColors, Theme};
use muse_format::BlockContent;
use tokio::sync::broadcast;

use crate::block::{lock, Block};
use crate::probe::{level_index, run_command};
use crate::schedule::{poll, Cadence};
use crate::signal::SignalStream;

const ICONS: [char; 3] = ['\u{f026}', '\u{f027}', '\u{f028}'];
const MUTE_ICON: char = '\u{f6a9}';
const FADE: Duration = Duration::from_secs(3);
const POLL: Duration = Duration::from_millis(200);
const FRAME: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeReading {
    pub percent: u32,
    pub muted: bool,
}

/// Read the first channel line of `amixer sget` output, e.g.
/// `Front Left: Playback 45000 [69%] [on]`.
pub fn parse_amixer(output: &str) -> Option<VolumeReading> {
    output.lines().find_map(|line| {
        let tags: Vec<&str> = line
            .split('[')
            .skip(1)
            .filter_map(|rest| rest.split(']').next())
            .collect();
        let percent = tags
            .iter()
            .find_map(|tag| tag.strip_suffix('%'))
            .and_then(|value| value.parse().ok())?;
        Some(VolumeReading {
            percent,
            muted: tags.contains(&"off"),
        })
    })
}

#[derive(Debug)]
pub struct VolumeBlock {
    control: String,
    cadence: Cadence,
    state: Mutex<VolumeState>,
}

#[derive(Debug)]
struct VolumeState {
    reading: Option<VolumeReading>,
    fader: Fader,
}

impl VolumeBlock {
    pub fn new(control: impl Into<String>, notify_only: bool, theme: &Theme) -> Self {
        let cadence = if notify_only {
            Cadence::notify_only(FRAME)
        } else {
            Cadence::animated(POLL, FRAME)
        };
        Self {
            control: control.into(),
            cadence,
            state: Mutex::new(VolumeState {
                reading: None,
                fader: Fader::new(FADE, theme.primary, theme.secondary),
            }),
        }
    }

    /// Record a reading, flashing if it differs from the previous one.
    pub fn apply(&self, reading: VolumeReading) {
        let mut state = lock(&self.state);
        if state.reading.is_some_and(|previous| previous != reading) {
            state.fader.trigger();
        }
        state.reading = Some(reading);
    }
}

impl Block for VolumeBlock {
    fn name(&self) -> &str {
        "volume"
    }

    fn update(&self) {
        let output = match run_command("amixer", &["sget", &self.control]) {
            Ok(output) => output,
            Err(err) => {
                tracing::debug!(error = %err, "volume probe failed");
                return;
            }
        };
        match parse_amixer(&output) {
            Some(reading) => self.apply(reading),
            None => tracing::debug!(control = %self.control, "no volume in amixer output"),
        }
    }

    fn content(&self) -> BlockContent {
        match lock(&self.state).reading {
            Some(reading) if reading.muted || reading.percent == 0 => BlockContent {
                icon: Some(MUTE_ICON),
                primary: "Muted".to_string(),
                ..BlockContent::default()
            },
            Some(reading) => BlockContent {
                icon: Some(ICONS[level_index(reading.percent, ICONS.len())]),
                primary: format!("{}%", reading.percent),
                ..BlockContent::default()
            },
            None => BlockContent::default(),
        }
    }

    fn colors(&self, theme: &Theme) -> Option<SegmentColors> {
        Some(lock(&self.state).fader.colors(theme))
    }

    fn animating(&self) -> bool {
        lock(&self.state).fader.is_fading()
    }

    fn start_broadcast(self: Arc<Self>, shutdown: broadcast::Receiver<()>) -> SignalStream {
        let cadence = self.cadence;
        poll(self, cadence, shutdown)
    }
}
