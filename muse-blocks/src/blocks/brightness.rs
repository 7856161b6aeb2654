//! Backlight level from sysfs, flashing on change.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use muse_core::{Colorer, Fader, SegmentColors, Theme};
use muse_format::BlockContent;
use tokio::sync::broadcast;

use crate::block::{lock, Block};
use crate::error::BlockError;
use crate::probe::{level_index, read_int};
use crate::schedule::{poll, Cadence};
use crate::signal::SignalStream;

pub const BACKLIGHT_ROOT: &str = "/sys/class/backlight";

const ICONS: [char; 6] = [
    '\u{f5da}', '\u{f5db}', '\u{f5dc}', '\u{f5dd}', '\u{f5de}', '\u{f5df}',
];
const FADE: Duration = Duration::from_secs(3);
const POLL: Duration = Duration::from_millis(100);
const FRAME: Duration = Duration::from_nanos(1_000_000_000 / 15);

#[derive(Debug)]
pub struct BrightnessBlock {
    dir: PathBuf,
    max: i64,
    cadence: Cadence,
    state: Mutex<BrightnessState>,
}

#[derive(Debug)]
struct BrightnessState {
    current: Option<i64>,
    fader: Fader,
}

impl BrightnessBlock {
    pub fn new(card: &str, notify_only: bool, theme: &Theme) -> Result<Self, BlockError> {
        Self::with_root(Path::new(BACKLIGHT_ROOT), card, notify_only, theme)
    }

    /// Like [`BrightnessBlock::new`] with the backlight class directory at
    /// `root`.
    pub fn with_root(
        root: &Path,
        card: &str,
        notify_only: bool,
        theme: &Theme,
    ) -> Result<Self, BlockError> {
        let dir = root.join(card);
        if !dir.is_dir() {
            return Err(BlockError::MissingPath { path: dir });
        }
        let max = read_int(&dir.join("max_brightness"))?;
        if max <= 0 {
            return Err(BlockError::Parse {
                what: "max brightness",
                input: max.to_string(),
            });
        }

        let cadence = if notify_only {
            Cadence::notify_only(FRAME)
        } else {
            Cadence::animated(POLL, FRAME)
        };

        Ok(Self {
            dir,
            max,
            cadence,
            state: Mutex::new(BrightnessState {
                current: None,
                fader: Fader::new(FADE, theme.primary, theme.secondary),
            }),
        })
    }

    pub fn percent(&self) -> Option<u32> {
        lock(&self.state)
            .current
            .map(|current| (current.max(0) * 100 / self.max) as u32)
    }
}

impl Block for BrightnessBlock {
    fn name(&self) -> &str {
        "brightness"
    }

    fn update(&self) {
        let current = match read_int(&self.dir.join("brightness")) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(error = %err, "brightness probe failed");
                return;
            }
        };

        let mut state = lock(&self.state);
        if state.current.is_some_and(|previous| previous != current) {
            state.fader.trigger();
        }
        state.current = Some(current);
    }

    fn content(&self) -> BlockContent {
        match self.percent() {
            Some(percent) => BlockContent {
                icon: Some(ICONS[level_index(percent, ICONS.len())]),
                primary: format!("{percent}%"),
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
