use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use muse_core::{SegmentColors, Theme};
use muse_format::{BlockContent, BlockView};
use tokio::sync::broadcast;

use crate::signal::SignalStream;

/// One independent piece of status-bar content.
///
/// Blocks are shared between their own scheduling loop, the renderer and
/// the command handler, so every method takes `&self` and state lives
/// behind a lock.
pub trait Block: Send + Sync + 'static {
    /// Stable identifier used by `notify <name>`.
    fn name(&self) -> &str;

    /// Refresh display state from the external collaborator. Blocking; a
    /// failed probe logs and keeps the previous state.
    fn update(&self);

    /// Snapshot of what the block currently shows.
    fn content(&self) -> BlockContent;

    /// `None` renders with the theme defaults.
    fn colors(&self, _theme: &Theme) -> Option<SegmentColors> {
        None
    }

    /// True while colors change without any new probe data (fades, pulses).
    fn animating(&self) -> bool {
        false
    }

    fn hidden(&self) -> bool {
        self.content().hidden
    }

    fn force_short(&self) -> bool {
        self.content().force_short
    }

    /// Start the block's own loop, if it has one, and return its signals.
    /// The loop ends when `shutdown` fires.
    fn start_broadcast(self: Arc<Self>, shutdown: broadcast::Receiver<()>) -> SignalStream;

    fn view(&self, theme: &Theme) -> BlockView {
        BlockView {
            name: self.name().to_string(),
            content: self.content(),
            colors: self.colors(theme),
        }
    }
}

/// Lock block state, ignoring poison: a panicked probe leaves the last
/// written state, which is still displayable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
