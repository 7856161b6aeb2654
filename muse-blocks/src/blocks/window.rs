use std::sync::{Arc, Mutex};
use std::time::Duration;

use muse_format::BlockContent;
use tokio::sync::broadcast;

use crate::block::{lock, Block};
use crate::probe::{greeting, run_command};
use crate::schedule::{poll, Cadence};
use crate::signal::SignalStream;

const POLL: Duration = Duration::from_millis(100);

/// Title of the focused X window, or a greeting when there is none.
///
/// Without `rapidfire` the block only refreshes on `notify window`; the
/// daemon also refreshes it after every workspace change.
#[derive(Debug, Default)]
pub struct WindowBlock {
    rapidfire: bool,
    title: Mutex<String>,
}

impl WindowBlock {
    pub fn new(rapidfire: bool) -> Self {
        if rapidfire {
            tracing::warn!("window rapidfire polls xdotool every 100ms; expect extra CPU load");
        }
        Self {
            rapidfire,
            title: Mutex::default(),
        }
    }

    pub fn rapidfire(&self) -> bool {
        self.rapidfire
    }
}

/// Strip line breaks; an empty title or the bare window-manager name
/// counts as no window.
pub fn clean_title(raw: &str) -> Option<String> {
    let title: String = raw.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    let title = title.trim();
    if title.is_empty() || title == "i3" {
        None
    } else {
        Some(title.to_string())
    }
}

impl Block for WindowBlock {
    fn name(&self) -> &str {
        "window"
    }

    fn update(&self) {
        let title = match run_command("xdotool", &["getwindowfocus", "getwindowname"]) {
            Ok(raw) => clean_title(&raw),
            Err(err) => {
                tracing::debug!(error = %err, "window title probe failed");
                None
            }
        };
        *lock(&self.title) = title.unwrap_or_else(|| greeting().to_string());
    }

    fn content(&self) -> BlockContent {
        BlockContent {
            secondary: lock(&self.title).clone(),
            ..BlockContent::default()
        }
    }

    fn start_broadcast(self: Arc<Self>, shutdown: broadcast::Receiver<()>) -> SignalStream {
        if self.rapidfire {
            poll(self, Cadence::every(POLL), shutdown)
        } else {
            SignalStream::idle()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("vim - notes.md\n", Some("vim - notes.md"))]
    #[case("two\r\nlines\n", Some("twolines"))]
    #[case("i3\n", None)]
    #[case("   \n", None)]
    fn titles(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(clean_title(raw).as_deref(), expected);
    }

    #[tokio::test]
    async fn waits_for_notify_without_rapidfire() {
        let (_tx, rx) = broadcast::channel(1);
        let block = Arc::new(WindowBlock::new(false));
        assert!(!block.rapidfire());
        let mut signals = block.start_broadcast(rx);
        assert!(signals.recv().await.is_none());
    }
}
