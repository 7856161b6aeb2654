//! Media player state, following `playerctl --follow`.

use std::sync::{Arc, Mutex};

use muse_format::BlockContent;
use tokio::sync::broadcast;

use crate::block::{lock, Block};
use crate::probe::run_command;
use crate::schedule::{subscribe, EventSource};
use crate::signal::SignalStream;

pub(crate) const PLAYING_ICON: char = '\u{f387}';
pub(crate) const PAUSED_ICON: char = '\u{f3e4}';
const FORMAT: &str = "{{status}}\t{{title}}\t{{artist}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerStatus {
    Playing,
    Paused,
    #[default]
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Track {
    pub status: PlayerStatus,
    pub title: String,
    pub artist: String,
}

/// Icon, title and artist; hidden while stopped or untitled. Shared by the
/// media player blocks.
pub(crate) fn track_content(track: Track) -> BlockContent {
    let icon = match track.status {
        PlayerStatus::Playing => Some(PLAYING_ICON),
        PlayerStatus::Paused => Some(PAUSED_ICON),
        PlayerStatus::Stopped => None,
    };
    BlockContent {
        icon,
        hidden: track.status == PlayerStatus::Stopped || track.title.is_empty(),
        primary: track.title,
        secondary: track.artist,
        ..BlockContent::default()
    }
}

/// Parse one line of `playerctl metadata --format` output.
pub fn parse_track(line: &str) -> Track {
    let mut fields = line.trim_end_matches(['\r', '\n']).splitn(3, '\t');
    let status = match fields.next().map(str::trim) {
        Some("Playing") => PlayerStatus::Playing,
        Some("Paused") => PlayerStatus::Paused,
        _ => PlayerStatus::Stopped,
    };
    Track {
        status,
        title: fields.next().unwrap_or_default().trim().to_string(),
        artist: fields.next().unwrap_or_default().trim().to_string(),
    }
}

#[derive(Debug, Default)]
pub struct PlayerctlBlock {
    track: Mutex<Track>,
}

impl PlayerctlBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event line; true if the track changed.
    pub fn apply_line(&self, line: &str) -> bool {
        let track = parse_track(line);
        let mut current = lock(&self.track);
        if *current == track {
            return false;
        }
        *current = track;
        true
    }
}

impl Block for PlayerctlBlock {
    fn name(&self) -> &str {
        "playerctl"
    }

    fn update(&self) {
        // No player running is a non-zero exit; show nothing.
        let track = run_command("playerctl", &["metadata", "--format", FORMAT])
            .map(|output| parse_track(output.lines().next().unwrap_or_default()))
            .unwrap_or_default();
        *lock(&self.track) = track;
    }

    fn content(&self) -> BlockContent {
        track_content(lock(&self.track).clone())
    }

    fn start_broadcast(self: Arc<Self>, shutdown: broadcast::Receiver<()>) -> SignalStream {
        subscribe(
            self,
            EventSource::new("playerctl", &["--follow", "metadata", "--format", FORMAT]),
            shutdown,
            |block, line| block.apply_line(line),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_title_artist() {
        let track = parse_track("Playing\tSong 2\tBlur\n");
        assert_eq!(track.status, PlayerStatus::Playing);
        assert_eq!(track.title, "Song 2");
        assert_eq!(track.artist, "Blur");
    }

    #[test]
    fn missing_fields_are_empty() {
        let track = parse_track("Paused\tUntitled");
        assert_eq!(track.status, PlayerStatus::Paused);
        assert_eq!(track.artist, "");
    }

    #[test]
    fn hidden_when_stopped_or_untitled() {
        let block = PlayerctlBlock::new();
        assert!(block.apply_line("Stopped\tSong\tArtist"));
        assert!(block.hidden());

        assert!(block.apply_line("Playing\t\tArtist"));
        assert!(block.hidden());

        assert!(block.apply_line("Paused\tSong\tArtist"));
        assert!(!block.hidden());
        assert_eq!(block.content().icon, Some(PAUSED_ICON));
    }

    #[test]
    fn repeated_event_is_not_a_change() {
        let block = PlayerctlBlock::new();
        assert!(block.apply_line("Playing\tSong\tArtist"));
        assert!(!block.apply_line("Playing\tSong\tArtist"));
    }
}
