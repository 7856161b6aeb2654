//! Music Player Daemon state through `mpc`, woken by `mpc idleloop player`.
//!
//! `mpc -f FORMAT` prints the formatted song, then a state line such as
//! `[playing] #3/12   1:02/4:10 (24%)`, then the options line. A stopped
//! server prints only the options line.

use std::sync::{Arc, Mutex};

use muse_format::BlockContent;
use tokio::sync::broadcast;

use super::playerctl::{track_content, PlayerStatus, Track};
use crate::block::{lock, Block};
use crate::probe::run_command;
use crate::schedule::{subscribe, EventSource};
use crate::signal::SignalStream;

const FORMAT: &str = "[%title%|%file%]\n[%albumartist%|%artist%]";

pub fn parse_status(output: &str) -> Track {
    let lines: Vec<&str> = output.lines().collect();
    let [title, artist, state, ..] = lines.as_slice() else {
        return Track::default();
    };
    let status = match state.split_whitespace().next() {
        Some("[playing]") => PlayerStatus::Playing,
        Some("[paused]") => PlayerStatus::Paused,
        _ => return Track::default(),
    };
    Track {
        status,
        title: title.trim().to_string(),
        artist: artist.trim().to_string(),
    }
}

#[derive(Debug)]
pub struct MpdBlock {
    host: String,
    port: u16,
    track: Mutex<Track>,
}

impl MpdBlock {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            track: Mutex::default(),
        }
    }

    fn server_args(&self) -> [String; 2] {
        [format!("--host={}", self.host), format!("--port={}", self.port)]
    }

    /// Store the state `mpc` reported; true if the track changed.
    pub fn apply_status(&self, output: &str) -> bool {
        let track = parse_status(output);
        let mut current = lock(&self.track);
        if *current == track {
            return false;
        }
        *current = track;
        true
    }

    /// Query the server again; true if the track changed.
    fn refresh(&self) -> bool {
        let [host, port] = self.server_args();
        match run_command("mpc", &[&host, &port, "-f", FORMAT]) {
            Ok(output) => self.apply_status(&output),
            Err(err) => {
                tracing::debug!(error = %err, "mpd status probe failed");
                self.apply_status("")
            }
        }
    }
}

impl Block for MpdBlock {
    fn name(&self) -> &str {
        "mpd"
    }

    fn update(&self) {
        self.refresh();
    }

    fn content(&self) -> BlockContent {
        track_content(lock(&self.track).clone())
    }

    fn start_broadcast(self: Arc<Self>, shutdown: broadcast::Receiver<()>) -> SignalStream {
        let [host, port] = self.server_args();
        let source = EventSource::new("mpc", &[&host, &port, "idleloop", "player"]);
        subscribe(self, source, shutdown, |block, _event| block.refresh())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::playerctl::PAUSED_ICON;

    const PLAYING: &str = "Song 2\nBlur\n[playing] #3/12   1:02/2:02 (50%)\nvolume: 80%   repeat: off\n";

    #[test]
    fn parses_title_artist_and_state() {
        let track = parse_status(PLAYING);
        assert_eq!(track.status, PlayerStatus::Playing);
        assert_eq!(track.title, "Song 2");
        assert_eq!(track.artist, "Blur");
    }

    #[test]
    fn options_line_alone_means_stopped() {
        let track = parse_status("volume: 80%   repeat: off   random: off\n");
        assert_eq!(track, Track::default());
    }

    #[test]
    fn unknown_state_means_stopped() {
        let track = parse_status("Song\nArtist\nvolume: n/a\n");
        assert_eq!(track.status, PlayerStatus::Stopped);
    }

    #[test]
    fn shows_pause_and_hides_when_stopped() {
        let block = MpdBlock::new("localhost", 6600);
        assert!(block.hidden());

        assert!(block.apply_status("Song 2\nBlur\n[paused] #3/12   1:02/2:02 (50%)\n"));
        let content = block.content();
        assert!(!content.hidden);
        assert_eq!(content.icon, Some(PAUSED_ICON));
        assert_eq!(content.secondary, "Blur");

        assert!(!block.apply_status("Song 2\nBlur\n[paused] #3/12   1:02/2:02 (50%)\n"));
        assert!(block.apply_status(""));
        assert!(block.hidden());
    }

    #[test]
    fn server_address_is_passed_to_mpc() {
        let block = MpdBlock::new("music.lan", 6601);
        assert_eq!(block.server_args(), ["--host=music.lan", "--port=6601"]);
    }
}
