use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local};
use muse_format::BlockContent;
use tokio::sync::broadcast;

use crate::block::{lock, Block};
use crate::schedule::{poll, Cadence};
use crate::signal::SignalStream;

const ICON: char = '\u{f150}';
const TIME_FORMAT: &str = "%-I:%M %P";
const DATE_FORMAT: &str = "%a, %b %-d";

/// Clock and calendar. Polled every second; only minute changes signal.
#[derive(Debug)]
pub struct DateBlock {
    now: Mutex<DateTime<Local>>,
}

impl DateBlock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Local::now()),
        }
    }
}

impl Default for DateBlock {
    fn default() -> Self {
        Self::new()
    }
}

/// `("3:04 pm", "Mon, Jan 2")`
pub fn format_moment(moment: &DateTime<Local>) -> (String, String) {
    (
        moment.format(TIME_FORMAT).to_string(),
        moment.format(DATE_FORMAT).to_string(),
    )
}

impl Block for DateBlock {
    fn name(&self) -> &str {
        "date"
    }

    fn update(&self) {
        *lock(&self.now) = Local::now();
    }

    fn content(&self) -> BlockContent {
        let (primary, secondary) = format_moment(&lock(&self.now));
        BlockContent {
            icon: Some(ICON),
            primary,
            secondary,
            ..BlockContent::default()
        }
    }

    fn start_broadcast(self: Arc<Self>, shutdown: broadcast::Receiver<()>) -> SignalStream {
        poll(self, Cadence::every(Duration::from_secs(1)), shutdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_twelve_hour_time_and_short_date() {
        let moment = Local
            .with_ymd_and_hms(2006, 1, 2, 15, 4, 5)
            .single()
            .expect("unambiguous local time");
        let (time, date) = format_moment(&moment);
        assert_eq!(time, "3:04 pm");
        assert_eq!(date, "Mon, Jan 2");
    }

    #[test]
    fn never_hidden() {
        let block = DateBlock::new();
        block.update();
        assert!(!block.hidden());
        assert_eq!(block.content().icon, Some(ICON));
    }
}
