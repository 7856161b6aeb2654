//! bspwm desktops, following `bspc subscribe report`.
//!
//! A report looks like `WMeDP-1:Oone:otwo:fthree:ufour:LT:TT:G`: a `W`
//! prefix, then `:`-separated items whose first character is a flag.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use muse_format::{BlockContent, Emphasis, Run};
use tokio::sync::broadcast;

use crate::block::{lock, Block};
use crate::probe::run_command;
use crate::schedule::{subscribe, EventSource};
use crate::signal::SignalStream;

/// Redraw rate for the urgent pulse.
const URGENT_FRAME: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesktopState {
    Active,
    Occupied,
    Urgent,
    Free,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Desktop {
    pub name: String,
    pub state: DesktopState,
}

pub fn parse_report(report: &str) -> Vec<Desktop> {
    let report = report.trim();
    let Some(body) = report.strip_prefix('W') else {
        return Vec::new();
    };

    body.split(':')
        .filter_map(|item| {
            let mut chars = item.chars();
            let state = match chars.next()? {
                'O' | 'F' | 'U' => DesktopState::Active,
                'o' => DesktopState::Occupied,
                'u' => DesktopState::Urgent,
                'f' => DesktopState::Free,
                // monitors, layout, state and flags
                _ => return None,
            };
            Some(Desktop {
                name: chars.as_str().to_string(),
                state,
            })
        })
        .collect()
}

pub fn focus_command(name: &str) -> String {
    format!("bspc desktop -f '^{name}'")
}

#[derive(Debug, Default)]
pub struct BspwmBlock {
    desktops: Mutex<Vec<Desktop>>,
}

impl BspwmBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_report(&self, report: &str) -> bool {
        let desktops = parse_report(report);
        let mut current = lock(&self.desktops);
        if *current == desktops {
            return false;
        }
        *current = desktops;
        true
    }

    /// Follow `source` for reports, redrawing while a desktop is urgent.
    fn follow(
        self: Arc<Self>,
        source: EventSource,
        shutdown: broadcast::Receiver<()>,
    ) -> SignalStream {
        subscribe(
            self,
            source.with_frames(URGENT_FRAME),
            shutdown,
            |block, line| block.apply_report(line),
        )
    }
}

impl Block for BspwmBlock {
    fn name(&self) -> &str {
        "bspwm"
    }

    fn update(&self) {
        match run_command("bspc", &["wm", "--get-status"]) {
            Ok(report) => {
                self.apply_report(&report);
            }
            Err(err) => tracing::debug!(error = %err, "bspwm status probe failed"),
        }
    }

    fn content(&self) -> BlockContent {
        let runs: Vec<Run> = lock(&self.desktops)
            .iter()
            .filter_map(|desktop| {
                let emphasis = match desktop.state {
                    DesktopState::Active => Emphasis::Primary,
                    DesktopState::Occupied => Emphasis::Secondary,
                    DesktopState::Urgent => Emphasis::Warning,
                    DesktopState::Free => return None,
                };
                Some(Run {
                    text: desktop.name.clone(),
                    emphasis,
                    action: Some(focus_command(&desktop.name)),
                })
            })
            .collect();

        BlockContent {
            hidden: runs.is_empty(),
            runs,
            ..BlockContent::default()
        }
    }

    /// Urgent desktops pulse.
    fn animating(&self) -> bool {
        lock(&self.desktops)
            .iter()
            .any(|desktop| desktop.state == DesktopState::Urgent)
    }

    fn start_broadcast(self: Arc<Self>, shutdown: broadcast::Receiver<()>) -> SignalStream {
        self.follow(EventSource::new("bspc", &["subscribe", "report"]), shutdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_desktops_and_skips_other_items() {
        let desktops = parse_report("WMeDP-1:Oone:otwo:fthree:ufour:LT:TT:G\n");
        let summary: Vec<_> = desktops
            .iter()
            .map(|d| (d.name.as_str(), d.state))
            .collect();
        assert_eq!(
            summary,
            [
                ("one", DesktopState::Active),
                ("two", DesktopState::Occupied),
                ("three", DesktopState::Free),
                ("four", DesktopState::Urgent),
            ]
        );
    }

    #[test]
    fn names_may_contain_monitor_letters() {
        let desktops = parse_report("WmHDMI-1:Ohome:omusic:mDP-2:Fmail");
        let names: Vec<_> = desktops.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["home", "music", "mail"]);
    }

    #[test]
    fn free_desktops_are_not_shown() {
        let block = BspwmBlock::new();
        assert!(block.apply_report("WMeDP-1:O1:f2:u3"));
        let runs = block.content().runs;
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].emphasis, Emphasis::Primary);
        assert_eq!(runs[1].emphasis, Emphasis::Warning);
        assert_eq!(runs[1].action.as_deref(), Some("bspc desktop -f '^3'"));
    }

    #[test]
    fn animates_only_while_a_desktop_is_urgent() {
        let block = BspwmBlock::new();
        assert!(block.apply_report("WMeDP-1:O1:u2"));
        assert!(block.animating());
        assert!(block.apply_report("WMeDP-1:O1:o2"));
        assert!(!block.animating());
    }

    #[tokio::test]
    async fn urgent_desktop_keeps_redrawing_between_reports() {
        let block = Arc::new(BspwmBlock::new());
        let (shutdown_tx, _) = broadcast::channel(1);
        let mut signals = Arc::clone(&block).follow(
            EventSource::new("sh", &["-c", "echo WMeDP-1:O1:u2; sleep 30"]),
            shutdown_tx.subscribe(),
        );

        // The report itself, then pulse frames with no further reports.
        for _ in 0..4 {
            tokio::time::timeout(Duration::from_secs(5), signals.recv())
                .await
                .expect("report or frame")
                .expect("stream open");
        }
        assert!(block.animating());

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn calm_report_does_not_redraw() {
        let block = Arc::new(BspwmBlock::new());
        let (shutdown_tx, _) = broadcast::channel(1);
        let mut signals = Arc::clone(&block).follow(
            EventSource::new("sh", &["-c", "echo WMeDP-1:O1:o2; sleep 30"]),
            shutdown_tx.subscribe(),
        );

        tokio::time::timeout(Duration::from_secs(5), signals.recv())
            .await
            .expect("report")
            .expect("stream open");
        let quiet = tokio::time::timeout(Duration::from_millis(400), signals.recv()).await;
        assert!(quiet.is_err());

        let _ = shutdown_tx.send(());
    }

    #[test]
    fn non_report_lines_hide_the_block() {
        let block = BspwmBlock::new();
        assert!(!block.apply_report("garbage"));
        assert!(block.hidden());
    }
}
