//! i3 workspaces and binding mode, following `i3-msg -t subscribe -m`.
//!
//! Workspace events carry `current`/`old` and trigger a fresh
//! `get_workspaces` query; mode events carry the mode name in `change`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use muse_format::{BlockContent, Emphasis, Run};
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::block::{lock, Block};
use crate::error::BlockError;
use crate::probe::run_command;
use crate::schedule::{subscribe, EventSource};
use crate::signal::SignalStream;

/// Redraw rate for urgent workspaces and an active mode.
const PULSE_FRAME: Duration = Duration::from_millis(100);
const DEFAULT_MODE: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Workspace {
    pub name: String,
    #[serde(default)]
    pub focused: bool,
    #[serde(default)]
    pub urgent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I3Event {
    Workspace,
    /// The new binding mode; `None` for the default mode.
    Mode(Option<String>),
}

/// Classify one subscription line. The `{"success":true}` acknowledgement
/// and anything unparseable yield `None`.
pub fn parse_event(line: &str) -> Option<I3Event> {
    let value: serde_json::Value = serde_json::from_str(line.trim()).ok()?;
    let event = value.as_object()?;
    if event.contains_key("current") || event.contains_key("old") {
        return Some(I3Event::Workspace);
    }
    if event.contains_key("pango_markup") {
        let mode = event.get("change")?.as_str()?;
        return Some(I3Event::Mode((mode != DEFAULT_MODE).then(|| mode.to_string())));
    }
    None
}

pub fn parse_workspaces(json: &str) -> Result<Vec<Workspace>, BlockError> {
    serde_json::from_str(json).map_err(|_| BlockError::Parse {
        what: "i3 workspaces",
        input: json.trim().to_string(),
    })
}

pub fn switch_command(name: &str) -> String {
    format!("i3-msg workspace '{name}'")
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct I3State {
    workspaces: Vec<Workspace>,
    mode: Option<String>,
}

#[derive(Debug, Default)]
pub struct I3Block {
    state: Mutex<I3State>,
}

impl I3Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_workspaces(&self, workspaces: Vec<Workspace>) -> bool {
        let mut state = lock(&self.state);
        if state.workspaces == workspaces {
            return false;
        }
        state.workspaces = workspaces;
        true
    }

    /// Apply one subscription line; true if the visible output changed.
    pub fn apply_event(&self, line: &str) -> bool {
        match parse_event(line) {
            Some(I3Event::Workspace) => match query_workspaces() {
                Ok(workspaces) => self.set_workspaces(workspaces),
                Err(err) => {
                    tracing::debug!(error = %err, "i3 workspace query failed");
                    false
                }
            },
            Some(I3Event::Mode(mode)) => {
                let mut state = lock(&self.state);
                if state.mode == mode {
                    return false;
                }
                state.mode = mode;
                true
            }
            None => false,
        }
    }

    fn follow(
        self: Arc<Self>,
        source: EventSource,
        shutdown: broadcast::Receiver<()>,
    ) -> SignalStream {
        subscribe(
            self,
            source.with_frames(PULSE_FRAME),
            shutdown,
            |block, line| block.apply_event(line),
        )
    }
}

fn query_workspaces() -> Result<Vec<Workspace>, BlockError> {
    parse_workspaces(&run_command("i3-msg", &["-t", "get_workspaces"])?)
}

impl Block for I3Block {
    fn name(&self) -> &str {
        "i3"
    }

    fn update(&self) {
        match query_workspaces() {
            Ok(workspaces) => {
                self.set_workspaces(workspaces);
            }
            Err(err) => tracing::debug!(error = %err, "i3 workspace query failed"),
        }
    }

    fn content(&self) -> BlockContent {
        let state = lock(&self.state);
        let mut runs = Vec::new();
        // A single workspace is not worth a list.
        if state.workspaces.len() > 1 {
            runs.extend(state.workspaces.iter().map(|workspace| {
                let emphasis = if workspace.urgent {
                    Emphasis::Warning
                } else if workspace.focused {
                    Emphasis::Primary
                } else {
                    Emphasis::Secondary
                };
                Run {
                    text: workspace.name.clone(),
                    emphasis,
                    action: Some(switch_command(&workspace.name)),
                }
            }));
        }
        if let Some(mode) = &state.mode {
            runs.push(Run {
                text: mode.clone(),
                emphasis: Emphasis::Warning,
                action: None,
            });
        }

        BlockContent {
            hidden: runs.is_empty(),
            runs,
            ..BlockContent::default()
        }
    }

    /// Urgent workspaces and a non-default mode pulse.
    fn animating(&self) -> bool {
        let state = lock(&self.state);
        state.mode.is_some() || state.workspaces.iter().any(|workspace| workspace.urgent)
    }

    fn start_broadcast(self: Arc<Self>, shutdown: broadcast::Receiver<()>) -> SignalStream {
        self.follow(
            EventSource::new("i3-msg", &["-t", "subscribe", "-m", r#"["workspace","mode"]"#]),
            shutdown,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const WORKSPACES: &str = r#"[
        {"num":1,"name":"1: web","visible":true,"focused":true,"urgent":false,"output":"eDP-1"},
        {"num":2,"name":"2","visible":false,"focused":false,"urgent":false,"output":"eDP-1"},
        {"num":3,"name":"3: chat","visible":false,"focused":false,"urgent":true,"output":"eDP-1"}
    ]"#;

    #[rstest]
    #[case(r#"{"change":"focus","current":{"name":"2"},"old":{"name":"1"}}"#, Some(I3Event::Workspace))]
    #[case(r#"{"change":"resize","pango_markup":false}"#, Some(I3Event::Mode(Some("resize".to_string()))))]
    #[case(r#"{"change":"default","pango_markup":false}"#, Some(I3Event::Mode(None)))]
    #[case(r#"{"success":true}"#, None)]
    #[case("not json", None)]
    fn events(#[case] line: &str, #[case] expected: Option<I3Event>) {
        assert_eq!(parse_event(line), expected);
    }

    #[test]
    fn workspaces_become_colored_runs() {
        let block = I3Block::new();
        assert!(block.set_workspaces(parse_workspaces(WORKSPACES).expect("parse")));
        let runs = block.content().runs;
        let summary: Vec<_> = runs.iter().map(|run| (run.text.as_str(), run.emphasis)).collect();
        assert_eq!(
            summary,
            [
                ("1: web", Emphasis::Primary),
                ("2", Emphasis::Secondary),
                ("3: chat", Emphasis::Warning),
            ]
        );
        assert_eq!(runs[0].action.as_deref(), Some("i3-msg workspace '1: web'"));
        assert!(block.animating());
    }

    #[test]
    fn single_workspace_is_hidden() {
        let block = I3Block::new();
        block.set_workspaces(vec![Workspace {
            name: "1".to_string(),
            focused: true,
            urgent: false,
        }]);
        assert!(block.hidden());
        assert!(!block.animating());
    }

    #[test]
    fn mode_is_appended_until_default() {
        let block = I3Block::new();
        assert!(block.apply_event(r#"{"change":"resize","pango_markup":false}"#));
        let content = block.content();
        assert!(!content.hidden);
        assert_eq!(content.runs.len(), 1);
        assert_eq!(content.runs[0].text, "resize");
        assert_eq!(content.runs[0].emphasis, Emphasis::Warning);
        assert!(block.animating());

        assert!(!block.apply_event(r#"{"change":"resize","pango_markup":false}"#));
        assert!(block.apply_event(r#"{"change":"default","pango_markup":false}"#));
        assert!(block.hidden());
        assert!(!block.animating());
    }

    #[tokio::test]
    async fn active_mode_keeps_redrawing_between_events() {
        let block = Arc::new(I3Block::new());
        let (shutdown_tx, _) = broadcast::channel(1);
        let mut signals = Arc::clone(&block).follow(
            EventSource::new(
                "sh",
                &["-c", r#"echo '{"change":"resize","pango_markup":false}'; sleep 30"#],
            ),
            shutdown_tx.subscribe(),
        );

        for _ in 0..4 {
            tokio::time::timeout(Duration::from_secs(5), signals.recv())
                .await
                .expect("event or frame")
                .expect("stream open");
        }

        let _ = shutdown_tx.send(());
    }
}
