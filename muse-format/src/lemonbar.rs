//! Bar-markup renderer.
//!
//! ```text
//! %{l}<left>%{c}<center>%{r}<right>
//! ```
//!
//! Segments are wrapped in `%{F#AARRGGBB}…%{F-}`; click actions in
//! `%{A:<command>:}…%{A}`.

use muse_core::{Color, Theme};

use crate::view::{BlockView, Run};

/// Between two visible blocks of the same zone.
pub const BLOCK_SEPARATOR: &str = "    ";
/// Between icon, primary and secondary text of one block.
pub const SEGMENT_SEPARATOR: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn directive(&self) -> &'static str {
        match self {
            Alignment::Left => "%{l}",
            Alignment::Center => "%{c}",
            Alignment::Right => "%{r}",
        }
    }
}

pub fn color_wrap(text: &str, color: Color) -> String {
    format!("%{{F#{}}}{}%{{F-}}", color.argb_hex(), text)
}

/// Make `text` run `command` when clicked. Colons end the command in
/// lemonbar syntax, so they are escaped.
pub fn action_wrap(text: &str, command: &str) -> String {
    format!("%{{A:{}:}}{}%{{A}}", command.replace(':', "\\:"), text)
}

/// One block's markup, or the empty string if it is hidden.
pub fn render_block(view: &BlockView, theme: &Theme) -> String {
    let content = &view.content;
    if content.hidden {
        return String::new();
    }

    let body = if content.runs.is_empty() {
        let colors = view.segment_colors(theme);
        let mut segments = Vec::with_capacity(3);
        if let Some(icon) = content.icon {
            segments.push(color_wrap(&icon.to_string(), colors.icon));
        }
        let primary = content.primary.trim();
        if !primary.is_empty() {
            segments.push(color_wrap(primary, colors.primary));
        }
        let secondary = content.secondary.trim();
        if !secondary.is_empty() {
            segments.push(color_wrap(secondary, colors.secondary));
        }
        segments.join(SEGMENT_SEPARATOR)
    } else {
        render_runs(&content.runs, theme)
    };

    match &content.action {
        Some(command) if !body.is_empty() => action_wrap(&body, command),
        _ => body,
    }
}

fn render_runs(runs: &[Run], theme: &Theme) -> String {
    runs.iter()
        .filter(|run| !run.text.is_empty())
        .map(|run| {
            let colored = color_wrap(&run.text, run.emphasis.color(theme));
            match &run.action {
                Some(command) => action_wrap(&colored, command),
                None => colored,
            }
        })
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// Join the visible blocks of one zone; hidden blocks leave no separator.
pub fn chain<'a>(views: impl IntoIterator<Item = &'a BlockView>, theme: &Theme) -> String {
    views
        .into_iter()
        .map(|view| render_block(view, theme))
        .filter(|rendered| !rendered.is_empty())
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// The full line. An empty zone contributes nothing, not even its directive.
pub fn render_zones(
    left: &[BlockView],
    center: &[BlockView],
    right: &[BlockView],
    theme: &Theme,
) -> String {
    let mut line = String::new();
    for (alignment, views) in [
        (Alignment::Left, left),
        (Alignment::Center, center),
        (Alignment::Right, right),
    ] {
        let zone = chain(views, theme);
        if !zone.is_empty() {
            line.push_str(alignment.directive());
            line.push_str(&zone);
        }
    }
    line
}
