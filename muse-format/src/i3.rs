//! i3bar JSON stream renderer.
//!
//! ```text
//! {"version":1}
//! [
//! [{"name":"date","full_text":"…","short_text":"…","markup":"pango","separator":true}]
//! ,[…]
//! ```

use muse_core::{Color, FormatMode, Theme};
use serde::Serialize;

use crate::error::RenderError;
use crate::lemonbar::SEGMENT_SEPARATOR;
use crate::view::{BlockView, Run};

pub const HEADER: &str = r#"{"version":1}"#;

/// One element of a status array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct I3Block {
    pub name: String,
    pub full_text: String,
    pub short_text: String,
    pub markup: &'static str,
    pub separator: bool,
}

/// Escape text for embedding in pango markup. Quotes are left to the JSON
/// serializer.
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// `<span color="#RRGGBBAA" font="…">text</span>`; the font attribute is
/// omitted when no font is configured.
pub fn span(text: &str, color: Color, font: &str) -> String {
    let font_attr = if font.is_empty() {
        String::new()
    } else {
        format!(r#" font="{}""#, escape_markup(font))
    };
    format!(
        r##"<span color="#{}"{}>{}</span>"##,
        color.rgba_hex(),
        font_attr,
        escape_markup(text)
    )
}

fn join_nonempty(pieces: impl IntoIterator<Item = String>) -> String {
    pieces
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(SEGMENT_SEPARATOR)
}

/// Icon + primary.
pub fn short_text(view: &BlockView, theme: &Theme) -> String {
    let content = &view.content;
    if !content.runs.is_empty() {
        return render_runs(&content.runs, theme);
    }

    let colors = view.segment_colors(theme);
    let icon = content
        .icon
        .map(|icon| span(&icon.to_string(), colors.icon, &theme.font))
        .unwrap_or_default();
    let primary = content.primary.trim();
    let primary = if primary.is_empty() {
        String::new()
    } else {
        span(primary, colors.primary, &theme.font)
    };
    join_nonempty([icon, primary])
}

/// Icon + primary + secondary, or the short text when `force_short` is set.
pub fn full_text(view: &BlockView, theme: &Theme) -> String {
    let short = short_text(view, theme);
    let content = &view.content;
    if content.force_short || !content.runs.is_empty() {
        return short;
    }

    let secondary = content.secondary.trim();
    if secondary.is_empty() {
        return short;
    }
    let colors = view.segment_colors(theme);
    join_nonempty([short, span(secondary, colors.secondary, &theme.font)])
}

fn render_runs(runs: &[Run], theme: &Theme) -> String {
    join_nonempty(
        runs.iter()
            .filter(|run| !run.text.is_empty())
            .map(|run| span(&run.text, run.emphasis.color(theme), &theme.font)),
    )
}

/// `None` for hidden blocks.
pub fn render_block(view: &BlockView, theme: &Theme) -> Option<I3Block> {
    if view.content.hidden {
        return None;
    }
    Some(I3Block {
        name: view.name.clone(),
        full_text: full_text(view, theme),
        short_text: short_text(view, theme),
        markup: "pango",
        separator: true,
    })
}

/// A JSON array of every visible block, in order.
pub fn render_array<'a>(
    views: impl IntoIterator<Item = &'a BlockView>,
    theme: &Theme,
) -> Result<String, RenderError> {
    let blocks: Vec<I3Block> = views
        .into_iter()
        .filter_map(|view| render_block(view, theme))
        .collect();
    Ok(serde_json::to_string(&blocks)?)
}

/// Per-stream framing. Lemonbar lines pass through; i3bar streams get the
/// header once and a comma before every array except the first.
#[derive(Debug, Clone)]
pub struct StreamFramer {
    mode: FormatMode,
    started: bool,
}

impl StreamFramer {
    pub fn new(mode: FormatMode) -> Self {
        Self {
            mode,
            started: false,
        }
    }

    /// The exact bytes to write for `line`, including the trailing newline.
    pub fn frame(&mut self, line: &str) -> String {
        let first = !self.started;
        self.started = true;
        match self.mode {
            FormatMode::Lemonbar => format!("{line}\n"),
            FormatMode::I3 if first => format!("{HEADER}\n[\n{line}\n"),
            FormatMode::I3 => format!(",{line}\n"),
        }
    }

    pub fn started(&self) -> bool {
        self.started
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::BlockContent;

    fn theme() -> Theme {
        Theme {
            mode: FormatMode::I3,
            ..Theme::default()
        }
    }

    #[test]
    fn span_omits_empty_font() {
        let c = Color::rgba(0xff, 0xaa, 0x00, 0xff);
        assert_eq!(span("x", c, ""), r##"<span color="#ffaa00ff">x</span>"##);
        assert_eq!(
            span("x", c, "Iosevka 11"),
            r##"<span color="#ffaa00ff" font="Iosevka 11">x</span>"##
        );
    }

    #[test]
    fn framer_prefixes_comma_after_first() {
        let mut framer = StreamFramer::new(FormatMode::I3);
        assert_eq!(framer.frame("[]"), "{\"version\":1}\n[\n[]\n");
        assert_eq!(framer.frame("[]"), ",[]\n");
        assert_eq!(framer.frame("[]"), ",[]\n");
    }

    #[test]
    fn lemonbar_framer_passes_lines_through() {
        let mut framer = StreamFramer::new(FormatMode::Lemonbar);
        assert_eq!(framer.frame("%{c}x"), "%{c}x\n");
        assert_eq!(framer.frame("%{c}y"), "%{c}y\n");
    }

    #[test]
    fn secondary_only_in_full_text() {
        let view = BlockView::new(
            "network",
            BlockContent {
                icon: Some('W'),
                primary: "home".to_string(),
                secondary: "connected".to_string(),
                ..BlockContent::default()
            },
        );
        let block = render_block(&view, &theme()).expect("visible");
        assert!(block.full_text.contains("connected"));
        assert!(!block.short_text.contains("connected"));
        assert!(block.full_text.starts_with(&block.short_text));
    }
}
