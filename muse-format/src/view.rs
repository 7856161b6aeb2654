//! The data contract between blocks and the renderers.

use muse_core::{Colorer, SegmentColors, Theme, Tone};

/// Everything a block shows, minus colors. Blocks compare successive
/// snapshots of this to decide whether to signal a re-render.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockContent {
    pub icon: Option<char>,
    pub primary: String,
    pub secondary: String,
    pub hidden: bool,
    /// Show only icon + primary even where there is room for more.
    pub force_short: bool,
    /// Pre-segmented output (workspace lists). When non-empty it replaces
    /// icon/primary/secondary.
    pub runs: Vec<Run>,
    /// Shell command run when the block is clicked (bar markup only).
    pub action: Option<String>,
}

/// One independently colored piece of a segmented block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub emphasis: Emphasis,
    pub action: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emphasis {
    Primary,
    Secondary,
    Warning,
}

impl Emphasis {
    pub fn color(&self, theme: &Theme) -> muse_core::Color {
        match self {
            Emphasis::Primary => theme.primary,
            Emphasis::Secondary => theme.secondary,
            Emphasis::Warning => Tone::Warning.colors(theme).primary,
        }
    }
}

/// A named snapshot of one block, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockView {
    pub name: String,
    pub content: BlockContent,
    /// `None` renders with the theme defaults.
    pub colors: Option<SegmentColors>,
}

impl BlockView {
    pub fn new(name: impl Into<String>, content: BlockContent) -> Self {
        Self {
            name: name.into(),
            content,
            colors: None,
        }
    }

    pub fn with_colors(mut self, colors: SegmentColors) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn segment_colors(&self, theme: &Theme) -> SegmentColors {
        self.colors
            .unwrap_or_else(|| SegmentColors::defaults(theme))
    }
}

/// Views for the three zones, each in rendering order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ZoneViews {
    pub left: Vec<BlockView>,
    pub center: Vec<BlockView>,
    pub right: Vec<BlockView>,
}

impl ZoneViews {
    /// Left, then center, then right.
    pub fn iter(&self) -> impl Iterator<Item = &BlockView> {
        self.left.iter().chain(&self.center).chain(&self.right)
    }
}
