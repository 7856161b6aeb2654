//! # muse-format
//!
//! Pure renderers turning block display state into one of the two wire
//! formats: bar markup (`%{l}…%{c}…%{r}…`) or the i3bar JSON stream.
//!
//! ## Usage
//!
//! ```rust
//! use muse_core::Theme;
//! use muse_format::{render_line, BlockContent, BlockView, ZoneViews};
//!
//! let theme = Theme::default();
//! let date = BlockView::new(
//!     "date",
//!     BlockContent {
//!         primary: "3:04 pm".to_string(),
//!         secondary: "Mon, Jan 2".to_string(),
//!         ..BlockContent::default()
//!     },
//! );
//! let zones = ZoneViews { center: vec![date], ..ZoneViews::default() };
//! let line = render_line(&zones, &theme).expect("render");
//! assert!(line.starts_with("%{c}"));
//! ```

pub mod error;
pub mod i3;
pub mod lemonbar;
pub mod view;

pub use error::RenderError;
pub use i3::StreamFramer;
pub use view::{BlockContent, BlockView, Emphasis, Run, ZoneViews};

use muse_core::{FormatMode, Theme};

/// Render all three zones in the theme's wire format. The result is one
/// status line without framing (see [`StreamFramer`]).
pub fn render_line(zones: &ZoneViews, theme: &Theme) -> Result<String, RenderError> {
    match theme.mode {
        FormatMode::Lemonbar => Ok(lemonbar::render_zones(
            &zones.left,
            &zones.center,
            &zones.right,
            theme,
        )),
        FormatMode::I3 => i3::render_array(zones.iter(), theme),
    }
}
