//! `muse-status daemon`: run the aggregator in the foreground.

use anyhow::{Context as _, Result};
use clap::Args;

use muse_core::{Color, FormatMode};
use muse_daemon::{start_blocking, DaemonOptions};

use super::Context;

#[derive(Args, Debug, Default)]
pub struct DaemonArgs {
    /// Output format: lemonbar or i3.
    #[arg(long)]
    pub mode: Option<FormatMode>,

    /// Primary color as RRGGBB or RRGGBBAA.
    #[arg(long)]
    pub primary_color: Option<Color>,

    /// Secondary color as RRGGBB or RRGGBBAA.
    #[arg(long)]
    pub secondary_color: Option<Color>,

    /// Font name used in i3 markup.
    #[arg(long)]
    pub font: Option<String>,

    /// Also print the stream to stdout.
    #[arg(long)]
    pub stdout: bool,
}

impl DaemonArgs {
    pub fn run(self, context: Context) -> Result<()> {
        let stdout = self.stdout;
        let options = DaemonOptions {
            config: self.apply(context.config),
            socket: context.socket,
            stdout,
        };
        start_blocking(options).context("daemon exited with error")
    }

    /// Flags override the file.
    fn apply(self, mut config: muse_core::StatusConfig) -> muse_core::StatusConfig {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(color) = self.primary_color {
            config.colors.primary = color;
        }
        if let Some(color) = self.secondary_color {
            config.colors.secondary = color;
        }
        if let Some(font) = self.font {
            config.font = font;
        }
        config
    }
}
