//! `muse-status notify <block>`: push an immediate refresh.

use anyhow::{Context as _, Result};
use clap::Args;

use muse_daemon::{send_command, Command, DaemonError};

use super::Context;

#[derive(Args, Debug)]
pub struct NotifyArgs {
    /// Block name, e.g. `volume` or `brightness`.
    pub block: String,
}

impl NotifyArgs {
    pub fn run(self, context: &Context) -> Result<()> {
        match send_command(&context.socket, &Command::Notify(self.block)) {
            Ok(()) => Ok(()),
            Err(DaemonError::DaemonNotRunning { .. }) => {
                println!("daemon is not running");
                Ok(())
            }
            Err(err) => Err(err).context("failed to notify daemon"),
        }
    }
}
