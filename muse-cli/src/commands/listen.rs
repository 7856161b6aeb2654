//! `muse-status listen`: act as a bar client.

use std::io::Write;

use anyhow::{Context as _, Result};

use muse_daemon::subscribe;

use super::Context;

pub fn run(context: &Context) -> Result<()> {
    let lines = subscribe(&context.socket).context("failed to connect to daemon")?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for line in lines {
        let line = line.context("lost connection to daemon")?;
        writeln!(out, "{line}").context("failed to write to stdout")?;
        out.flush().context("failed to write to stdout")?;
    }
    Ok(())
}
