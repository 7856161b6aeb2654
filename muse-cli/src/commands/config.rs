//! `muse-status config`: show what the daemon would run with.

use anyhow::{Context as _, Result};

use muse_core::config::to_yaml;

use super::Context;

pub fn run(context: &Context) -> Result<()> {
    let yaml = to_yaml(&context.config).context("failed to render config as YAML")?;
    println!("# config: {}", context.config_path.display());
    println!("# socket: {}", context.socket.display());
    print!("{yaml}");
    Ok(())
}
