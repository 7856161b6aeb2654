pub mod config;
pub mod daemon;
pub mod listen;
pub mod notify;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use muse_core::config::{config_path, load_at};
use muse_core::StatusConfig;
use muse_daemon::paths::socket_path;

/// Config and socket location shared by every subcommand.
#[derive(Debug)]
pub struct Context {
    pub config_path: PathBuf,
    pub config: StatusConfig,
    pub socket: PathBuf,
}

impl Context {
    /// `--socket` wins over the config file's `socket`, which wins over the
    /// default location.
    pub fn resolve(config_flag: Option<PathBuf>, socket_flag: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_flag {
            Some(path) => path,
            None => config_path().context("could not determine config directory")?,
        };
        let config = load_at(&config_path)
            .with_context(|| format!("failed to load config {}", config_path.display()))?;
        let socket = match socket_flag {
            Some(path) => path,
            None => socket_path(config.socket.as_deref())
                .context("could not determine daemon socket location")?,
        };
        Ok(Self {
            config_path,
            config,
            socket,
        })
    }
}
