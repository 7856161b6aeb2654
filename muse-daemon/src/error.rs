use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the daemon runtime and its client protocol.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(#[from] muse_core::ConfigError),

    #[error("render error: {0}")]
    Render(#[from] muse_format::RenderError),

    #[error("task failed: {0}")]
    TaskJoin(String),

    #[error("daemon protocol error: {0}")]
    Protocol(String),

    #[error("daemon is not running (socket missing: {socket})")]
    DaemonNotRunning { socket: PathBuf },

    #[error("could not determine a directory for the daemon socket")]
    NoSocketDir,
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
