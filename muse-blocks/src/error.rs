use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced while constructing or probing a block.
///
/// Construction errors reach the daemon, which omits the block. Probe
/// errors stay inside `update()`.
#[derive(Debug, Error)]
pub enum BlockError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("required path does not exist: {path}")]
    MissingPath { path: PathBuf },

    #[error("could not parse {what} from {input:?}")]
    Parse { what: &'static str, input: String },

    #[error("`{program}` failed: {reason}")]
    Command { program: String, reason: String },

    #[error("request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("missing setting `{0}`")]
    MissingSetting(&'static str),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> BlockError {
    BlockError::Io {
        path: path.into(),
        source,
    }
}
