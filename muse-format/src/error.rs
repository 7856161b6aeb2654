//! Error types for muse-format.

use thiserror::Error;

/// All errors that can arise while rendering a status line.
#[derive(Debug, Error)]
pub enum RenderError {
    /// JSON serialization error (i3bar mode).
    #[error("status serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
