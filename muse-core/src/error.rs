//! Error types for muse-core.

use std::path::PathBuf;

use thiserror::Error;

/// A color string could not be normalized to RGBA.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("invalid color '{0}': expected RRGGBB or RRGGBBAA hex")]
    Invalid(String),
}

/// All errors that can arise while locating or loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure other than a missing file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// YAML serialization error (printing the effective config).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Color(#[from] ColorError),

    /// Neither `$XDG_CONFIG_HOME` nor `$HOME` could be resolved.
    #[error("cannot determine config directory; set $HOME or $XDG_CONFIG_HOME")]
    HomeNotFound,
}
