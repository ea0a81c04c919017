//! Host error types.

use std::path::PathBuf;
use thiserror::Error;

/// Host errors.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("core error: {0}")]
    Core(#[from] animstate_core::CoreError),

    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("invalid script: {0}")]
    Script(String),

    #[error("no machine definition configured (set machine.definition or ANIMSTATE_DEFINITION)")]
    MissingDefinition,
}

impl HostError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HostError::Io {
            path: path.into(),
            source,
        }
    }
}
