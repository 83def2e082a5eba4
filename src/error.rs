use std::{io, path::PathBuf};

use thiserror::Error;

/**
    Errors that may occur while collecting the dependencies of a script.
*/
#[derive(Debug, Error)]
pub enum DependencyError {
    #[error("failed to parse '{}' at line {line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to enumerate package directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("failed to query interpreter layout: {0}")]
    Layout(String),
    #[error("invalid config file '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl DependencyError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /**
        Returns `true` if this error was caused by a script that could not be parsed.
    */
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

pub type DependencyResult<T, E = DependencyError> = std::result::Result<T, E>;
