use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a monitor run.
///
/// Everything upstream of persistence degrades to defaults instead; only a
/// run with an unusable config, or one that cannot take its lock or write
/// its results, ends up here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    #[error("failed to open lock file {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
