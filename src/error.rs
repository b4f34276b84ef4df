//! breeder error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BreedError {
    /// a tunable is out of its legal range (rate < 2, min > max, ...)
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// an operation was called against state that cannot support it
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("i/o failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl BreedError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BreedError::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, BreedError>;
