//! Error types for loading series and reference values.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, writing or validating global signals.
#[derive(Error, Debug)]
pub enum Error {
    /// File could not be read or written
    #[error("Failed to access file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The NIfTI decoder rejected the input
    #[error("Failed to decode NIfTI: {0}")]
    Decode(String),

    /// Array rank or extent unsuitable for the operation
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// Reference file contains a token that is not a number
    #[error("Invalid reference value '{token}' on line {line}")]
    Reference { line: usize, token: String },

    /// Encoding a NIfTI image failed
    #[error("Write failed: {0}")]
    Write(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;
