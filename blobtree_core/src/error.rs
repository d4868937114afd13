//! Error types for blobtree_core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using blobtree_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during tree and blob operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred during file operations.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// A required argument was missing or unusable.
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Positional access beyond the end of a sequence.
    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Lookup by name found nothing.
    #[error("Key not found: {key}")]
    KeyNotFound { key: String },

    /// The operation is not valid in the current state.
    #[error("Invalid operation: {reason}")]
    InvalidOperation { reason: String },

    /// A node or blob name cannot be used as a file name.
    #[error("Illegal file name: {name:?}")]
    IllegalFileName { name: String },

    /// File or directory to read from does not exist.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },
}

impl Error {
    /// Create an InvalidArgument error.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create an IndexOutOfRange error.
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Error::IndexOutOfRange { index, len }
    }

    /// Create a KeyNotFound error.
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Error::KeyNotFound { key: key.into() }
    }

    /// Create an InvalidOperation error.
    pub fn invalid_operation(reason: impl Into<String>) -> Self {
        Error::InvalidOperation {
            reason: reason.into(),
        }
    }

    /// Create an IllegalFileName error.
    pub fn illegal_file_name(name: impl Into<String>) -> Self {
        Error::IllegalFileName { name: name.into() }
    }

    /// Create a NotFound error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Error::NotFound { path: path.into() }
    }
}

// Additional From implementations for external error types

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io { source: err.error }
    }
}

impl From<ignore::Error> for Error {
    fn from(err: ignore::Error) -> Self {
        // ignore::Error can wrap an io::Error or be a path error
        match err.io_error() {
            Some(io_err) => Error::Io {
                source: std::io::Error::new(io_err.kind(), io_err.to_string()),
            },
            None => Error::Io {
                source: std::io::Error::other(err.to_string()),
            },
        }
    }
}
