//! Error types for the MRIQC to NIDM conversion library.
//!
//! Every fallible operation in the crate returns [`NidmError`]. Callers at the
//! file and subject level downgrade these into logged, boolean outcomes; only
//! the run controller turns them into a process exit status.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the conversion library.
#[derive(Debug, Error)]
pub enum NidmError {
    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Failed to scan {path}: {message}")]
    Discovery { path: PathBuf, message: String },

    // Serialization errors
    #[error("CSV error: {message}")]
    Csv {
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    // Record errors
    #[error("Malformed metric record {path}: {reason}")]
    MalformedRecord { path: PathBuf, reason: String },

    #[error("Cannot derive source URL from {path}: {reason}")]
    SourceUrl { path: PathBuf, reason: String },

    // Subject errors
    #[error("Subject directory not found: {0}")]
    SubjectNotFound(PathBuf),

    #[error("No subjects found to process")]
    NoSubjects,

    // Converter errors
    #[error("Failed to launch {program}: {message}")]
    ConverterLaunch { program: String, message: String },

    #[error("{program} failed: {message}")]
    ConverterFailed { program: String, message: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, NidmError>;

impl From<std::io::Error> for NidmError {
    fn from(err: std::io::Error) -> Self {
        NidmError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<csv::Error> for NidmError {
    fn from(err: csv::Error) -> Self {
        NidmError::Csv {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl NidmError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        NidmError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }
}

/// Extension trait attaching a path to IO results.
pub trait IoResultExt<T> {
    /// Map an IO error into [`NidmError::Io`] carrying `path`.
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| NidmError::io_with_path(e, path))
    }
}
