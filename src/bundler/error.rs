//! Error types for the packaging pipeline.
//!
//! Every stage maps its failures onto one variant of [`Error`]. Fatal stage
//! errors (`ConfigParse`, `Fetch`, `Archive`, `ManifestConsistency`) abort the
//! run; publish failures are collected per artifact and only become
//! [`Error::Publish`] when the caller asks for an all-or-nothing answer.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline error taxonomy
#[derive(Error, Debug)]
pub enum Error {
    /// Build matrix is malformed or missing a required OS key
    #[error("failed to parse build matrix {origin}: {reason}")]
    ConfigParse {
        /// Where the matrix was read from
        origin: String,
        /// What was wrong with it
        reason: String,
    },

    /// Download service failure or unusable response metadata
    #[error("{operation} failed for {target}: {reason}")]
    Fetch {
        /// Operation that failed (e.g. "package download")
        operation: String,
        /// Platform or endpoint the operation targeted
        target: String,
        /// Failure detail
        reason: String,
    },

    /// Working directory missing or unreadable
    #[error("failed to archive {working_directory}: {reason}")]
    Archive {
        /// Working directory being archived
        working_directory: String,
        /// Failure detail
        reason: String,
    },

    /// Manifest would not describe exactly the produced bundles
    #[error("manifest consistency violation: {0}")]
    ManifestConsistency(String),

    /// One or more artifacts did not reach the bucket
    #[error("publish to bucket {bucket} incomplete: {failed} of {total} artifact(s) failed")]
    Publish {
        /// Target bucket
        bucket: String,
        /// Number of failed artifacts
        failed: usize,
        /// Number of artifacts attempted
        total: usize,
    },

    /// I/O failure with the operation and path that caused it
    #[error("{context} {}: {error}", path.display())]
    Fs {
        /// What was being done
        context: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        error: std::io::Error,
    },

    /// Bare I/O failure
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Anything else
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// Shorthand for building a [`Error::Fetch`].
    pub fn fetch(
        operation: impl Into<String>,
        target: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::Fetch {
            operation: operation.into(),
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for building a [`Error::Archive`].
    pub fn archive(working_directory: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Archive {
            working_directory: working_directory.into(),
            reason: reason.to_string(),
        }
    }

    /// Stage name used when logging a fatal error.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ConfigParse { .. } => "load build matrix",
            Self::Fetch { .. } => "fetch",
            Self::Archive { .. } => "archive",
            Self::ManifestConsistency(_) => "build manifest",
            Self::Publish { .. } => "publish",
            Self::Fs { .. } | Self::IoError(_) | Self::Json(_) | Self::GenericError(_) => "io",
        }
    }
}

/// Returns early with an [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)))
    };
}

/// Attaches a message to a missing value or a foreign error.
pub trait Context<T> {
    /// Converts into a [`Result`], using `msg` as the error text.
    fn context(self, msg: &str) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(msg.to_string()))
    }
}

impl<T, E: std::fmt::Display> Context<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{msg}: {e}")))
    }
}

/// Extension for I/O results that records the operation and path.
pub trait ErrorExt<T> {
    /// Wraps an I/O error into [`Error::Fs`].
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::io::Result<T> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}
