//! Top-level error types for the packager binary.
//!
//! This module wraps pipeline errors together with CLI errors and maps them
//! onto process exit codes.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, PackagerError>;

/// Exit code for a run whose publish step left artifacts behind.
pub const EXIT_PUBLISH_INCOMPLETE: i32 = 2;

/// Main error type for all packager operations
#[derive(Error, Debug)]
pub enum PackagerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Pipeline errors
    #[error("{0}")]
    Bundler(#[from] crate::bundler::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Missing required argument
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },
}

impl PackagerError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Bundler(crate::bundler::Error::Publish { .. }) => EXIT_PUBLISH_INCOMPLETE,
            _ => 1,
        }
    }

    /// Operation name for log lines.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Cli(_) => "parse arguments",
            Self::Io(_) | Self::Json(_) => "io",
            Self::Bundler(e) => e.stage(),
        }
    }
}
