//! Multi-platform distributor package builder.
//!
//! This library builds versioned bundles of agent installers for every
//! platform in a build matrix, describes them in a checksummed manifest and
//! publishes bundles plus manifest to an object store bucket.
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;

// Re-export commonly used types
pub use error::{CliError, PackagerError, Result};
