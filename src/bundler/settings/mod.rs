//! Configuration structures for a pipeline run.
//!
//! This module provides the declarative build matrix, the run settings and
//! the builder used to construct them.

mod arch;
mod builder;
mod core;
pub mod matrix;
mod package;

// Re-export all public types
pub use arch::Arch;
pub use builder::{
    DEFAULT_OBJECT_PREFIX, DEFAULT_REQUEST_TIMEOUT, DEFAULT_STAGING_DIR, SettingsBuilder,
};
pub use core::Settings;
pub use matrix::{BuildMatrix, DEFAULT_OS_FAMILIES, PlatformDescriptor};
pub use package::PackageSettings;
