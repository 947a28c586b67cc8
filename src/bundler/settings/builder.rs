//! Builder for constructing Settings.

use super::{PackageSettings, Settings};
use crate::bundler::utils::retry::RetryPolicy;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default object-key prefix in the bucket.
pub const DEFAULT_OBJECT_PREFIX: &str = "uptycs";

/// Default local staging folder.
pub const DEFAULT_STAGING_DIR: &str = "../s3-bucket";

/// Default per-request deadline.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Builder for constructing [`Settings`].
///
/// Only the version is required; everything else has a default matching the
/// conventional repository layout.
#[derive(Default)]
pub struct SettingsBuilder {
    version: Option<String>,
    package: Option<PackageSettings>,
    work_root: Option<PathBuf>,
    staging_dir: Option<PathBuf>,
    object_prefix: Option<String>,
    download: Option<bool>,
    include_protection: Option<bool>,
    request_timeout: Option<Duration>,
    retry: Option<RetryPolicy>,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the release version.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the manifest header fields.
    ///
    /// Default: [`PackageSettings::default`]
    pub fn package_settings(mut self, package: PackageSettings) -> Self {
        self.package = Some(package);
        self
    }

    /// Sets the directory holding the working directories.
    ///
    /// Default: current directory
    pub fn work_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.work_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the local staging folder.
    ///
    /// Default: [`DEFAULT_STAGING_DIR`]
    pub fn staging_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.staging_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the object-key prefix.
    ///
    /// Default: [`DEFAULT_OBJECT_PREFIX`]
    pub fn object_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.object_prefix = Some(prefix.into());
        self
    }

    /// Enables or disables the download stage.
    ///
    /// Default: true
    pub fn download(mut self, download: bool) -> Self {
        self.download = Some(download);
        self
    }

    /// Requests the protection component in downloads.
    ///
    /// Default: true
    pub fn include_protection(mut self, include: bool) -> Self {
        self.include_protection = Some(include);
        self
    }

    /// Sets the per-request deadline.
    ///
    /// Default: [`DEFAULT_REQUEST_TIMEOUT`]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the retry policy for network calls.
    ///
    /// Default: [`RetryPolicy::default`]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the version is missing, empty, or could escape
    /// the bundle file name (path separators or `..`).
    pub fn build(self) -> crate::bundler::Result<Settings> {
        use crate::bundler::error::Context;

        let version = self.version.context("version is required")?;
        if version.trim().is_empty() {
            crate::bail!("version must not be empty");
        }
        if version.contains('/') || version.contains('\\') || version.contains("..") {
            crate::bail!("version '{}' must not contain path separators or '..'", version);
        }

        Ok(Settings::new(
            version,
            self.package.unwrap_or_default(),
            self.work_root.unwrap_or_else(|| PathBuf::from(".")),
            self.staging_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STAGING_DIR)),
            self.object_prefix
                .unwrap_or_else(|| DEFAULT_OBJECT_PREFIX.to_string()),
            self.download.unwrap_or(true),
            self.include_protection.unwrap_or(true),
            self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            self.retry.unwrap_or_default(),
        ))
    }
}
