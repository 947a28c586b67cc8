//! Core Settings struct and implementations.

use super::PackageSettings;
use crate::bundler::utils::retry::RetryPolicy;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for one pipeline run.
///
/// Constructed via [`SettingsBuilder`](super::SettingsBuilder).
///
/// # Examples
///
/// ```
/// use distributor_packager::bundler::SettingsBuilder;
///
/// # fn example() -> distributor_packager::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .version("5.7.0")
///     .work_root(".")
///     .staging_dir("../s3-bucket")
///     .build()?;
/// assert_eq!(settings.object_prefix(), "uptycs");
/// assert!(settings.download());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Settings {
    /// Release version stamped on bundles and the manifest.
    version: String,

    /// Package identity written into the manifest header.
    package: PackageSettings,

    /// Directory containing the per-platform working directories.
    work_root: PathBuf,

    /// Local folder receiving bundles and `manifest.json`.
    staging_dir: PathBuf,

    /// Object-key prefix in the bucket.
    object_prefix: String,

    /// Whether binaries are fetched from the download service.
    ///
    /// When false the operator has staged them manually.
    download: bool,

    /// Whether the richer install profile (protection component) is requested.
    include_protection: bool,

    /// Deadline for each network call.
    request_timeout: Duration,

    /// Retry policy for idempotent network calls.
    retry: RetryPolicy,
}

impl Settings {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        version: String,
        package: PackageSettings,
        work_root: PathBuf,
        staging_dir: PathBuf,
        object_prefix: String,
        download: bool,
        include_protection: bool,
        request_timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            version,
            package,
            work_root,
            staging_dir,
            object_prefix,
            download,
            include_protection,
            request_timeout,
            retry,
        }
    }

    /// Returns the release version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the manifest header fields.
    pub fn package(&self) -> &PackageSettings {
        &self.package
    }

    /// Returns the directory holding the working directories.
    pub fn work_root(&self) -> &Path {
        &self.work_root
    }

    /// Returns the path of one working directory.
    pub fn working_dir(&self, name: &str) -> PathBuf {
        self.work_root.join(name)
    }

    /// Returns the local staging folder.
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Returns the local path of the manifest file.
    pub fn manifest_path(&self) -> PathBuf {
        self.staging_dir.join(crate::bundler::manifest::MANIFEST_FILE_NAME)
    }

    /// Returns the object-key prefix.
    pub fn object_prefix(&self) -> &str {
        &self.object_prefix
    }

    /// Whether binaries are fetched from the download service.
    pub fn download(&self) -> bool {
        self.download
    }

    /// Whether the protection component is requested.
    pub fn include_protection(&self) -> bool {
        self.include_protection
    }

    /// Returns the per-request deadline.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the retry policy.
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }
}
