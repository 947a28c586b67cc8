//! Package build-and-publish pipeline.
//!
//! Stages, leaf first:
//!
//! - [`settings`] - Build matrix and run settings
//! - [`fetch`] - Binary downloads and install script rewriting
//! - [`archive`] - One zip bundle per working directory
//! - [`builder`] - Digests and the [`Packager`] orchestrator
//! - [`manifest`] - Manifest construction
//! - [`publish`] - Bucket creation and uploads

pub mod archive;
pub mod builder;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod publish;
pub mod settings;
pub mod utils;

pub use archive::{Bundle, bundle_file_name};
pub use builder::{Digest, Packager, StagedRelease, calculate_sha256};
pub use error::{Error, Result};
pub use fetch::{ApiSession, BinaryFetcher, DownloadClient};
pub use manifest::{MANIFEST_FILE_NAME, Manifest, ManifestBuilder, PackageTree};
pub use publish::{
    Artifact, ArtifactOutcome, BucketPublisher, BucketStatus, MemoryStore, ObjectStore,
    PublishResult, PublishTarget, S3Store, UploadStatus,
};
pub use settings::{
    Arch, BuildMatrix, PackageSettings, PlatformDescriptor, Settings, SettingsBuilder,
};
pub use utils::retry::RetryPolicy;
