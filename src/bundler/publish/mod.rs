//! Publishing bundles and the manifest to a bucket.
//!
//! Publishing runs in three steps: an existence check, a conditional
//! creation, and one upload per artifact. Upload failures are recorded per
//! artifact instead of aborting the remaining uploads; the caller inspects
//! the [`PublishResult`] to find out whether the published set is complete.
//!
//! # Module Organization
//!
//! - [`store`] - The [`ObjectStore`] seam and its error type
//! - [`s3`] - Amazon S3 implementation
//! - [`memory`] - In-memory implementation

pub mod memory;
pub mod s3;
pub mod store;

pub use memory::MemoryStore;
pub use s3::S3Store;
pub use store::{CreateOutcome, DEFAULT_REGION, ObjectStore, StoreError, location_constraint};

use crate::bundler::error::{Error, Result};
use crate::bundler::utils::retry::RetryPolicy;
use std::path::PathBuf;

/// Bucket receiving the release.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublishTarget {
    /// Bucket name
    pub bucket: String,
    /// Region the bucket lives in
    pub region: String,
}

/// One local file to upload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Artifact {
    /// File name, used for the object key
    pub file_name: String,
    /// Local path
    pub local_path: PathBuf,
}

/// What happened to the bucket before uploading.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BucketStatus {
    /// Found in the bucket listing; creation skipped
    Existing,
    /// Created by this run
    Created,
    /// Creation reported the bucket as already owned by the caller
    AlreadyOwned,
    /// Neither found nor created; no uploads were attempted
    Unavailable(String),
}

/// Per-artifact publish status.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UploadStatus {
    /// Uploaded (overwriting any previous object)
    Uploaded,
    /// Upload attempted and failed
    Failed(String),
    /// Not attempted
    Skipped(String),
}

/// Publish status of one artifact.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArtifactOutcome {
    /// File name of the artifact
    pub file_name: String,
    /// Object key it was (or would have been) uploaded to
    pub key: String,
    /// What happened
    pub status: UploadStatus,
}

impl ArtifactOutcome {
    /// Whether the artifact reached the bucket.
    pub fn is_uploaded(&self) -> bool {
        matches!(self.status, UploadStatus::Uploaded)
    }
}

/// Result of a publish run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublishResult {
    /// Target bucket
    pub bucket: String,
    /// Bucket existence outcome
    pub bucket_status: BucketStatus,
    /// One outcome per artifact, in upload order
    pub artifacts: Vec<ArtifactOutcome>,
}

impl PublishResult {
    /// Whether every artifact reached the bucket.
    pub fn is_complete(&self) -> bool {
        self.artifacts.iter().all(ArtifactOutcome::is_uploaded)
    }

    /// Artifacts that did not reach the bucket.
    pub fn failures(&self) -> impl Iterator<Item = &ArtifactOutcome> {
        self.artifacts.iter().filter(|a| !a.is_uploaded())
    }

    /// Converts an incomplete publish into [`Error::Publish`].
    pub fn into_result(self) -> Result<Self> {
        let failed = self.failures().count();
        if failed == 0 {
            Ok(self)
        } else {
            Err(Error::Publish {
                bucket: self.bucket,
                failed,
                total: self.artifacts.len(),
            })
        }
    }
}

/// Uploads bundles and the manifest to a bucket.
pub struct BucketPublisher<'s> {
    store: &'s dyn ObjectStore,
    prefix: String,
    retry: RetryPolicy,
}

impl<'s> BucketPublisher<'s> {
    /// Creates a publisher writing under `prefix/`.
    pub fn new(store: &'s dyn ObjectStore, prefix: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            retry,
        }
    }

    /// Object key for a file name.
    pub fn object_key(&self, file_name: &str) -> String {
        let prefix = self.prefix.trim_end_matches('/');
        if prefix.is_empty() {
            file_name.to_string()
        } else {
            format!("{prefix}/{file_name}")
        }
    }

    /// Makes sure the bucket exists, creating it if needed.
    ///
    /// A listing failure falls through to creation; creation treats an
    /// already-owned bucket as success.
    pub async fn ensure_bucket(&self, target: &PublishTarget) -> BucketStatus {
        match self.store.list_buckets().await {
            Ok(names) if names.iter().any(|name| name == &target.bucket) => {
                log::info!("Bucket {} already exists, skipping creation", target.bucket);
                return BucketStatus::Existing;
            }
            Ok(_) => {}
            Err(e) => log::error!("Error listing buckets: {}", e),
        }

        log::info!("Creating bucket {} in {}", target.bucket, target.region);
        let constraint = location_constraint(&target.region);
        let created = self
            .retry
            .run(&format!("create bucket {}", target.bucket), || {
                self.store.create_bucket(&target.bucket, constraint)
            })
            .await;

        match created {
            Ok(CreateOutcome::Created) => BucketStatus::Created,
            Ok(CreateOutcome::AlreadyOwned) => BucketStatus::AlreadyOwned,
            Err(e) => {
                log::error!("Error creating bucket {}: {}", target.bucket, e);
                BucketStatus::Unavailable(e.to_string())
            }
        }
    }

    /// Publishes `bundles` followed by `manifest`.
    ///
    /// The manifest is only uploaded when every bundle was; otherwise it is
    /// recorded as skipped so the bucket never holds a manifest pointing at a
    /// missing bundle.
    pub async fn publish(
        &self,
        target: &PublishTarget,
        bundles: &[Artifact],
        manifest: &Artifact,
    ) -> PublishResult {
        let bucket_status = self.ensure_bucket(target).await;
        let mut artifacts = Vec::with_capacity(bundles.len() + 1);

        if let BucketStatus::Unavailable(reason) = &bucket_status {
            for artifact in bundles.iter().chain(std::iter::once(manifest)) {
                artifacts.push(ArtifactOutcome {
                    file_name: artifact.file_name.clone(),
                    key: self.object_key(&artifact.file_name),
                    status: UploadStatus::Skipped(format!("bucket unavailable: {reason}")),
                });
            }
            return PublishResult {
                bucket: target.bucket.clone(),
                bucket_status,
                artifacts,
            };
        }

        for bundle in bundles {
            artifacts.push(self.upload(&target.bucket, bundle).await);
        }

        let bundles_complete = artifacts.iter().all(ArtifactOutcome::is_uploaded);
        if bundles_complete {
            artifacts.push(self.upload(&target.bucket, manifest).await);
        } else {
            log::warn!("Not uploading {} because bundle uploads failed", manifest.file_name);
            artifacts.push(ArtifactOutcome {
                file_name: manifest.file_name.clone(),
                key: self.object_key(&manifest.file_name),
                status: UploadStatus::Skipped("bundle uploads failed".to_string()),
            });
        }

        PublishResult {
            bucket: target.bucket.clone(),
            bucket_status,
            artifacts,
        }
    }

    async fn upload(&self, bucket: &str, artifact: &Artifact) -> ArtifactOutcome {
        let key = self.object_key(&artifact.file_name);
        let started = std::time::Instant::now();
        log::info!("Uploading {} to s3://{}/{}", artifact.local_path.display(), bucket, key);

        let outcome = self
            .retry
            .run(&format!("upload {key}"), || {
                self.store.put_object(bucket, &key, &artifact.local_path)
            })
            .await;

        let status = match outcome {
            Ok(()) => {
                log::info!("Uploaded {} in {:.2?}", key, started.elapsed());
                UploadStatus::Uploaded
            }
            Err(e) => {
                log::error!("Upload error for {}: {}", key, e);
                UploadStatus::Failed(e.to_string())
            }
        };

        ArtifactOutcome {
            file_name: artifact.file_name.clone(),
            key,
            status,
        }
    }
}
