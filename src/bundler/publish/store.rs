//! Object store abstraction.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Region whose buckets are created without a location constraint.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Failure reported by an object store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Listing buckets failed
    #[error("listing buckets failed: {0}")]
    List(String),
    /// Creating the bucket failed
    #[error("creating bucket {bucket} failed: {reason}")]
    Create {
        /// Bucket name
        bucket: String,
        /// Failure detail
        reason: String,
    },
    /// Uploading an object failed
    #[error("uploading {key} failed: {reason}")]
    Put {
        /// Object key
        key: String,
        /// Failure detail
        reason: String,
    },
}

/// Outcome of a bucket creation request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CreateOutcome {
    /// The bucket was created by this call
    Created,
    /// The bucket already existed and is owned by the caller
    AlreadyOwned,
}

/// Minimal object store surface the publisher needs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Names of all buckets visible to the caller.
    async fn list_buckets(&self) -> Result<Vec<String>, StoreError>;

    /// Creates `bucket`, passing `location_constraint` when given.
    async fn create_bucket(
        &self,
        bucket: &str,
        location_constraint: Option<&str>,
    ) -> Result<CreateOutcome, StoreError>;

    /// Uploads the file at `source` to `bucket/key`, replacing any existing
    /// object.
    async fn put_object(&self, bucket: &str, key: &str, source: &Path) -> Result<(), StoreError>;
}

/// Location constraint for a region: none for the provider's default region.
pub fn location_constraint(region: &str) -> Option<&str> {
    if region == DEFAULT_REGION {
        None
    } else {
        Some(region)
    }
}
