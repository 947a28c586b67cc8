//! S3 implementation of [`ObjectStore`].

use super::store::{CreateOutcome, ObjectStore, StoreError};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use std::path::Path;
use std::time::Duration;

/// Object store backed by Amazon S3.
#[derive(Clone, Debug)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Builds a client for `region` from the standard AWS credential chain.
    ///
    /// Every operation is bounded by `timeout`.
    pub async fn connect(region: &str, timeout: Duration) -> Self {
        let timeouts = aws_config::timeout::TimeoutConfig::builder()
            .operation_timeout(timeout)
            .build();
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .timeout_config(timeouts)
            .load()
            .await;
        Self {
            client: Client::new(&config),
        }
    }

    /// Wraps an existing client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_buckets(&self) -> Result<Vec<String>, StoreError> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| StoreError::List(DisplayErrorContext(&e).to_string()))?;
        Ok(output
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_string))
            .collect())
    }

    async fn create_bucket(
        &self,
        bucket: &str,
        location_constraint: Option<&str>,
    ) -> Result<CreateOutcome, StoreError> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if let Some(region) = location_constraint {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(e) => {
                let already_owned = e
                    .as_service_error()
                    .is_some_and(|service| service.is_bucket_already_owned_by_you());
                if already_owned {
                    Ok(CreateOutcome::AlreadyOwned)
                } else {
                    Err(StoreError::Create {
                        bucket: bucket.to_string(),
                        reason: DisplayErrorContext(&e).to_string(),
                    })
                }
            }
        }
    }

    async fn put_object(&self, bucket: &str, key: &str, source: &Path) -> Result<(), StoreError> {
        let put_error = |reason: String| StoreError::Put {
            key: key.to_string(),
            reason,
        };
        let body = ByteStream::from_path(source)
            .await
            .map_err(|e| put_error(format!("{}: {e}", source.display())))?;
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| put_error(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }
}
