//! In-memory [`ObjectStore`] for tests and dry runs.

use super::store::{CreateOutcome, ObjectStore, StoreError};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
    create_calls: Vec<(String, Option<String>)>,
    failing_keys: BTreeSet<String>,
    fail_create: bool,
    fail_list: bool,
}

/// Object store holding buckets and objects in memory.
///
/// Failures can be injected per key or for bucket operations.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock leaves the maps consistent
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds an existing bucket without recording a create call.
    pub fn with_bucket(self, bucket: &str) -> Self {
        self.lock().buckets.entry(bucket.to_string()).or_default();
        self
    }

    /// Makes every upload of `key` fail.
    pub fn fail_key(&self, key: &str) {
        self.lock().failing_keys.insert(key.to_string());
    }

    /// Stops failing uploads of `key`.
    pub fn heal_key(&self, key: &str) {
        self.lock().failing_keys.remove(key);
    }

    /// Makes bucket creation fail.
    pub fn fail_create(&self, fail: bool) {
        self.lock().fail_create = fail;
    }

    /// Makes bucket listing fail.
    pub fn fail_list(&self, fail: bool) {
        self.lock().fail_list = fail;
    }

    /// Bucket names.
    pub fn buckets(&self) -> Vec<String> {
        self.lock().buckets.keys().cloned().collect()
    }

    /// Every create call as `(bucket, location_constraint)`.
    pub fn create_calls(&self) -> Vec<(String, Option<String>)> {
        self.lock().create_calls.clone()
    }

    /// Object body, if present.
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock().buckets.get(bucket)?.get(key).cloned()
    }

    /// Object keys in a bucket.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_buckets(&self) -> Result<Vec<String>, StoreError> {
        let state = self.lock();
        if state.fail_list {
            return Err(StoreError::List("injected failure".to_string()));
        }
        Ok(state.buckets.keys().cloned().collect())
    }

    async fn create_bucket(
        &self,
        bucket: &str,
        location_constraint: Option<&str>,
    ) -> Result<CreateOutcome, StoreError> {
        let mut state = self.lock();
        state
            .create_calls
            .push((bucket.to_string(), location_constraint.map(str::to_string)));
        if state.fail_create {
            return Err(StoreError::Create {
                bucket: bucket.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        if state.buckets.contains_key(bucket) {
            return Ok(CreateOutcome::AlreadyOwned);
        }
        state.buckets.insert(bucket.to_string(), BTreeMap::new());
        Ok(CreateOutcome::Created)
    }

    async fn put_object(&self, bucket: &str, key: &str, source: &Path) -> Result<(), StoreError> {
        let put_error = |reason: String| StoreError::Put {
            key: key.to_string(),
            reason,
        };
        let body = tokio::fs::read(source)
            .await
            .map_err(|e| put_error(format!("{}: {e}", source.display())))?;

        let mut state = self.lock();
        if state.failing_keys.contains(key) {
            return Err(put_error("injected failure".to_string()));
        }
        let objects = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| put_error(format!("no such bucket {bucket}")))?;
        objects.insert(key.to_string(), body);
        Ok(())
    }
}
