//! Bundle digest calculation.
//!
//! This module provides SHA-256 digests for bundles. Files are streamed in
//! 8KB chunks, which yields the same value as hashing the whole file at once.

use crate::bundler::{
    archive::Bundle,
    error::{ErrorExt, Result},
};
use sha2::{Digest as _, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Content digest of one bundle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Digest {
    /// Bundle file name, as referenced by the manifest
    pub file_name: String,
    /// Lowercase hex SHA-256 (64 characters)
    pub sha256: String,
}

/// Calculates the SHA-256 of a single file.
///
/// # Arguments
///
/// * `file_path` - Path to a fully written, closed file
///
/// # Returns
///
/// * `Ok(String)` - Lowercase hex-encoded SHA-256 hash
/// * `Err` - If the file cannot be read
pub async fn calculate_sha256(file_path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(file_path)
        .await
        .fs_context("opening file for hashing", file_path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hash calculation", file_path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Digests every bundle, in the order given.
///
/// Bundles returned by the archiver are already renamed from their partial
/// file, so their writers have been closed.
pub async fn digest_bundles(bundles: &[Bundle]) -> Result<Vec<Digest>> {
    let mut digests = Vec::with_capacity(bundles.len());
    for bundle in bundles {
        let sha256 = calculate_sha256(&bundle.local_path).await?;
        log::debug!("sha256 {} {}", sha256, bundle.file_name);
        digests.push(Digest {
            file_name: bundle.file_name.clone(),
            sha256,
        });
    }
    Ok(digests)
}
