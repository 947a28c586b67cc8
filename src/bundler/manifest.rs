//! Distributor manifest.
//!
//! The manifest ties every (display name, OS version, architecture) triple
//! to a bundle file name, and every bundle file name to its SHA-256:
//!
//! ```json
//! {
//!   "schemaVersion": "2.0",
//!   "publisher": "Uptycs.",
//!   "description": "...",
//!   "version": "5.7.0",
//!   "packages": {"Ubuntu": {"20.04": {"x64": {"file": "deb_amd64-5.7.0.zip"}}}},
//!   "files": {"deb_amd64-5.7.0.zip": {"checksums": {"sha256": "..."}}}
//! }
//! ```
//!
//! Field names and nesting are consumed by the fleet agent and must not
//! change. Maps are ordered so the same inputs always serialize to the same
//! bytes.

use crate::bundler::builder::checksum::Digest;
use crate::bundler::error::{Error, ErrorExt, Result};
use crate::bundler::settings::{BuildMatrix, PackageSettings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::Path;

/// File name of the manifest in the staging folder and the bucket.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Leaf of the packages tree.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PackageFile {
    /// Bundle file name
    pub file: String,
}

/// Checksums of one file.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Checksums {
    /// Lowercase hex SHA-256
    pub sha256: String,
}

/// Entry of the files map.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Digests of the file
    pub checksums: Checksums,
}

/// `packages[displayName][version][architecture] -> {file}`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageTree(BTreeMap<String, BTreeMap<String, BTreeMap<String, PackageFile>>>);

impl PackageTree {
    /// Inserts a leaf, creating intermediate levels on first use.
    ///
    /// Existing siblings are never touched. Inserting the same file for an
    /// existing triple is a no-op; a different file is a
    /// [`Error::ManifestConsistency`].
    pub fn insert(&mut self, name: &str, version: &str, arch: &str, file: &str) -> Result<()> {
        let arches = self
            .0
            .entry(name.to_string())
            .or_default()
            .entry(version.to_string())
            .or_default();

        match arches.entry(arch.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(PackageFile {
                    file: file.to_string(),
                });
                Ok(())
            }
            Entry::Occupied(existing) if existing.get().file == file => Ok(()),
            Entry::Occupied(existing) => Err(Error::ManifestConsistency(format!(
                "{name} {version} {arch} maps to both {} and {file}",
                existing.get().file
            ))),
        }
    }

    /// Looks up the bundle for a triple.
    pub fn get(&self, name: &str, version: &str, arch: &str) -> Option<&PackageFile> {
        self.0.get(name)?.get(version)?.get(arch)
    }

    /// Every referenced bundle file name (with repeats).
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.0
            .values()
            .flat_map(|versions| versions.values())
            .flat_map(|arches| arches.values())
            .map(|leaf| leaf.file.as_str())
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.files().count()
    }

    /// Whether the tree has no leaves.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The manifest document.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest schema version
    #[serde(rename = "schemaVersion")]
    pub schema_version: String,
    /// Publisher string
    pub publisher: String,
    /// Package description
    pub description: String,
    /// Release version
    pub version: String,
    /// Platform triples to bundle file names
    pub packages: PackageTree,
    /// Bundle file names to checksums
    pub files: BTreeMap<String, FileEntry>,
}

impl Manifest {
    /// Serializes to pretty JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Writes the manifest to `path`, replacing any previous file.
    pub async fn write(&self, path: &Path) -> Result<()> {
        let bytes = self.to_json()?;
        let tmp = path.with_extension("json.partial");
        tokio::fs::write(&tmp, &bytes)
            .await
            .fs_context("writing manifest", &tmp)?;
        tokio::fs::rename(&tmp, path)
            .await
            .fs_context("finalizing manifest", path)?;
        log::info!("Wrote manifest {}", path.display());
        Ok(())
    }
}

/// Builds a [`Manifest`] from the build matrix and bundle digests.
#[derive(Clone, Debug, Default)]
pub struct ManifestBuilder {
    package: PackageSettings,
}

impl ManifestBuilder {
    /// Creates a builder stamping the given package identity.
    pub fn new(package: PackageSettings) -> Self {
        Self { package }
    }

    /// Builds the manifest.
    ///
    /// Every descriptor contributes `packages[name][effectiveVersion][arch]`,
    /// every digest contributes one `files` entry.
    ///
    /// # Errors
    ///
    /// [`Error::ManifestConsistency`] if a referenced bundle has no digest,
    /// a digest is empty or repeated, or two descriptors map one triple to
    /// different bundles.
    pub fn build(
        &self,
        matrix: &BuildMatrix,
        version: &str,
        digests: &[Digest],
    ) -> Result<Manifest> {
        let mut packages = PackageTree::default();
        for (_, descriptor) in matrix.descriptors() {
            packages.insert(
                &descriptor.display_name,
                &descriptor.effective_version(),
                &descriptor.architecture,
                &descriptor.bundle_file_name(version),
            )?;
        }

        let mut files = BTreeMap::new();
        for digest in digests {
            if digest.sha256.is_empty() {
                return Err(Error::ManifestConsistency(format!(
                    "empty digest for {}",
                    digest.file_name
                )));
            }
            let entry = FileEntry {
                checksums: Checksums {
                    sha256: digest.sha256.clone(),
                },
            };
            if files.insert(digest.file_name.clone(), entry).is_some() {
                return Err(Error::ManifestConsistency(format!(
                    "{} digested more than once",
                    digest.file_name
                )));
            }
        }

        for file in packages.files() {
            if !files.contains_key(file) {
                return Err(Error::ManifestConsistency(format!(
                    "{file} is referenced by packages but has no digest"
                )));
            }
        }

        Ok(Manifest {
            schema_version: self.package.schema_version.clone(),
            publisher: self.package.publisher.clone(),
            description: self.package.description.clone(),
            version: version.to_string(),
            packages,
            files,
        })
    }
}
