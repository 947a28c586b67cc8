//! Declarative build matrix.
//!
//! The matrix is a JSON document keyed by OS family. Each value is an ordered
//! list of platform descriptors:
//!
//! ```json
//! {
//!   "linux": [
//!     {"dir": "deb_amd64", "arch_type": "x64", "name": "Ubuntu",
//!      "major_version": "20", "minor_version": "04", "upt_package": "ubuntu"}
//!   ],
//!   "windows": []
//! }
//! ```
//!
//! Several descriptors may share a `dir`: one staged directory can serve
//! several OS versions. Consumers deduplicate by directory name.

use super::arch::Arch;
use crate::bundler::error::{Error, ErrorExt, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// OS families every build matrix must contain, in processing order.
pub const DEFAULT_OS_FAMILIES: &[&str] = &["windows", "linux"];

/// One row of the build matrix.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlatformDescriptor {
    /// Local directory the platform's files are staged in
    #[serde(rename = "dir")]
    pub working_directory: String,

    /// Architecture label, reproduced verbatim in the manifest
    #[serde(rename = "arch_type")]
    pub architecture: String,

    /// Display name of the OS (e.g. "Ubuntu")
    #[serde(rename = "name")]
    pub display_name: String,

    /// Major OS version
    pub major_version: String,

    /// Minor OS version, empty when the platform has none
    #[serde(default)]
    pub minor_version: String,

    /// Platform identifier understood by the download service
    #[serde(rename = "upt_package", default)]
    pub download_identifier: String,
}

impl PlatformDescriptor {
    /// `major` alone, or `major.minor` when a minor version is present.
    pub fn effective_version(&self) -> String {
        if self.minor_version.is_empty() {
            self.major_version.clone()
        } else {
            format!("{}.{}", self.major_version, self.minor_version)
        }
    }

    /// Classified architecture.
    pub fn arch(&self) -> Arch {
        Arch::from_arch_type(&self.architecture)
    }

    /// Deterministic bundle file name for this descriptor's directory.
    pub fn bundle_file_name(&self, version: &str) -> String {
        crate::bundler::archive::bundle_file_name(&self.working_directory, version)
    }
}

/// Build matrix: OS family to ordered platform descriptors.
///
/// Read-only once loaded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BuildMatrix {
    families: Vec<(String, Vec<PlatformDescriptor>)>,
}

impl BuildMatrix {
    /// Loads a matrix file requiring [`DEFAULT_OS_FAMILIES`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).fs_context("reading build matrix", path)?;
        Self::from_json(&text, &path.display().to_string(), DEFAULT_OS_FAMILIES)
    }

    /// Parses a matrix document, requiring every family in `required`.
    ///
    /// Families are kept in the order of `required`; keys not listed there
    /// are ignored with a warning.
    pub fn from_json(text: &str, origin: &str, required: &[&str]) -> Result<Self> {
        let parse_error = |reason: String| Error::ConfigParse {
            origin: origin.to_string(),
            reason,
        };

        let mut document: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(text).map_err(|e| parse_error(e.to_string()))?;

        let mut families = Vec::with_capacity(required.len());
        for family in required {
            let value = document
                .remove(*family)
                .ok_or_else(|| parse_error(format!("missing required OS key '{family}'")))?;
            let descriptors: Vec<PlatformDescriptor> = serde_json::from_value(value)
                .map_err(|e| parse_error(format!("invalid descriptors for '{family}': {e}")))?;

            for (index, descriptor) in descriptors.iter().enumerate() {
                validate_descriptor(descriptor)
                    .map_err(|reason| parse_error(format!("{family}[{index}]: {reason}")))?;
            }

            families.push((family.to_string(), descriptors));
        }

        for ignored in document.keys() {
            log::warn!("Ignoring unsupported OS key '{}' in {}", ignored, origin);
        }

        Ok(Self { families })
    }

    /// OS families with their descriptors, in processing order.
    pub fn families(&self) -> impl Iterator<Item = (&str, &[PlatformDescriptor])> {
        self.families
            .iter()
            .map(|(family, descriptors)| (family.as_str(), descriptors.as_slice()))
    }

    /// Every descriptor paired with its OS family.
    pub fn descriptors(&self) -> impl Iterator<Item = (&str, &PlatformDescriptor)> {
        self.families().flat_map(|(family, descriptors)| {
            descriptors.iter().map(move |descriptor| (family, descriptor))
        })
    }

    /// Distinct working directories in first-seen order.
    pub fn working_directories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.descriptors()
            .map(|(_, descriptor)| descriptor.working_directory.as_str())
            .filter(|dir| seen.insert(*dir))
            .collect()
    }

    /// Total number of descriptors.
    pub fn len(&self) -> usize {
        self.families.iter().map(|(_, d)| d.len()).sum()
    }

    /// Whether the matrix has no descriptors at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn validate_descriptor(descriptor: &PlatformDescriptor) -> std::result::Result<(), String> {
    let required = [
        ("dir", &descriptor.working_directory),
        ("arch_type", &descriptor.architecture),
        ("name", &descriptor.display_name),
        ("major_version", &descriptor.major_version),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(format!("field '{field}' must not be empty"));
        }
    }

    let dir = &descriptor.working_directory;
    if dir.contains('/') || dir.contains('\\') || dir == "." || dir == ".." {
        return Err(format!("'dir' must be a plain directory name, got '{dir}'"));
    }

    Ok(())
}
