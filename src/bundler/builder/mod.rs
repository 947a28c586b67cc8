//! Pipeline orchestration and coordination.
//!
//! This module provides the [`Packager`] orchestrator that coordinates the
//! pipeline stages to turn a build matrix into a published release.
//!
//! # Overview
//!
//! The packager:
//! 1. Fetches one binary per platform descriptor (unless disabled)
//! 2. Archives each distinct working directory into a bundle
//! 3. Calculates a SHA-256 digest per bundle
//! 4. Builds and writes the manifest
//! 5. Publishes bundles and manifest to the bucket
//!
//! # Module Organization
//!
//! - [`checksum`] - SHA-256 digests for bundles
//! - [`orchestrator`] - Main [`Packager`] struct and stage sequencing

pub mod checksum;
mod orchestrator;

pub use checksum::{Digest, calculate_sha256, digest_bundles};
pub use orchestrator::{Packager, StagedRelease};
