//! Main pipeline orchestration.
//!
//! This module provides the [`Packager`] that runs the stages in order:
//! fetch, archive, digest, manifest, publish. Each stage completes before
//! the next starts, and any fatal error stops the run before anything is
//! published.

use crate::bundler::{
    archive::{self, Bundle},
    error::{Context, Result},
    fetch::BinaryFetcher,
    manifest::{MANIFEST_FILE_NAME, Manifest, ManifestBuilder},
    publish::{Artifact, BucketPublisher, ObjectStore, PublishResult, PublishTarget},
    settings::{BuildMatrix, Settings},
};
use std::path::PathBuf;

use super::checksum::{Digest, digest_bundles};

/// Everything staged locally, ready to publish.
#[derive(Clone, Debug)]
pub struct StagedRelease {
    /// One bundle per distinct working directory
    pub bundles: Vec<Bundle>,
    /// One digest per bundle
    pub digests: Vec<Digest>,
    /// Manifest describing exactly `bundles`
    pub manifest: Manifest,
    /// Local path of `manifest.json`
    pub manifest_path: PathBuf,
}

impl StagedRelease {
    /// Bundles as upload artifacts.
    pub fn bundle_artifacts(&self) -> Vec<Artifact> {
        self.bundles
            .iter()
            .map(|bundle| Artifact {
                file_name: bundle.file_name.clone(),
                local_path: bundle.local_path.clone(),
            })
            .collect()
    }

    /// The manifest as an upload artifact.
    pub fn manifest_artifact(&self) -> Artifact {
        Artifact {
            file_name: MANIFEST_FILE_NAME.to_string(),
            local_path: self.manifest_path.clone(),
        }
    }
}

/// Pipeline orchestrator.
///
/// # Examples
///
/// ```no_run
/// use distributor_packager::bundler::{
///     BuildMatrix, MemoryStore, Packager, PublishTarget, SettingsBuilder,
/// };
///
/// # async fn example() -> distributor_packager::bundler::Result<()> {
/// let settings = SettingsBuilder::new().version("5.7.0").download(false).build()?;
/// let matrix = BuildMatrix::load("uptycs-agent-mapping.json".as_ref())?;
/// let packager = Packager::new(settings, matrix);
///
/// let staged = packager.stage(None).await?;
/// let store = MemoryStore::new();
/// let target = PublishTarget { bucket: "my-bucket".into(), region: "us-east-1".into() };
/// let result = packager.publish(&staged, &store, &target).await;
/// assert!(result.is_complete());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Packager {
    settings: Settings,
    matrix: BuildMatrix,
}

impl Packager {
    /// Creates a packager for one run.
    pub fn new(settings: Settings, matrix: BuildMatrix) -> Self {
        Self { settings, matrix }
    }

    /// Returns the run settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the build matrix.
    pub fn matrix(&self) -> &BuildMatrix {
        &self.matrix
    }

    /// Downloads every descriptor's binary, one at a time.
    ///
    /// Stops at the first failure.
    pub async fn fetch_binaries(&self, fetcher: &mut BinaryFetcher<'_>) -> Result<usize> {
        let mut fetched = 0;
        for (family, descriptor) in self.matrix.descriptors() {
            fetcher
                .fetch(
                    family,
                    descriptor,
                    self.settings.version(),
                    self.settings.include_protection(),
                )
                .await?;
            fetched += 1;
        }
        log::info!("Fetched {} platform binaries", fetched);
        Ok(fetched)
    }

    /// Archives every distinct working directory.
    pub async fn archive_all(&self) -> Result<Vec<Bundle>> {
        let mut bundles = Vec::new();
        for dir in self.matrix.working_directories() {
            let bundle = archive::archive(
                dir,
                &self.settings.working_dir(dir),
                self.settings.version(),
                self.settings.staging_dir(),
            )
            .await?;
            bundles.push(bundle);
        }
        Ok(bundles)
    }

    /// Runs every local stage: fetch (when enabled), archive, digest and
    /// manifest.
    ///
    /// `fetcher` is required when the settings enable downloads and unused
    /// otherwise.
    pub async fn stage(&self, fetcher: Option<&mut BinaryFetcher<'_>>) -> Result<StagedRelease> {
        if self.settings.download() {
            let fetcher = fetcher.context("download stage enabled but no fetcher supplied")?;
            self.fetch_binaries(fetcher).await?;
        } else {
            log::info!("Download disabled, packaging manually staged files");
        }

        let bundles = self.archive_all().await?;
        let digests = digest_bundles(&bundles).await?;

        let manifest = ManifestBuilder::new(self.settings.package().clone()).build(
            &self.matrix,
            self.settings.version(),
            &digests,
        )?;
        let manifest_path = self.settings.manifest_path();
        manifest.write(&manifest_path).await?;

        Ok(StagedRelease {
            bundles,
            digests,
            manifest,
            manifest_path,
        })
    }

    /// Publishes a staged release to `target`.
    pub async fn publish(
        &self,
        staged: &StagedRelease,
        store: &dyn ObjectStore,
        target: &PublishTarget,
    ) -> PublishResult {
        let publisher =
            BucketPublisher::new(store, self.settings.object_prefix(), self.settings.retry());
        publisher
            .publish(target, &staged.bundle_artifacts(), &staged.manifest_artifact())
            .await
    }

    /// Stages and publishes in one call.
    pub async fn run(
        &self,
        fetcher: Option<&mut BinaryFetcher<'_>>,
        store: &dyn ObjectStore,
        target: &PublishTarget,
    ) -> Result<PublishResult> {
        let staged = self.stage(fetcher).await?;
        Ok(self.publish(&staged, store, target).await)
    }
}
