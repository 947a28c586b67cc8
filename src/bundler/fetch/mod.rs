//! Binary fetching from the package download service.
//!
//! The [`BinaryFetcher`] downloads one installer per platform descriptor into
//! the descriptor's working directory and points the directory's install
//! script at the downloaded file.
//!
//! # Module Organization
//!
//! - [`session`] - Credentials with a bounded validity window
//! - [`client`] - HTTP calls against the download service
//! - [`install_script`] - In-place install script rewriting

pub mod client;
pub mod install_script;
pub mod session;

pub use client::{ASSET_GROUP_NAME, DownloadClient};
pub use session::ApiSession;

use crate::bundler::error::{Error, Result};
use crate::bundler::settings::{PlatformDescriptor, Settings};
use std::path::PathBuf;

/// Query flag requesting the ARM build of a package.
const ARM_FLAG: &str = "gravitonPackage";

/// Query flag requesting the protection component.
const PROTECTION_FLAG: &str = "remediationPackage";

/// Remaining token lifetime below which the session is re-signed.
const REFRESH_MARGIN_SECS: i64 = 300;

/// Builds the download query for one descriptor.
///
/// `osqVersion` is always present; the ARM flag is added for 64-bit ARM and
/// the protection flag when the richer install profile is requested.
pub fn download_query(
    descriptor: &PlatformDescriptor,
    version: &str,
    include_protection: bool,
) -> Vec<(&'static str, String)> {
    let mut query = vec![("osqVersion", version.to_string())];
    if descriptor.arch().is_arm64() {
        query.push((ARM_FLAG, "true".to_string()));
    }
    if include_protection {
        query.push((PROTECTION_FLAG, "true".to_string()));
    }
    query
}

/// Downloads platform binaries into their working directories.
pub struct BinaryFetcher<'a> {
    client: DownloadClient,
    session: ApiSession,
    settings: &'a Settings,
    asset_group_id: Option<String>,
}

impl<'a> BinaryFetcher<'a> {
    /// Creates a fetcher using the settings' timeout and retry policy.
    ///
    /// The fetcher owns the session and refreshes it before each download
    /// that would otherwise run into its expiry.
    pub fn new(session: ApiSession, settings: &'a Settings) -> Result<Self> {
        Ok(Self {
            client: DownloadClient::new(settings.request_timeout(), settings.retry())?,
            session,
            settings,
            asset_group_id: None,
        })
    }

    /// Uses a known asset group id instead of looking it up.
    pub fn with_asset_group_id(mut self, id: impl Into<String>) -> Self {
        self.asset_group_id = Some(id.into());
        self
    }

    /// Downloads the binary for `descriptor` and rewrites its install script.
    ///
    /// `os_family` selects the install script (`install.ps1` for windows,
    /// `install.sh` otherwise). Returns the path of the downloaded file.
    ///
    /// # Errors
    ///
    /// Any network, authentication or response-metadata problem is an
    /// [`Error::Fetch`]; the run must not continue with a partial platform set.
    pub async fn fetch(
        &mut self,
        os_family: &str,
        descriptor: &PlatformDescriptor,
        version: &str,
        include_protection: bool,
    ) -> Result<PathBuf> {
        validate(descriptor)?;
        self.session
            .refresh_if_expiring(chrono::Duration::seconds(REFRESH_MARGIN_SECS))?;

        let asset_group_id = self.resolve_asset_group().await?;
        let query = download_query(descriptor, version, include_protection);
        let working_dir = self.settings.working_dir(&descriptor.working_directory);

        log::info!(
            "Downloading {} for {} to folder {}",
            descriptor.download_identifier,
            descriptor.architecture,
            descriptor.working_directory
        );

        let downloaded = self
            .client
            .download_package(
                &self.session,
                &descriptor.download_identifier,
                &asset_group_id,
                &query,
                &working_dir,
            )
            .await?;

        let file_name = downloaded
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::fetch(
                    "package download",
                    &descriptor.download_identifier,
                    "downloaded file has no UTF-8 name",
                )
            })?;

        let script = install_script::script_path(&working_dir, os_family);
        install_script::rewrite_script(&script, file_name).await?;

        Ok(downloaded)
    }

    /// The session used for download calls.
    pub fn session(&self) -> &ApiSession {
        &self.session
    }

    async fn resolve_asset_group(&mut self) -> Result<String> {
        if let Some(id) = &self.asset_group_id {
            return Ok(id.clone());
        }
        match self
            .client
            .asset_group_id(&self.session, ASSET_GROUP_NAME)
            .await?
        {
            Some(id) => {
                log::debug!("Resolved asset group '{}' to {}", ASSET_GROUP_NAME, id);
                self.asset_group_id = Some(id.clone());
                Ok(id)
            }
            None => Err(Error::fetch(
                "asset group lookup",
                ASSET_GROUP_NAME,
                "no object group with that name",
            )),
        }
    }
}

fn validate(descriptor: &PlatformDescriptor) -> Result<()> {
    let fields = [
        ("dir", &descriptor.working_directory),
        ("arch_type", &descriptor.architecture),
        ("upt_package", &descriptor.download_identifier),
    ];
    for (field, value) in fields {
        if value.is_empty() {
            return Err(Error::fetch(
                "package download",
                format!("{} ({})", descriptor.display_name, descriptor.working_directory),
                format!("descriptor field '{field}' is empty"),
            ));
        }
    }
    Ok(())
}
