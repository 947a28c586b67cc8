//! HTTP client for the package download service.

use super::session::ApiSession;
use crate::bundler::error::{Error, ErrorExt, Result};
use crate::bundler::utils::retry::RetryPolicy;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Name of the object group whose id scopes package downloads.
pub const ASSET_GROUP_NAME: &str = "assets";

static FILENAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"filename="(.+?)""#).expect("filename pattern is a valid regex")
});

#[derive(Deserialize)]
struct ItemList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Deserialize)]
struct ObjectGroup {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct OsqueryPackage {
    version: String,
}

/// One failed attempt, tagged with whether repeating it can help.
///
/// Transport errors and 5xx responses are transient; anything the server
/// answered deliberately (4xx, missing headers, unusable names) is not.
#[derive(Debug)]
enum Failure {
    Transient(Error),
    Permanent(Error),
}

impl Failure {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    fn into_error(self) -> Error {
        match self {
            Self::Transient(e) | Self::Permanent(e) => e,
        }
    }

    fn from_status(status: reqwest::StatusCode, error: Error) -> Self {
        if status.is_server_error() {
            Self::Transient(error)
        } else {
            Self::Permanent(error)
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transient(e) | Self::Permanent(e) => e.fmt(f),
        }
    }
}

impl From<Error> for Failure {
    fn from(error: Error) -> Self {
        Self::Permanent(error)
    }
}

/// Thin client over the download service endpoints the pipeline needs.
pub struct DownloadClient {
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl DownloadClient {
    /// Creates a client whose calls are each bounded by `timeout`.
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::fetch("create HTTP client", "download service", e))?;
        Ok(Self { http, retry })
    }

    /// Looks up the id of the object group named `name`.
    ///
    /// `Ok(None)` means the listing succeeded but no group has that name.
    pub async fn asset_group_id(&self, session: &ApiSession, name: &str) -> Result<Option<String>> {
        let groups: ItemList<ObjectGroup> = self.get_json(session, "/objectGroups").await?;
        Ok(groups
            .items
            .into_iter()
            .find(|group| group.name.as_deref() == Some(name))
            .and_then(|group| group.id))
    }

    /// Latest agent version offered by the service, without its build suffix.
    pub async fn latest_version(&self, session: &ApiSession) -> Result<String> {
        let packages: ItemList<OsqueryPackage> = self.get_json(session, "/osqueryPackages").await?;
        let first = packages.items.into_iter().next().ok_or_else(|| {
            Error::fetch("latest version lookup", "/osqueryPackages", "no packages listed")
        })?;
        let version = first.version.split('-').next().unwrap_or_default().to_string();
        if version.is_empty() {
            return Err(Error::fetch(
                "latest version lookup",
                "/osqueryPackages",
                format!("unusable version '{}'", first.version),
            ));
        }
        Ok(version)
    }

    /// Downloads one package into `dest_dir`.
    ///
    /// The file name comes from the response's `content-disposition` header.
    /// The body is streamed to `<name>.part` and renamed once complete.
    pub async fn download_package(
        &self,
        session: &ApiSession,
        platform_id: &str,
        asset_group_id: &str,
        query: &[(&str, String)],
        dest_dir: &Path,
    ) -> Result<PathBuf> {
        let path = format!("/packageDownloads/osquery/{platform_id}/{asset_group_id}");
        self.retry
            .run_if(
                &format!("download {path}"),
                || self.download_once(session, &path, query, dest_dir),
                Failure::is_transient,
            )
            .await
            .map_err(Failure::into_error)
    }

    async fn download_once(
        &self,
        session: &ApiSession,
        path: &str,
        query: &[(&str, String)],
        dest_dir: &Path,
    ) -> std::result::Result<PathBuf, Failure> {
        let url = format!("{}{}", session.base_url(), path);
        log::debug!("Calling API with {} {:?}", path, query);

        let mut response = self
            .http
            .get(&url)
            .headers(session.headers()?)
            .query(query)
            .send()
            .await
            .map_err(|e| Failure::Transient(Error::fetch("package download", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Failure::from_status(
                status,
                Error::fetch("package download", path, format!("HTTP {status}")),
            ));
        }

        let disposition = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .ok_or_else(|| {
                Error::fetch("package download", path, "missing content-disposition header")
            })?
            .to_str()
            .map_err(|e| Error::fetch("package download", path, e))?;
        let file_name = filename_from_disposition(disposition)
            .ok_or_else(|| {
                Error::fetch(
                    "package download",
                    path,
                    format!("no usable filename in content-disposition '{disposition}'"),
                )
            })?
            .to_string();

        tokio::fs::create_dir_all(dest_dir)
            .await
            .fs_context("creating working directory", dest_dir)?;

        let final_path = dest_dir.join(&file_name);
        let part_path = dest_dir.join(format!("{file_name}.part"));
        log::debug!("Downloading file {}", file_name);

        let mut file = tokio::fs::File::create(&part_path)
            .await
            .fs_context("creating download file", &part_path)?;
        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Failure::Transient(Error::fetch("package download", path, e)))?
        {
            file.write_all(&chunk)
                .await
                .fs_context("writing download file", &part_path)?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .fs_context("flushing download file", &part_path)?;
        drop(file);

        tokio::fs::rename(&part_path, &final_path)
            .await
            .fs_context("finalizing download file", &final_path)?;
        log::info!("Wrote {} ({} bytes)", final_path.display(), written);

        Ok(final_path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        session: &ApiSession,
        path: &str,
    ) -> Result<T> {
        let attempt = || async move {
            let response = self
                .http
                .get(format!("{}{}", session.base_url(), path))
                .headers(session.headers()?)
                .send()
                .await
                .map_err(|e| Failure::Transient(Error::fetch("GET", path, e)))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Failure::from_status(
                    status,
                    Error::fetch("GET", path, format!("HTTP {status}: {body}")),
                ));
            }

            response.json::<T>().await.map_err(|e| {
                Failure::Permanent(Error::fetch(
                    "GET",
                    path,
                    format!("invalid JSON response: {e}"),
                ))
            })
        };

        self.retry
            .run_if(&format!("GET {path}"), attempt, Failure::is_transient)
            .await
            .map_err(Failure::into_error)
    }
}

/// Extracts the file name from a `content-disposition` value.
///
/// Names with path components are rejected.
pub fn filename_from_disposition(disposition: &str) -> Option<&str> {
    let name = FILENAME_RE.captures(disposition)?.get(1)?.as_str();
    let unsafe_name = name.contains('/') || name.contains('\\') || name == "." || name == "..";
    if unsafe_name { None } else { Some(name) }
}
