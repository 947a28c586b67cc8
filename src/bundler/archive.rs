//! Bundle creation.
//!
//! Each distinct working directory becomes one zip bundle named
//! `{workingDirectory}-{version}.zip` in the staging folder. Directory
//! structure is flattened: every regular file is stored under its base name,
//! so the install script's flat file reference stays valid.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::collections::HashSet;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

/// A bundle written to the staging folder.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Bundle {
    /// Working directory the bundle was built from
    pub working_directory: String,
    /// Release version
    pub version: String,
    /// `{working_directory}-{version}.zip`
    pub file_name: String,
    /// Location in the staging folder
    pub local_path: PathBuf,
}

/// Deterministic bundle file name for a working directory and version.
pub fn bundle_file_name(working_directory: &str, version: &str) -> String {
    format!("{working_directory}-{version}.zip")
}

/// Archives `source_dir` into `{staging_dir}/{working_directory}-{version}.zip`.
///
/// The zip is written to a `.partial` file and renamed once the writer is
/// finished, so the returned bundle is always complete on disk. Entries are
/// added in sorted order with a fixed timestamp and the source file's
/// permission bits. Symlinks to files are stored with the target's content.
///
/// # Errors
///
/// A missing or unreadable working directory, a dangling or directory
/// symlink, or two files sharing a base name, is an [`Error::Archive`].
pub async fn archive(
    working_directory: &str,
    source_dir: &Path,
    version: &str,
    staging_dir: &Path,
) -> Result<Bundle> {
    let metadata = tokio::fs::metadata(source_dir)
        .await
        .map_err(|e| Error::archive(working_directory, format!("{}: {e}", source_dir.display())))?;
    if !metadata.is_dir() {
        return Err(Error::archive(
            working_directory,
            format!("{} is not a directory", source_dir.display()),
        ));
    }

    tokio::fs::create_dir_all(staging_dir)
        .await
        .fs_context("creating staging folder", staging_dir)?;

    let file_name = bundle_file_name(working_directory, version);
    let local_path = staging_dir.join(&file_name);
    let partial_path = staging_dir.join(format!("{file_name}.partial"));

    // Blocking zip writing runs on the dedicated thread pool
    let entries = {
        let name = working_directory.to_string();
        let source = source_dir.to_path_buf();
        let partial = partial_path.clone();
        tokio::task::spawn_blocking(move || write_zip(&name, &source, &partial))
            .await
            .map_err(|e| Error::archive(working_directory, format!("archive task panicked: {e}")))??
    };

    tokio::fs::rename(&partial_path, &local_path)
        .await
        .fs_context("finalizing bundle", &local_path)?;

    log::info!(
        "Successfully created zip file: {} ({} files)",
        local_path.display(),
        entries
    );

    Ok(Bundle {
        working_directory: working_directory.to_string(),
        version: version.to_string(),
        file_name,
        local_path,
    })
}

fn write_zip(working_directory: &str, source_dir: &Path, zip_path: &Path) -> Result<usize> {
    let archive_error = |reason: String| Error::archive(working_directory, reason);

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(source_dir)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| archive_error(e.to_string()))?;
        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }
        // Symlinks are bundled by target content; the metadata call follows them
        let metadata = std::fs::metadata(entry.path())
            .map_err(|e| archive_error(format!("{}: {e}", entry.path().display())))?;
        if !metadata.is_file() {
            return Err(archive_error(format!(
                "{} is not a regular file or a link to one",
                entry.path().display()
            )));
        }
        // Partially downloaded files never belong in a bundle
        if entry.path().extension().is_some_and(|ext| ext == "part") {
            log::warn!("Skipping incomplete download {}", entry.path().display());
            continue;
        }
        if file_type.is_symlink() {
            log::debug!("Bundling link target of {}", entry.path().display());
        }
        files.push((entry.into_path(), unix_mode(&metadata)));
    }

    let mut seen = HashSet::new();
    let mut named = Vec::with_capacity(files.len());
    for (path, mode) in files {
        let base = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| archive_error(format!("{} has no UTF-8 file name", path.display())))?
            .to_string();
        if !seen.insert(base.clone()) {
            return Err(archive_error(format!(
                "more than one file named '{base}'; bundles are flat"
            )));
        }
        named.push((base, path, mode));
    }
    named.sort_by(|a, b| a.0.cmp(&b.0));

    let file = std::fs::File::create(zip_path).fs_context("creating bundle", zip_path)?;
    let mut writer = zip::ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    for (name, path, mode) in &named {
        let entry_options = match mode {
            Some(mode) => options.unix_permissions(*mode),
            None => options,
        };
        writer
            .start_file(name.as_str(), entry_options)
            .map_err(|e| archive_error(format!("adding {name}: {e}")))?;
        let mut source = std::fs::File::open(path).fs_context("opening file for bundle", path)?;
        std::io::copy(&mut source, &mut writer).fs_context("writing file into bundle", path)?;
    }

    let mut inner = writer
        .finish()
        .map_err(|e| archive_error(format!("finishing zip: {e}")))?;
    std::io::Write::flush(&mut inner).fs_context("flushing bundle", zip_path)?;
    inner
        .into_inner()
        .map_err(|e| archive_error(format!("flushing zip: {e}")))?
        .sync_all()
        .fs_context("syncing bundle", zip_path)?;

    Ok(named.len())
}

/// Permission bits of a source file, stored in the zip entry so install
/// scripts keep their executable bit.
#[cfg(unix)]
fn unix_mode(metadata: &std::fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn unix_mode(_metadata: &std::fs::Metadata) -> Option<u32> {
    None
}
