//! Install script rewriting.
//!
//! Each working directory carries an install script with a line such as
//! `filename=osquery-5.6.0.deb` (shell) or `$filename="..."` (PowerShell).
//! After a download the value is replaced with the new file name.

use crate::bundler::error::{Error, ErrorExt, Result};
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static ASSIGNMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(filename=|\$filename=)[^\r\n]+").expect("assignment pattern is a valid regex")
});

/// Install script file name for an OS family.
pub fn script_name(os_family: &str) -> &'static str {
    if os_family.eq_ignore_ascii_case("windows") {
        "install.ps1"
    } else {
        "install.sh"
    }
}

/// Path of the install script inside a working directory.
pub fn script_path(working_dir: &Path, os_family: &str) -> PathBuf {
    working_dir.join(script_name(os_family))
}

/// Replaces every filename assignment value with `file_name`.
///
/// Only the text after `filename=` up to the end of the line changes; line
/// endings are preserved.
pub fn rewrite_filename(content: &str, file_name: &str) -> String {
    ASSIGNMENT_RE
        .replace_all(content, |caps: &Captures<'_>| format!("{}{}", &caps[1], file_name))
        .into_owned()
}

/// Rewrites the install script at `path` in place.
pub async fn rewrite_script(path: &Path, file_name: &str) -> Result<()> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::fetch("install script rewrite", path.display().to_string(), e)
    })?;
    if !ASSIGNMENT_RE.is_match(&content) {
        log::warn!("No filename assignment found in {}", path.display());
    }
    let rewritten = rewrite_filename(&content, file_name);
    tokio::fs::write(path, rewritten)
        .await
        .fs_context("writing install script", path)?;
    log::debug!("Pointed {} at {}", path.display(), file_name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_assignment_is_replaced() {
        let script = "#!/bin/sh\nfilename=old.deb\ndpkg -i \"$filename\"\n";
        assert_eq!(
            rewrite_filename(script, "osquery-5.7.0.deb"),
            "#!/bin/sh\nfilename=osquery-5.7.0.deb\ndpkg -i \"$filename\"\n"
        );
    }

    #[test]
    fn powershell_assignment_keeps_sigil() {
        let script = "$filename=\"old.msi\"\r\nStart-Process msiexec\r\n";
        assert_eq!(
            rewrite_filename(script, "osquery.msi"),
            "$filename=osquery.msi\r\nStart-Process msiexec\r\n"
        );
    }

    #[test]
    fn dollar_in_file_name_is_literal() {
        assert_eq!(rewrite_filename("filename=x\n", "a$1b.rpm"), "filename=a$1b.rpm\n");
    }

    #[test]
    fn windows_family_uses_powershell_script() {
        assert_eq!(script_name("windows"), "install.ps1");
        assert_eq!(script_name("linux"), "install.sh");
    }
}
