//! Shared helpers for integration tests.

#![allow(dead_code)]

use distributor_packager::bundler::{BuildMatrix, RetryPolicy, Settings, SettingsBuilder};
use std::path::Path;

/// Matrix with one Windows directory and two Linux descriptors sharing a directory.
pub const SAMPLE_MATRIX: &str = r#"{
  "windows": [
    {"dir": "win_x64", "arch_type": "x64", "name": "Windows", "major_version": "10",
     "upt_package": "windows"}
  ],
  "linux": [
    {"dir": "deb_amd64", "arch_type": "x64", "name": "Ubuntu", "major_version": "20",
     "minor_version": "04", "upt_package": "ubuntu"},
    {"dir": "deb_amd64", "arch_type": "x64", "name": "Debian", "major_version": "11",
     "upt_package": "debian"},
    {"dir": "deb_arm64", "arch_type": "arm64", "name": "Ubuntu", "major_version": "22",
     "minor_version": "04", "upt_package": "ubuntu"}
  ]
}"#;

pub fn sample_matrix() -> BuildMatrix {
    BuildMatrix::from_json(SAMPLE_MATRIX, "sample", &["windows", "linux"]).unwrap()
}

/// Creates every working directory of `matrix` under `root` with an
/// install script and a staged installer.
pub fn stage_working_dirs(root: &Path, matrix: &BuildMatrix) {
    for (family, descriptor) in matrix.descriptors() {
        let dir = root.join(&descriptor.working_directory);
        std::fs::create_dir_all(&dir).unwrap();
        let script = if family == "windows" { "install.ps1" } else { "install.sh" };
        std::fs::write(dir.join(script), "filename=placeholder\n").unwrap();
        std::fs::write(
            dir.join(format!("{}.bin", descriptor.working_directory)),
            descriptor.working_directory.as_bytes(),
        )
        .unwrap();
    }
}

/// Manual-mode settings rooted in `root`, staging into `root/staging`.
pub fn manual_settings(root: &Path, version: &str) -> Settings {
    SettingsBuilder::new()
        .version(version)
        .work_root(root)
        .staging_dir(root.join("staging"))
        .download(false)
        .retry(RetryPolicy::none())
        .build()
        .unwrap()
}
