use assert_cmd::Command;
use predicates::prelude::*;

fn packager() -> Command {
    Command::cargo_bin("distributor_packager").unwrap()
}

#[test]
fn help_lists_flags() {
    packager()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--s3bucket"))
        .stdout(predicate::str::contains("--sensor-only"));
}

#[test]
fn manual_mode_without_version_fails() {
    packager()
        .arg("--no-download")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--package-version"));
}

#[test]
fn download_mode_without_credentials_fails() {
    packager()
        .args(["-v", "5.7.0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--config"));
}

#[test]
fn missing_matrix_fails_before_any_network_call() {
    let dir = tempfile::tempdir().unwrap();
    packager()
        .current_dir(dir.path())
        .args(["--no-download", "-v", "5.7.0", "-b", "some-bucket"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("uptycs-agent-mapping.json"));
}
