mod common;

use distributor_packager::bundler::{BuildMatrix, Error};
use std::io::Write;

#[test]
fn families_follow_required_order() {
    let matrix = common::sample_matrix();
    let families: Vec<&str> = matrix.families().map(|(family, _)| family).collect();
    assert_eq!(families, ["windows", "linux"]);
    assert_eq!(matrix.len(), 4);
}

#[test]
fn working_directories_are_deduplicated_in_first_seen_order() {
    let matrix = common::sample_matrix();
    assert_eq!(
        matrix.working_directories(),
        ["win_x64", "deb_amd64", "deb_arm64"]
    );
}

#[test]
fn effective_version_joins_minor_only_when_present() {
    let matrix = common::sample_matrix();
    let versions: Vec<String> = matrix
        .descriptors()
        .map(|(_, d)| d.effective_version())
        .collect();
    assert_eq!(versions, ["10", "20.04", "11", "22.04"]);
}

#[test]
fn missing_family_is_config_parse_error() {
    let err = BuildMatrix::from_json(r#"{"linux": []}"#, "inline", &["windows", "linux"])
        .unwrap_err();
    match err {
        Error::ConfigParse { reason, .. } => assert!(reason.contains("windows")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_families_are_accepted() {
    let matrix =
        BuildMatrix::from_json(r#"{"linux": [], "windows": []}"#, "inline", &["windows", "linux"])
            .unwrap();
    assert!(matrix.is_empty());
    assert!(matrix.working_directories().is_empty());
}

#[test]
fn unknown_family_is_ignored() {
    let matrix = BuildMatrix::from_json(
        r#"{"linux": [], "windows": [], "darwin": [{"dir": "mac"}]}"#,
        "inline",
        &["windows", "linux"],
    )
    .unwrap();
    assert!(matrix.is_empty());
}

#[test]
fn descriptor_without_required_field_is_rejected() {
    let text = r#"{"windows": [], "linux": [
        {"dir": "deb", "arch_type": "x64", "name": "Ubuntu"}
    ]}"#;
    let err = BuildMatrix::from_json(text, "inline", &["windows", "linux"]).unwrap_err();
    assert!(matches!(err, Error::ConfigParse { .. }));
}

#[test]
fn directory_with_path_separator_is_rejected() {
    let text = r#"{"windows": [], "linux": [
        {"dir": "../escape", "arch_type": "x64", "name": "Ubuntu", "major_version": "20"}
    ]}"#;
    let err = BuildMatrix::from_json(text, "inline", &["windows", "linux"]).unwrap_err();
    assert!(err.to_string().contains("plain directory name"));
}

#[test]
fn load_reads_matrix_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(common::SAMPLE_MATRIX.as_bytes()).unwrap();
    let matrix = BuildMatrix::load(file.path()).unwrap();
    assert_eq!(matrix, common::sample_matrix());
}

#[test]
fn load_of_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(BuildMatrix::load(&dir.path().join("absent.json")).is_err());
}
