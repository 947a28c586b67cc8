mod common;

use distributor_packager::bundler::{
    BuildMatrix, Digest, Error, Manifest, ManifestBuilder, PackageSettings, PackageTree,
};

fn digest(file_name: &str, fill: char) -> Digest {
    Digest {
        file_name: file_name.to_string(),
        sha256: fill.to_string().repeat(64),
    }
}

fn sample_digests(version: &str) -> Vec<Digest> {
    vec![
        digest(&format!("win_x64-{version}.zip"), 'a'),
        digest(&format!("deb_amd64-{version}.zip"), 'b'),
        digest(&format!("deb_arm64-{version}.zip"), 'c'),
    ]
}

fn build(matrix: &BuildMatrix, version: &str, digests: &[Digest]) -> Manifest {
    ManifestBuilder::new(PackageSettings::default())
        .build(matrix, version, digests)
        .unwrap()
}

#[test]
fn ubuntu_descriptor_produces_nested_entry() {
    let text = r#"{"windows": [], "linux": [
        {"dir": "deb_amd64", "arch_type": "x64", "name": "Ubuntu",
         "major_version": "20", "minor_version": "04", "upt_package": "ubuntu"}
    ]}"#;
    let matrix = BuildMatrix::from_json(text, "inline", &["windows", "linux"]).unwrap();
    let manifest = build(&matrix, "5.7.0", &[digest("deb_amd64-5.7.0.zip", 'f')]);

    let value: serde_json::Value = serde_json::from_slice(&manifest.to_json().unwrap()).unwrap();
    assert_eq!(
        value["packages"]["Ubuntu"]["20.04"]["x64"]["file"],
        "deb_amd64-5.7.0.zip"
    );
    assert_eq!(
        value["files"]["deb_amd64-5.7.0.zip"]["checksums"]["sha256"],
        "f".repeat(64)
    );
    assert_eq!(value["schemaVersion"], "2.0");
    assert_eq!(value["publisher"], "Uptycs.");
    assert_eq!(value["version"], "5.7.0");
}

#[test]
fn shared_directory_serves_several_platforms() {
    let manifest = build(&common::sample_matrix(), "5.7.0", &sample_digests("5.7.0"));

    assert_eq!(manifest.files.len(), 3);
    assert_eq!(manifest.packages.len(), 4);
    let ubuntu = manifest.packages.get("Ubuntu", "20.04", "x64").unwrap();
    let debian = manifest.packages.get("Debian", "11", "x64").unwrap();
    assert_eq!(ubuntu.file, debian.file);
    assert_eq!(
        manifest.packages.get("Ubuntu", "22.04", "arm64").unwrap().file,
        "deb_arm64-5.7.0.zip"
    );
}

#[test]
fn every_packages_leaf_has_a_files_entry() {
    let manifest = build(&common::sample_matrix(), "5.7.0", &sample_digests("5.7.0"));
    for file in manifest.packages.files() {
        assert!(manifest.files.contains_key(file), "{file} has no checksum");
    }
}

#[test]
fn missing_minor_version_uses_major_alone() {
    let manifest = build(&common::sample_matrix(), "5.7.0", &sample_digests("5.7.0"));
    assert!(manifest.packages.get("Windows", "10", "x64").is_some());
    assert!(manifest.packages.get("Debian", "11", "x64").is_some());
}

#[test]
fn conflicting_triple_is_rejected() {
    let text = r#"{"windows": [], "linux": [
        {"dir": "deb_a", "arch_type": "x64", "name": "Ubuntu", "major_version": "20"},
        {"dir": "deb_b", "arch_type": "x64", "name": "Ubuntu", "major_version": "20"}
    ]}"#;
    let matrix = BuildMatrix::from_json(text, "inline", &["windows", "linux"]).unwrap();
    let err = ManifestBuilder::new(PackageSettings::default())
        .build(
            &matrix,
            "1.0",
            &[digest("deb_a-1.0.zip", 'a'), digest("deb_b-1.0.zip", 'b')],
        )
        .unwrap_err();
    assert!(matches!(err, Error::ManifestConsistency(_)));
}

#[test]
fn referenced_bundle_without_digest_is_rejected() {
    let mut digests = sample_digests("5.7.0");
    digests.pop();
    let err = ManifestBuilder::new(PackageSettings::default())
        .build(&common::sample_matrix(), "5.7.0", &digests)
        .unwrap_err();
    assert!(err.to_string().contains("deb_arm64-5.7.0.zip"));
}

#[test]
fn empty_digest_is_rejected() {
    let mut digests = sample_digests("5.7.0");
    digests[0].sha256.clear();
    let err = ManifestBuilder::new(PackageSettings::default())
        .build(&common::sample_matrix(), "5.7.0", &digests)
        .unwrap_err();
    assert!(matches!(err, Error::ManifestConsistency(_)));
}

#[test]
fn same_inputs_serialize_to_identical_bytes() {
    let first = build(&common::sample_matrix(), "5.7.0", &sample_digests("5.7.0"));
    let second = build(&common::sample_matrix(), "5.7.0", &sample_digests("5.7.0"));
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn reinserting_identical_leaf_is_a_no_op() {
    let mut tree = PackageTree::default();
    tree.insert("Ubuntu", "20.04", "x64", "deb-1.zip").unwrap();
    tree.insert("Ubuntu", "20.04", "arm64", "arm-1.zip").unwrap();
    tree.insert("Ubuntu", "20.04", "x64", "deb-1.zip").unwrap();
    assert_eq!(tree.len(), 2);
    assert_eq!(tree.get("Ubuntu", "20.04", "arm64").unwrap().file, "arm-1.zip");
}

#[test]
fn empty_matrix_yields_empty_maps() {
    let matrix =
        BuildMatrix::from_json(r#"{"windows": [], "linux": []}"#, "inline", &["windows", "linux"])
            .unwrap();
    let manifest = build(&matrix, "5.7.0", &[]);
    assert!(manifest.packages.is_empty());
    assert!(manifest.files.is_empty());
}

#[tokio::test]
async fn written_manifest_parses_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manifest.json");
    let manifest = build(&common::sample_matrix(), "5.7.0", &sample_digests("5.7.0"));
    manifest.write(&path).await.unwrap();

    let parsed: Manifest = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(parsed, manifest);
    assert!(!dir.path().join("manifest.json.partial").exists());
}
