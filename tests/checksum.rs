use distributor_packager::bundler::calculate_sha256;
use distributor_packager::bundler::{Bundle, builder::digest_bundles};

#[tokio::test]
async fn known_vector() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("abc.txt");
    std::fs::write(&path, b"abc").unwrap();

    assert_eq!(
        calculate_sha256(&path).await.unwrap(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[tokio::test]
async fn multi_chunk_file_is_lowercase_hex() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("large.bin");
    std::fs::write(&path, vec![7u8; 20_000]).unwrap();

    let digest = calculate_sha256(&path).await.unwrap();
    assert_eq!(digest.len(), 64);
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[tokio::test]
async fn single_byte_change_changes_digest() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.bin");
    let b = dir.path().join("b.bin");
    std::fs::write(&a, b"bundle contents 1").unwrap();
    std::fs::write(&b, b"bundle contents 2").unwrap();

    assert_ne!(
        calculate_sha256(&a).await.unwrap(),
        calculate_sha256(&b).await.unwrap()
    );
}

#[tokio::test]
async fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(calculate_sha256(&dir.path().join("absent")).await.is_err());
}

#[tokio::test]
async fn digests_follow_bundle_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut bundles = Vec::new();
    for name in ["b-1.zip", "a-1.zip"] {
        let local_path = dir.path().join(name);
        std::fs::write(&local_path, name).unwrap();
        bundles.push(Bundle {
            working_directory: name.trim_end_matches("-1.zip").to_string(),
            version: "1".to_string(),
            file_name: name.to_string(),
            local_path,
        });
    }

    let digests = digest_bundles(&bundles).await.unwrap();
    let names: Vec<&str> = digests.iter().map(|d| d.file_name.as_str()).collect();
    assert_eq!(names, ["b-1.zip", "a-1.zip"]);
}
