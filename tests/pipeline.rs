mod common;

use distributor_packager::bundler::{
    ApiSession, BinaryFetcher, Error, Manifest, MemoryStore, Packager, PublishTarget,
    RetryPolicy, SettingsBuilder, calculate_sha256,
};
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn target() -> PublishTarget {
    PublishTarget {
        bucket: "uptycs-dist-pipeline".to_string(),
        region: "us-east-1".to_string(),
    }
}

#[tokio::test]
async fn manual_mode_packages_staged_files() {
    let root = tempfile::tempdir().unwrap();
    let matrix = common::sample_matrix();
    common::stage_working_dirs(root.path(), &matrix);
    let packager = Packager::new(common::manual_settings(root.path(), "5.7.0"), matrix);
    let store = MemoryStore::new();

    let result = packager.run(None, &store, &target()).await.unwrap();
    assert!(result.is_complete());

    let staging = root.path().join("staging");
    let manifest: Manifest =
        serde_json::from_slice(&std::fs::read(staging.join("manifest.json")).unwrap()).unwrap();
    assert_eq!(manifest.version, "5.7.0");
    assert_eq!(manifest.files.len(), 3);

    for (file, entry) in &manifest.files {
        let local = staging.join(file);
        assert_eq!(calculate_sha256(&local).await.unwrap(), entry.checksums.sha256);
        assert_eq!(
            store
                .object("uptycs-dist-pipeline", &format!("uptycs/{file}"))
                .unwrap(),
            std::fs::read(&local).unwrap()
        );
    }
    assert_eq!(store.keys("uptycs-dist-pipeline").len(), 4);
}

#[tokio::test]
async fn staging_twice_yields_identical_manifest() {
    let root = tempfile::tempdir().unwrap();
    let matrix = common::sample_matrix();
    common::stage_working_dirs(root.path(), &matrix);
    let packager = Packager::new(common::manual_settings(root.path(), "5.7.0"), matrix);

    let first = packager.stage(None).await.unwrap();
    let first_bytes = std::fs::read(&first.manifest_path).unwrap();
    let second = packager.stage(None).await.unwrap();

    assert_eq!(first.digests, second.digests);
    assert_eq!(first_bytes, std::fs::read(&second.manifest_path).unwrap());
}

#[tokio::test]
async fn missing_working_directory_aborts_before_publish() {
    let root = tempfile::tempdir().unwrap();
    let packager = Packager::new(
        common::manual_settings(root.path(), "5.7.0"),
        common::sample_matrix(),
    );
    let store = MemoryStore::new();

    let err = packager.run(None, &store, &target()).await.unwrap_err();
    assert!(matches!(err, Error::Archive { .. }));
    assert!(store.buckets().is_empty());
    assert!(!root.path().join("staging/manifest.json").exists());
}

#[tokio::test]
async fn download_mode_requires_a_fetcher() {
    let root = tempfile::tempdir().unwrap();
    let settings = SettingsBuilder::new()
        .version("5.7.0")
        .work_root(root.path())
        .staging_dir(root.path().join("staging"))
        .build()
        .unwrap();
    let packager = Packager::new(settings, common::sample_matrix());

    assert!(packager.stage(None).await.is_err());
}

/// Runs the pipeline in download mode against a service answering every call
/// with `response`, and checks nothing was archived or published.
async fn assert_fetch_aborts_run(response: ResponseTemplate) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(response)
        .mount(&server)
        .await;

    let root = tempfile::tempdir().unwrap();
    let matrix = common::sample_matrix();
    common::stage_working_dirs(root.path(), &matrix);
    let settings = SettingsBuilder::new()
        .version("5.7.0")
        .work_root(root.path())
        .staging_dir(root.path().join("staging"))
        .request_timeout(Duration::from_secs(10))
        .retry(RetryPolicy::none())
        .build()
        .unwrap();
    let packager = Packager::new(settings, matrix);

    let session = ApiSession::new(
        &format!("{}/public/api/customers/cust-1", server.uri()),
        "key",
        "secret",
        chrono::Duration::seconds(9000),
    )
    .unwrap();
    let mut fetcher = BinaryFetcher::new(session, packager.settings())
        .unwrap()
        .with_asset_group_id("grp-1");
    let store = MemoryStore::new();

    let err = packager
        .run(Some(&mut fetcher), &store, &target())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Fetch { .. }));
    assert!(!root.path().join("staging").exists());
    assert!(store.buckets().is_empty());
}

#[tokio::test]
async fn fetch_failure_aborts_before_any_bundle() {
    assert_fetch_aborts_run(ResponseTemplate::new(500)).await;
}

#[tokio::test]
async fn missing_content_disposition_aborts_before_any_bundle() {
    let response = ResponseTemplate::new(200).set_body_bytes(b"installer".to_vec());
    assert_fetch_aborts_run(response).await;
}
