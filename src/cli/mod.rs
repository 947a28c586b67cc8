//! Command line interface for the distributor packager.
//!
//! This module wires parsed arguments into a [`Packager`] run and reports
//! the per-artifact publish outcome.

mod args;
mod output;

pub use args::{Args, BUCKET_NAME_PREFIX, DEFAULT_MATRIX_FILE, RuntimeConfig, random_bucket_name};
pub use output::OutputManager;

use crate::bundler::{
    ApiSession, BinaryFetcher, BuildMatrix, DownloadClient, Packager, PublishResult,
    PublishTarget, RetryPolicy, S3Store, SettingsBuilder, UploadStatus,
};
use crate::error::{CliError, Result};
use std::time::Duration;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;
    execute(&args).await
}

/// Runs the pipeline for already-parsed arguments.
pub async fn execute(args: &Args) -> Result<i32> {
    let config = RuntimeConfig::from(args);
    let timeout = Duration::from_secs(args.timeout_secs);
    let retry = RetryPolicy {
        max_attempts: args.retries,
        ..RetryPolicy::default()
    };

    let matrix = BuildMatrix::load(&args.matrix)?;
    config.verbose_println(&format!(
        "Loaded {} platform(s) from {}",
        matrix.len(),
        args.matrix.display()
    ))?;

    let session = match &args.config {
        Some(path) => Some(ApiSession::from_key_file(path)?),
        None => None,
    };

    let version = match (&args.package_version, &session) {
        (Some(version), _) => version.trim().to_string(),
        (None, Some(session)) => {
            let client = DownloadClient::new(timeout, retry)?;
            let latest = client.latest_version(session).await?;
            log::info!("Using latest published version {}", latest);
            latest
        }
        (None, None) => {
            return Err(CliError::MissingArgument {
                argument: "--package-version".to_string(),
            }
            .into());
        }
    };

    let settings = SettingsBuilder::new()
        .version(&version)
        .work_root(&args.work_dir)
        .staging_dir(&args.staging_dir)
        .object_prefix(&args.prefix)
        .download(!args.no_download)
        .include_protection(!args.sensor_only)
        .request_timeout(timeout)
        .retry(retry)
        .build()?;
    let packager = Packager::new(settings, matrix);

    let target = PublishTarget {
        bucket: args.bucket_name(),
        region: args.region.clone(),
    };

    config.section(&format!("Packaging version {version}"))?;
    config.indent(&format!("bucket: {}", target.bucket))?;
    config.indent(&format!("region: {}", target.region))?;
    config.indent(&format!(
        "profile: {}",
        if args.sensor_only { "sensor only" } else { "sensor and protection" }
    ))?;

    let mut fetcher = match session {
        Some(session) if packager.settings().download() => {
            Some(BinaryFetcher::new(session, packager.settings())?)
        }
        _ => None,
    };

    let store = S3Store::connect(&target.region, timeout).await;
    let result = packager.run(fetcher.as_mut(), &store, &target).await?;

    report(&config, &result)?;
    result.into_result()?;
    Ok(0)
}

fn report(config: &RuntimeConfig, result: &PublishResult) -> std::io::Result<()> {
    config.section("Publish results")?;
    for outcome in &result.artifacts {
        match &outcome.status {
            UploadStatus::Uploaded => config.indent(&format!("uploaded {}", outcome.key))?,
            UploadStatus::Failed(reason) => {
                config.warn(&format!("upload of {} failed: {}", outcome.key, reason))?
            }
            UploadStatus::Skipped(reason) => {
                config.warn(&format!("skipped {}: {}", outcome.key, reason))?
            }
        }
    }

    if result.is_complete() {
        config.success(&format!(
            "Published {} artifact(s) to {}",
            result.artifacts.len(),
            result.bucket
        ))?;
    }
    Ok(())
}

/// Parse arguments without executing (for testing)
pub fn parse_args() -> Args {
    Args::parse_args()
}

/// Validate arguments without executing (for testing)
pub fn validate_args(args: &Args) -> std::result::Result<(), String> {
    args.validate()
}
