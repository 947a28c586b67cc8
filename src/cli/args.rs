//! Command line argument parsing and validation.
//!
//! This module provides CLI argument parsing using clap, with validation of
//! the combinations clap cannot express on its own.

use crate::bundler::publish::DEFAULT_REGION;
use crate::bundler::settings::{DEFAULT_OBJECT_PREFIX, DEFAULT_STAGING_DIR};
use clap::Parser;
use std::path::PathBuf;

/// Default build matrix file name.
pub const DEFAULT_MATRIX_FILE: &str = "uptycs-agent-mapping.json";

/// Prefix of generated bucket names.
pub const BUCKET_NAME_PREFIX: &str = "uptycs-dist-";

/// Create and upload distributor packages
#[derive(Parser, Debug)]
#[command(
    name = "distributor_packager",
    version,
    about = "Create and upload distributor packages",
    long_about = "Downloads the osquery installers for every platform in the build matrix,
zips each platform directory into a versioned bundle, writes a checksummed
manifest.json and uploads bundles plus manifest to an S3 bucket.

Usage:
  distributor_packager -c apikey.json
  distributor_packager -c apikey.json -b my-bucket -r eu-west-1 --sensor-only
  distributor_packager --no-download -v 5.7.0.23 -b my-bucket

Exit code 0 = every artifact published, 2 = some uploads failed, 1 = fatal error."
)]
pub struct Args {
    /// Path to the API key file downloaded from the console
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Bucket receiving the bundles (default: uptycs-dist-<random>)
    #[arg(short = 'b', long = "s3bucket", value_name = "BUCKET")]
    pub bucket: Option<String>,

    /// Region the bucket is created in
    #[arg(short = 'r', long = "aws-region", value_name = "REGION", default_value = DEFAULT_REGION)]
    pub region: String,

    /// Agent version to package (default: latest offered by the download service)
    #[arg(short = 'v', long, value_name = "VERSION")]
    pub package_version: Option<String>,

    /// Package files already staged in the working directories instead of downloading them
    #[arg(short = 'd', long)]
    pub no_download: bool,

    /// Package the sensor without the protection component
    #[arg(short = 'o', long)]
    pub sensor_only: bool,

    /// Build matrix file
    #[arg(short = 'm', long, value_name = "FILE", default_value = DEFAULT_MATRIX_FILE)]
    pub matrix: PathBuf,

    /// Directory containing the per-platform working directories
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub work_dir: PathBuf,

    /// Local folder receiving the bundles and manifest.json
    #[arg(long, value_name = "DIR", default_value = DEFAULT_STAGING_DIR)]
    pub staging_dir: PathBuf,

    /// Object key prefix inside the bucket
    #[arg(long, value_name = "PREFIX", default_value = DEFAULT_OBJECT_PREFIX)]
    pub prefix: String,

    /// Deadline for each network call, in seconds
    #[arg(long, value_name = "SECS", default_value_t = 300)]
    pub timeout_secs: u64,

    /// Attempts per network call
    #[arg(long, value_name = "N", default_value_t = 3)]
    pub retries: u32,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.no_download && self.package_version.is_none() {
            return Err("--package-version is mandatory with --no-download".to_string());
        }

        let needs_service = !self.no_download || self.package_version.is_none();
        if needs_service && self.config.is_none() {
            return Err(
                "--config is required unless --no-download and --package-version are both given"
                    .to_string(),
            );
        }

        if let Some(version) = &self.package_version
            && version.trim().is_empty()
        {
            return Err("Package version cannot be empty".to_string());
        }

        if let Some(bucket) = &self.bucket
            && bucket.trim().is_empty()
        {
            return Err("Bucket name cannot be empty".to_string());
        }

        if self.retries == 0 {
            return Err("--retries must be at least 1".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("--timeout-secs must be at least 1".to_string());
        }

        Ok(())
    }

    /// The bucket to publish to, generating a name when none was given.
    pub fn bucket_name(&self) -> String {
        self.bucket.clone().unwrap_or_else(random_bucket_name)
    }
}

/// `uptycs-dist-` followed by six random lowercase letters.
pub fn random_bucket_name() -> String {
    let suffix: String = uuid::Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(6)
        .map(|b| char::from(b'a' + b % 26))
        .collect();
    format!("{BUCKET_NAME_PREFIX}{suffix}")
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(!args.quiet, args.quiet),
        }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print verbose message if in verbose mode
    pub fn verbose_println(&self, message: &str) -> std::io::Result<()> {
        self.output.verbose(message)
    }

    /// Print success message if not in quiet mode
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.output.success(message)
    }

    /// Print warning message if not in quiet mode
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.output.warn(message)
    }

    /// Print section header
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        self.output.section(title)
    }

    /// Print indented text
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.output.indent(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("distributor_packager").chain(argv.iter().copied()))
            .unwrap()
    }

    #[test]
    fn manual_mode_requires_version() {
        let args = parse(&["--no-download"]);
        assert!(args.validate().unwrap_err().contains("--package-version"));
    }

    #[test]
    fn manual_mode_with_version_needs_no_credentials() {
        let args = parse(&["-d", "-v", "5.7.0"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn download_mode_requires_credentials() {
        let args = parse(&["-v", "5.7.0"]);
        assert!(args.validate().unwrap_err().contains("--config"));
    }

    #[test]
    fn generated_bucket_names_are_lowercase() {
        let name = random_bucket_name();
        let suffix = name.strip_prefix(BUCKET_NAME_PREFIX).unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn defaults_match_conventional_layout() {
        let args = parse(&["-c", "apikey.json"]);
        assert_eq!(args.region, "us-east-1");
        assert_eq!(args.prefix, "uptycs");
        assert_eq!(args.matrix, PathBuf::from(DEFAULT_MATRIX_FILE));
        assert!(!args.sensor_only);
    }
}
