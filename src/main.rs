//! Distributor Packager - builds and publishes osquery distributor packages.
//!
//! This binary downloads per-platform installers, bundles them, writes a
//! checksummed manifest and uploads everything to an S3 bucket.

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match distributor_packager::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{} failed: {}", e.stage(), e);
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };

    process::exit(exit_code);
}
