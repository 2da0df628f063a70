//! Test fixtures and environment helpers.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use tempfile::TempDir;
use visamap_core::{PolicyCode, PolicyEntry};

/// Admin password used by suites that wire a gateway or publisher.
pub const ADMIN_PASSWORD: &str = "correct-horse";

/// Returns `true` if a Docker daemon is reachable for integration tests.
#[must_use]
pub fn docker_available() -> bool {
    docker_available_with_host(std::env::var("DOCKER_HOST").ok())
}

fn docker_available_with_host(host: Option<String>) -> bool {
    if let Some(host) = host {
        if let Some(path) = host.strip_prefix("unix://") {
            return Path::new(path).exists();
        }
        return true;
    }

    Path::new("/var/run/docker.sock").exists()
        || Command::new("docker")
            .args(["info"])
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
}

/// Build a policy row.
#[must_use]
pub fn entry(origin: &str, destination: &str, code: PolicyCode, duration_days: u32) -> PolicyEntry {
    PolicyEntry {
        origin: origin.to_string(),
        destination: destination.to_string(),
        policy_code: code,
        duration_days,
    }
}

/// Small two-origin data set covering freedom-of-movement, visa-free, and ETA rows.
#[must_use]
pub fn sample_entries() -> Vec<PolicyEntry> {
    vec![
        entry("Germany", "Canada", PolicyCode::Eta, 180),
        entry("Germany", "France", PolicyCode::EuFreedom, 0),
        entry("Germany", "Germany", PolicyCode::HomeCountry, 0),
        entry("Japan", "Canada", PolicyCode::Eta, 180),
        entry("Japan", "Chile", PolicyCode::VisaFree, 90),
    ]
}

/// Create a scratch directory that is removed when the handle drops.
///
/// # Errors
///
/// Returns an error if the temporary directory cannot be created.
pub fn scratch_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("visamap-")
        .tempdir()
        .context("failed to create scratch directory")
}
