//! Core types and errors for the mirror size auditor.

use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur while auditing registries.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Package {package} not found on {registry}")]
    PackageNotFound { registry: String, package: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Size probe failed for {url}: {reason}")]
    ProbeFailed { url: String, reason: String },

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, AuditError>;

/// Size recorded when a registry could not report a tarball length.
pub const SIZE_UNKNOWN: i64 = -1;

/// Version identifier to tarball address, as published by one registry.
pub type TarballMap = BTreeMap<String, String>;

/// Version identifier to tarball byte size, for one registry and package.
pub type SizeMapping = BTreeMap<String, i64>;

/// A confirmed size mismatch between two registries for one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRecord {
    pub package: String,
    pub version: String,
    /// Base address of the reference registry.
    pub registry_a: String,
    pub size_a: i64,
    /// Base address of the registry compared against the reference.
    pub registry_b: String,
    pub size_b: i64,
}

impl ComparisonRecord {
    /// Conventional npm tarball address for this record's version on `registry`.
    ///
    /// The file part drops the scope: `@scope/pkg` 1.0.0 lives at
    /// `{registry}/@scope/pkg/-/pkg-1.0.0.tgz`.
    pub fn tarball_hint(&self, registry: &str) -> String {
        let file_stem = self.package.rsplit('/').next().unwrap_or(&self.package);
        format!(
            "{}/{}/-/{}-{}.tgz",
            registry, self.package, file_stem, self.version
        )
    }
}

/// Outcome of comparing one package across every registry.
#[derive(Debug, Clone, Default)]
pub struct PackageReport {
    pub package: String,
    /// Registry that drove the comparison, if any registry was supplied.
    pub reference: Option<String>,
    /// Number of versions known to the reference registry.
    pub versions_compared: usize,
    pub mismatches: Vec<ComparisonRecord>,
    /// Registries that contributed no sizes at all (unreachable or empty).
    /// A zero count alongside entries here means "suppressed", not "identical".
    pub registries_without_data: Vec<String>,
}

impl PackageReport {
    pub fn mismatch_count(&self) -> usize {
        self.mismatches.len()
    }
}

/// Aggregate result of a batch comparison.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub reports: Vec<PackageReport>,
    /// Packages skipped because their comparison failed, with the reason.
    pub skipped: Vec<(String, String)>,
    pub total_mismatches: usize,
}

/// Configuration for HTTP requests.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Requests per second across one client; 0 disables throttling.
    pub rate_limit: u32,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            rate_limit: 0,
            user_agent: "mirrorsize/0.1".to_string(),
        }
    }
}
