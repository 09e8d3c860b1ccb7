//! Auditor orchestrating size collection and comparison across registries.

use crate::compare::{compare_sizes, RegistrySizes};
use crate::registry::{normalize_base_url, Registry, RegistryClient};
use crate::sizes::fetch_all_sizes;
use crate::types::{AuditError, BatchReport, PackageReport, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Compares tarball sizes of packages across a fixed set of registries.
pub struct Auditor {
    client: RegistryClient,
    registries: Vec<Arc<Registry>>,
    canonical: Option<String>,
}

impl Auditor {
    /// Create an auditor over already-connected registries.
    pub fn new(client: RegistryClient, registries: Vec<Registry>) -> Self {
        Self {
            client,
            registries: registries.into_iter().map(Arc::new).collect(),
            canonical: None,
        }
    }

    /// Set the registry preferred as reference when version counts tie.
    pub fn with_canonical(mut self, canonical: Option<&str>) -> Result<Self> {
        self.canonical = canonical.map(normalize_base_url).transpose()?;
        Ok(self)
    }

    /// Compare one package across every registry.
    pub async fn compare_package(&self, package: &str) -> Result<PackageReport> {
        if package.is_empty() {
            return Err(AuditError::InvalidInput("empty package name".to_string()));
        }
        info!("Comparing package {}", package);

        let sizes = fetch_all_sizes(&self.client, &self.registries, package).await;
        let results: Vec<RegistrySizes> = self
            .registries
            .iter()
            .zip(sizes)
            .map(|(registry, sizes)| RegistrySizes::new(registry.base_url(), sizes))
            .collect();

        let report = compare_sizes(package, &results, self.canonical.as_deref())?;
        info!(
            "Finished comparing {}: {} mismatches",
            package,
            report.mismatch_count()
        );
        Ok(report)
    }

    /// Compare every package in order and sum the mismatches.
    ///
    /// A package that fails is logged and skipped. Only an empty list fails.
    pub async fn compare_packages(&self, packages: &[String]) -> Result<BatchReport> {
        if packages.is_empty() {
            return Err(AuditError::InvalidInput("package list is empty".to_string()));
        }
        info!("Comparing {} packages across {} registries", packages.len(), self.registries.len());

        let mut batch = BatchReport::default();
        for package in packages {
            match self.compare_package(package).await {
                Ok(report) => {
                    batch.total_mismatches += report.mismatch_count();
                    batch.reports.push(report);
                }
                Err(e) => {
                    warn!("Error comparing package {:?}: {}", package, e);
                    batch.skipped.push((package.clone(), e.to_string()));
                }
            }
        }

        info!(
            "Compared {} packages, {} skipped, {} mismatches",
            batch.reports.len(),
            batch.skipped.len(),
            batch.total_mismatches
        );
        Ok(batch)
    }
}
