//! Cross-registry tarball size comparison.

use crate::types::{AuditError, ComparisonRecord, PackageReport, Result, SizeMapping, SIZE_UNKNOWN};
use tracing::{info, warn};

/// Sizes reported by one registry for one package.
#[derive(Debug, Clone)]
pub struct RegistrySizes {
    /// Normalized base address of the registry.
    pub registry: String,
    pub sizes: SizeMapping,
}

impl RegistrySizes {
    pub fn new(registry: impl Into<String>, sizes: SizeMapping) -> Self {
        Self {
            registry: registry.into(),
            sizes,
        }
    }

    /// Size for `version`, or `SIZE_UNKNOWN` when this registry has none.
    pub fn size_of(&self, version: &str) -> i64 {
        self.sizes.get(version).copied().unwrap_or(SIZE_UNKNOWN)
    }
}

/// Index of the registry whose mapping knows the most versions.
///
/// On a tie the canonical registry wins if it is among the tied, otherwise
/// the first one in list order. `None` only for an empty list.
pub fn select_reference(results: &[RegistrySizes], canonical: Option<&str>) -> Option<usize> {
    let is_canonical = |r: &RegistrySizes| canonical == Some(r.registry.as_str());

    let mut best: Option<usize> = None;
    for (idx, candidate) in results.iter().enumerate() {
        let Some(best_idx) = best else {
            best = Some(idx);
            continue;
        };
        let current = &results[best_idx];

        let more = candidate.sizes.len() > current.sizes.len();
        let tie_to_canonical = candidate.sizes.len() == current.sizes.len()
            && is_canonical(candidate)
            && !is_canonical(current);

        if more || tie_to_canonical {
            best = Some(idx);
        }
    }
    best
}

/// Whether two sizes for the same version count as a real mismatch.
///
/// A 0 or `SIZE_UNKNOWN` on either side means the version is missing, still
/// syncing or was not probed, so it never counts. Any other reported value
/// takes part as is.
pub fn is_mismatch(a: i64, b: i64) -> bool {
    a != SIZE_UNKNOWN && b != SIZE_UNKNOWN && a != 0 && b != 0 && a != b
}

/// Compare every registry against the reference registry for one package.
///
/// The reference (see [`select_reference`]) drives iteration: each of its
/// versions is checked against every other registry, where a missing version
/// reads as `SIZE_UNKNOWN`.
pub fn compare_sizes(package: &str, results: &[RegistrySizes], canonical: Option<&str>) -> Result<PackageReport> {
    if package.is_empty() {
        return Err(AuditError::InvalidInput("empty package name".to_string()));
    }

    let mut report = PackageReport {
        package: package.to_string(),
        registries_without_data: results
            .iter()
            .filter(|r| r.sizes.is_empty())
            .map(|r| r.registry.clone())
            .collect(),
        ..Default::default()
    };

    let Some(reference_idx) = select_reference(results, canonical) else {
        return Ok(report);
    };
    let reference = &results[reference_idx];

    info!(
        "Reference registry for {}: {} ({} versions)",
        package,
        reference.registry,
        reference.sizes.len()
    );
    report.reference = Some(reference.registry.clone());
    report.versions_compared = reference.sizes.len();

    for (other_idx, other) in results.iter().enumerate() {
        if other_idx == reference_idx {
            continue;
        }

        for (version, &size_a) in &reference.sizes {
            let size_b = other.size_of(version);
            if !is_mismatch(size_a, size_b) {
                continue;
            }

            let record = ComparisonRecord {
                package: package.to_string(),
                version: version.clone(),
                registry_a: reference.registry.clone(),
                size_a,
                registry_b: other.registry.clone(),
                size_b,
            };

            warn!("Sizes do not match for {}@{}", package, version);
            warn!("  {} bytes - {}", size_a, record.tarball_hint(&record.registry_a));
            warn!("  {} bytes - {}", size_b, record.tarball_hint(&record.registry_b));

            report.mismatches.push(record);
        }
    }

    if !report.registries_without_data.is_empty() {
        warn!(
            "No sizes for {} from: {}",
            package,
            report.registries_without_data.join(", ")
        );
    }

    Ok(report)
}
