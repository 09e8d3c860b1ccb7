//! HTTP client for npm-protocol registries and their tarball hosts.

use crate::registry::info::{normalize_base_url, Registry, RegistryInfo};
use crate::types::{AuditError, HttpConfig, Result, TarballMap, SIZE_UNKNOWN};
use governor::{Quota, RateLimiter};
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Full package document from `GET {base}/{package}`; only the parts we read.
#[derive(Debug, Deserialize)]
struct PackageMetadata {
    #[serde(default)]
    versions: BTreeMap<String, VersionMetadata>,
}

#[derive(Debug, Deserialize)]
struct VersionMetadata {
    dist: Option<DistInfo>,
}

#[derive(Debug, Deserialize)]
struct DistInfo {
    tarball: Option<String>,
}

type DirectLimiter =
    RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>;

/// Client shared by every metadata fetch and size probe of a run.
///
/// Cloning is cheap; clones share the connection pool and the rate limiter.
#[derive(Clone)]
pub struct RegistryClient {
    client: Client,
    rate_limiter: Option<Arc<DirectLimiter>>,
}

impl RegistryClient {
    /// Create a new registry client.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .http1_only() // Force HTTP/1.1 to avoid HTTP/2 stream limit issues
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        let rate_limiter = NonZeroU32::new(config.rate_limit)
            .map(|rate| Arc::new(RateLimiter::direct(Quota::per_second(rate))));

        Ok(Self {
            client,
            rate_limiter,
        })
    }

    async fn throttle(&self) {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.until_ready().await;
        }
    }

    /// Normalize `base_url` and perform the registry handshake.
    ///
    /// Only an invalid address is an error. A registry that does not answer
    /// `GET /` is still returned, without info, so metadata calls can decide
    /// whether it is usable.
    pub async fn connect(&self, base_url: &str) -> Result<Registry> {
        let registry = Registry::new(base_url)?;
        info!("Connecting to {}", registry.base_url());

        match self.registry_info(registry.base_url()).await {
            Ok(info) => {
                let registry = registry.with_info(info);
                info!("Connected to {}", registry);
                Ok(registry)
            }
            Err(e) => {
                warn!("Handshake with {} failed: {}", registry.base_url(), e);
                Ok(registry)
            }
        }
    }

    /// Connect to every address in order. Fails on the first invalid address.
    pub async fn connect_all(&self, base_urls: &[String]) -> Result<Vec<Registry>> {
        let mut registries = Vec::with_capacity(base_urls.len());
        for base_url in base_urls {
            registries.push(self.connect(base_url).await?);
        }
        Ok(registries)
    }

    /// Fetch the registry info document served at the base address.
    pub async fn registry_info(&self, base_url: &str) -> Result<RegistryInfo> {
        let base_url = normalize_base_url(base_url)?;
        let body = self.get_text(&base_url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch every published version of `package` with its tarball address.
    ///
    /// Versions whose metadata carries no tarball address are left out.
    pub async fn fetch_versions(&self, registry: &Registry, package: &str) -> Result<TarballMap> {
        if package.is_empty() {
            return Err(AuditError::InvalidInput("empty package name".to_string()));
        }

        let url = format!("{}/{}", registry.base_url(), encode_package_name(package));
        trace!("Fetching metadata: {}", url);

        self.throttle().await;
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AuditError::PackageNotFound {
                registry: registry.base_url().to_string(),
                package: package.to_string(),
            });
        }
        if !status.is_success() {
            return Err(AuditError::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let metadata: PackageMetadata = serde_json::from_str(&body)?;

        let versions: TarballMap = metadata
            .versions
            .into_iter()
            .filter_map(|(version, meta)| {
                match meta.dist.and_then(|d| d.tarball) {
                    Some(tarball) if !tarball.is_empty() => Some((version, tarball)),
                    _ => {
                        trace!("No tarball for {}@{} on {}", package, version, registry.base_url());
                        None
                    }
                }
            })
            .collect();

        debug!(
            "{} lists {} versions of {}",
            registry.base_url(),
            versions.len(),
            package
        );
        Ok(versions)
    }

    /// Probe a tarball's size with a HEAD request.
    ///
    /// Returns the `Content-Length` header as reported (0 included), or
    /// `SIZE_UNKNOWN` when the origin did not send a usable one. Transport
    /// errors and non-success statuses are errors.
    pub async fn probe_size(&self, tarball_url: &str) -> Result<i64> {
        self.throttle().await;

        let response = self
            .client
            .head(tarball_url)
            .send()
            .await
            .map_err(|e| AuditError::ProbeFailed {
                url: tarball_url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(AuditError::ProbeFailed {
                url: tarball_url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        // Read the header itself: the body of a HEAD response is always empty,
        // so the body length hint would report 0.
        let size = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(SIZE_UNKNOWN);

        trace!("{} -> {} bytes", tarball_url, size);
        Ok(size)
    }

    /// GET a URL and return the body as text, failing on non-success statuses.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        self.throttle().await;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AuditError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Encode a package name for the metadata path. Scoped names keep their
/// leading `@` and get the separating `/` escaped.
pub fn encode_package_name(package: &str) -> String {
    match package.strip_prefix('@') {
        Some(scoped) => format!("@{}", urlencoding::encode(scoped)),
        None => urlencoding::encode(package).into_owned(),
    }
}
