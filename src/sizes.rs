//! Tarball size collection.
//!
//! Two fan-out levels live here. [`fetch_all_sizes`] spawns one task per
//! registry, each returning its own [`SizeMapping`] to the joiner.
//! [`collect_sizes`] spawns one probe per version, all writing into a single
//! shared map that is only read after every probe has finished.

use crate::registry::{Registry, RegistryClient};
use crate::types::{SizeMapping, TarballMap};
use dashmap::DashMap;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Probe every tarball address concurrently and collect version sizes.
///
/// A version whose probe fails is absent from the result. It is never
/// recorded as 0 or as the unknown sentinel. A successful reply without a
/// usable `Content-Length` is kept as `SIZE_UNKNOWN`.
pub async fn collect_sizes(client: &RegistryClient, package: &str, tarballs: TarballMap) -> SizeMapping {
    let sizes: Arc<DashMap<String, i64>> = Arc::new(DashMap::with_capacity(tarballs.len()));

    let tasks: Vec<_> = tarballs
        .into_iter()
        .map(|(version, tarball_url)| {
            let client = client.clone();
            let sizes = Arc::clone(&sizes);
            let package = package.to_string();

            tokio::spawn(async move {
                match client.probe_size(&tarball_url).await {
                    Ok(size) => {
                        sizes.insert(version, size);
                    }
                    Err(e) => debug!("No size for {}@{}: {}", package, version, e),
                }
            })
        })
        .collect();

    // Every probe must finish before the map is handed out.
    for task in tasks {
        if let Err(e) = task.await {
            debug!("Probe task join error: {}", e);
        }
    }

    let sizes = Arc::try_unwrap(sizes).unwrap_or_else(|shared| (*shared).clone());
    sizes.into_iter().collect()
}

/// Fetch metadata for `package` from one registry and probe every tarball.
///
/// Unavailable metadata yields an empty mapping so the comparison can go on
/// with the remaining registries.
pub async fn fetch_registry_sizes(client: &RegistryClient, registry: &Registry, package: &str) -> SizeMapping {
    info!("Retrieving {} sizes from {}", package, registry.base_url());

    let tarballs = match client.fetch_versions(registry, package).await {
        Ok(tarballs) => tarballs,
        Err(e) => {
            warn!(
                "Metadata unavailable for {} on {}: {}",
                package,
                registry.base_url(),
                e
            );
            return SizeMapping::new();
        }
    };

    let listed = tarballs.len();
    let sizes = collect_sizes(client, package, tarballs).await;

    info!(
        "Retrieved {} sizes from {} ({}/{} probes succeeded)",
        package,
        registry.base_url(),
        sizes.len(),
        listed
    );
    sizes
}

/// Fetch size mappings from every registry concurrently.
///
/// The result is aligned with `registries`. A registry task that panics
/// contributes an empty mapping.
pub async fn fetch_all_sizes(
    client: &RegistryClient,
    registries: &[Arc<Registry>],
    package: &str,
) -> Vec<SizeMapping> {
    let tasks = registries.iter().map(|registry| {
        let client = client.clone();
        let registry = Arc::clone(registry);
        let package = package.to_string();

        tokio::spawn(async move { fetch_registry_sizes(&client, &registry, &package).await })
    });

    join_all(tasks)
        .await
        .into_iter()
        .zip(registries)
        .map(|(joined, registry)| {
            joined.unwrap_or_else(|e| {
                warn!("Size task for {} failed: {}", registry.base_url(), e);
                SizeMapping::new()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HttpConfig, SIZE_UNKNOWN};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Answer every connection with `head` verbatim. Mock servers always set
    /// their own Content-Length, so header edge cases need a bare socket.
    async fn serve_raw(head: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    let _ = stream.write_all(head.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        format!("http://{}", addr)
    }

    fn single_tarball(base: &str) -> TarballMap {
        let mut tarballs = TarballMap::new();
        tarballs.insert("1.0.0".to_string(), format!("{}/demo/-/demo-1.0.0.tgz", base));
        tarballs
    }

    fn test_client() -> RegistryClient {
        RegistryClient::new(&HttpConfig::default()).unwrap()
    }

    async fn mount_tarball(server: &MockServer, file: &str, size: usize) {
        Mock::given(method("HEAD"))
            .and(path(format!("/demo/-/{}", file)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![0u8; size])
                    .insert_header("content-length", size.to_string().as_str()),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_collect_sizes_empty_input() {
        let sizes = collect_sizes(&test_client(), "demo", TarballMap::new()).await;
        assert!(sizes.is_empty());
    }

    #[tokio::test]
    async fn test_collect_sizes_omits_failed_probes() {
        let server = MockServer::start().await;
        mount_tarball(&server, "demo-1.0.0.tgz", 100).await;
        mount_tarball(&server, "demo-1.1.0.tgz", 250).await;
        Mock::given(method("HEAD"))
            .and(path("/demo/-/demo-2.0.0.tgz"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut tarballs = TarballMap::new();
        for version in ["1.0.0", "1.1.0", "2.0.0"] {
            tarballs.insert(
                version.to_string(),
                format!("{}/demo/-/demo-{}.tgz", server.uri(), version),
            );
        }
        // Nothing listens on port 9 of localhost; the probe fails outright.
        tarballs.insert("3.0.0".to_string(), "http://127.0.0.1:9/demo-3.0.0.tgz".to_string());

        let sizes = collect_sizes(&test_client(), "demo", tarballs).await;

        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes.get("1.0.0"), Some(&100));
        assert_eq!(sizes.get("1.1.0"), Some(&250));
        assert!(!sizes.contains_key("2.0.0"));
        assert!(!sizes.contains_key("3.0.0"));
        assert!(sizes.values().all(|&s| s != SIZE_UNKNOWN));
    }

    #[tokio::test]
    async fn test_collect_sizes_missing_content_length() {
        let base = serve_raw("HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n").await;

        let client = test_client();
        let url = format!("{}/demo/-/demo-1.0.0.tgz", base);
        assert_eq!(client.probe_size(&url).await.unwrap(), SIZE_UNKNOWN);

        let sizes = collect_sizes(&client, "demo", single_tarball(&base)).await;
        assert_eq!(sizes.len(), 1);
        assert_eq!(sizes.get("1.0.0"), Some(&SIZE_UNKNOWN));
    }

    #[tokio::test]
    async fn test_collect_sizes_keeps_zero_length() {
        let base =
            serve_raw("HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;

        let client = test_client();
        let url = format!("{}/demo/-/demo-1.0.0.tgz", base);
        assert_eq!(client.probe_size(&url).await.unwrap(), 0);

        let sizes = collect_sizes(&client, "demo", single_tarball(&base)).await;
        assert_eq!(sizes.len(), 1);
        assert_eq!(sizes.get("1.0.0"), Some(&0));
    }

    #[tokio::test]
    async fn test_fetch_registry_sizes_metadata_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let registry = Registry::new(&server.uri()).unwrap();
        let sizes = fetch_registry_sizes(&test_client(), &registry, "demo").await;

        assert!(sizes.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_sizes_aligned_with_registries() {
        let good = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "versions": {
                    "1.0.0": { "dist": { "tarball": format!("{}/demo/-/demo-1.0.0.tgz", good.uri()) } }
                }
            })))
            .mount(&good)
            .await;
        mount_tarball(&good, "demo-1.0.0.tgz", 100).await;

        let missing = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&missing)
            .await;

        let registries = vec![
            Arc::new(Registry::new(&missing.uri()).unwrap()),
            Arc::new(Registry::new(&good.uri()).unwrap()),
        ];
        let all = fetch_all_sizes(&test_client(), &registries, "demo").await;

        assert_eq!(all.len(), 2);
        assert!(all[0].is_empty());
        assert_eq!(all[1].get("1.0.0"), Some(&100));
    }
}
