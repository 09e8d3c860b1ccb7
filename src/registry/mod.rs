//! npm-protocol registry access.
//!
//! Handshakes with registries, fetches package version metadata and
//! probes tarball sizes.

pub mod info;
pub mod npm;

pub use info::{normalize_base_url, Registry, RegistryInfo, NPM_REGISTRY};
pub use npm::RegistryClient;
