//! Registry identity and the handshake document served at `GET /`.

use crate::types::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Address of the authoritative npm registry.
pub const NPM_REGISTRY: &str = "https://registry.npmjs.com";

/// Registry database info returned by `GET {base}`.
///
/// Mirrors differ in which of these they report, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_del_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_seq: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purge_seq: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compact_running: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_format_version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committed_update_seq: Option<serde_json::Value>,
}

/// One registry endpoint. Immutable once connected.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    base_url: String,
    info: Option<RegistryInfo>,
}

impl Registry {
    /// Create a registry without performing the handshake.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            info: None,
        })
    }

    pub fn with_info(mut self, info: RegistryInfo) -> Self {
        self.info = Some(info);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn info(&self) -> Option<&RegistryInfo> {
        self.info.as_ref()
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.info {
            Some(info) => write!(
                f,
                "{} (db_name: {}, doc_count: {})",
                self.base_url,
                info.db_name.as_deref().unwrap_or("-"),
                info.doc_count
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string())
            ),
            None => f.write_str(&self.base_url),
        }
    }
}

/// Normalize a registry base address: trimmed, no trailing `/`, absolute http(s).
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(AuditError::ConfigError("empty registry address".to_string()));
    }

    let parsed = Url::parse(trimmed)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AuditError::ConfigError(format!(
            "unsupported registry scheme '{}' in {}",
            parsed.scheme(),
            trimmed
        )));
    }

    Ok(trimmed.to_string())
}
