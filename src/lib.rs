//! mirrorsize - Tarball size auditor for npm registry mirrors.
//!
//! Registry mirrors are supposed to serve byte-identical tarballs. This
//! library detects where they do not by:
//! - Fetching each package's version metadata from every registry
//! - Probing every tarball's size with HEAD requests
//! - Comparing sizes across registries, ignoring versions a mirror is
//!   missing or could not report
//!
//! # Example
//!
//! ```no_run
//! use mirrorsize::{Auditor, HttpConfig, RegistryClient};
//!
//! #[tokio::main]
//! async fn main() -> mirrorsize::Result<()> {
//!     let client = RegistryClient::new(&HttpConfig::default())?;
//!     let registries = client
//!         .connect_all(&[
//!             "https://registry.npmjs.com".to_string(),
//!             "https://registry.npmmirror.com".to_string(),
//!         ])
//!         .await?;
//!
//!     let auditor = Auditor::new(client, registries)
//!         .with_canonical(Some(mirrorsize::registry::NPM_REGISTRY))?;
//!     let report = auditor.compare_package("lodash").await?;
//!     println!("{} mismatches", report.mismatch_count());
//!     Ok(())
//! }
//! ```

pub mod auditor;
pub mod compare;
pub mod config;
pub mod notify;
pub mod packages;
pub mod registry;
pub mod sizes;
pub mod types;

pub use auditor::Auditor;
pub use config::{Commands, CompareConfig, Config, InfoConfig};
pub use registry::{Registry, RegistryClient};
pub use types::{
    AuditError, BatchReport, ComparisonRecord, HttpConfig, PackageReport, Result, SizeMapping,
    SIZE_UNKNOWN,
};
