//! Command-line configuration.

use crate::packages::{dedup_names, parse_name_list, RankListParser, TOP_DEPENDENTS_URL, TOP_PAGERANK_URL};
use crate::registry::{RegistryClient, NPM_REGISTRY};
use crate::types::{HttpConfig, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Tarball size auditor for npm registry mirrors.
#[derive(Parser, Debug, Clone)]
#[command(name = "mirrorsize")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compare tarball sizes of packages across registries
    Compare(CompareConfig),
    /// Show the info document of each registry
    Info(InfoConfig),
}

/// Registry endpoints and HTTP settings shared by every command.
#[derive(Args, Debug, Clone)]
pub struct RegistryArgs {
    /// Registry base address (repeatable)
    #[arg(
        short,
        long = "registry",
        env = "MIRRORSIZE_REGISTRIES",
        value_delimiter = ',',
        default_values_t = [NPM_REGISTRY.to_string(), "https://registry.npmmirror.com".to_string()]
    )]
    pub registries: Vec<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Rate limit in requests per second (0 = unlimited)
    #[arg(long, default_value = "0")]
    pub rate_limit: u32,

    /// Custom User-Agent string
    #[arg(long)]
    pub user_agent: Option<String>,
}

impl Default for RegistryArgs {
    fn default() -> Self {
        Self {
            registries: vec![
                NPM_REGISTRY.to_string(),
                "https://registry.npmmirror.com".to_string(),
            ],
            timeout: 30,
            rate_limit: 0,
            user_agent: None,
        }
    }
}

impl RegistryArgs {
    /// Get HTTP configuration from the registry arguments.
    pub fn http_config(&self) -> HttpConfig {
        let defaults = HttpConfig::default();
        HttpConfig {
            timeout_secs: self.timeout,
            rate_limit: self.rate_limit,
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }
}

/// Configuration for the info command.
#[derive(Args, Debug, Clone, Default)]
pub struct InfoConfig {
    #[command(flatten)]
    pub registry: RegistryArgs,
}

/// Configuration for the compare command.
#[derive(Args, Debug, Clone)]
pub struct CompareConfig {
    /// Package name(s) to compare
    pub packages: Vec<String>,

    #[command(flatten)]
    pub registry: RegistryArgs,

    /// Registry preferred as reference when version counts tie
    #[arg(long, env = "MIRRORSIZE_CANONICAL", default_value = NPM_REGISTRY)]
    pub canonical: String,

    /// Do not prefer any registry on ties
    #[arg(long)]
    pub no_canonical: bool,

    /// File containing package names (one per line)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Markdown rank list URL; every [name] link text is a package
    #[arg(long, conflicts_with_all = ["top_dependents", "top_pagerank"])]
    pub rank_list: Option<String>,

    /// Use the top most depended-upon npm packages
    #[arg(long, conflicts_with = "top_pagerank")]
    pub top_dependents: bool,

    /// Use the top npm packages by page rank
    #[arg(long)]
    pub top_pagerank: bool,

    /// Quiet mode: only show packages with mismatches
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            packages: Vec::new(),
            registry: RegistryArgs::default(),
            canonical: NPM_REGISTRY.to_string(),
            no_canonical: false,
            file: None,
            rank_list: None,
            top_dependents: false,
            top_pagerank: false,
            quiet: false,
        }
    }
}

impl CompareConfig {
    /// Canonical registry address, unless disabled.
    pub fn canonical(&self) -> Option<&str> {
        if self.no_canonical {
            None
        } else {
            Some(self.canonical.as_str())
        }
    }

    /// Rank list to read package names from, if any.
    pub fn rank_list_url(&self) -> Option<&str> {
        if let Some(ref url) = self.rank_list {
            Some(url.as_str())
        } else if self.top_dependents {
            Some(TOP_DEPENDENTS_URL)
        } else if self.top_pagerank {
            Some(TOP_PAGERANK_URL)
        } else {
            None
        }
    }

    /// Gather package names from arguments, the name file and the rank list.
    pub async fn load_packages(&self, client: &RegistryClient) -> Result<Vec<String>> {
        let mut packages: Vec<String> = self
            .packages
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        if let Some(ref file_path) = self.file {
            let content = std::fs::read_to_string(file_path)?;
            packages.extend(parse_name_list(&content));
        }

        if let Some(url) = self.rank_list_url() {
            packages.extend(RankListParser::new().fetch(client, url).await?);
        }

        Ok(dedup_names(packages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Config::command().debug_assert();
    }

    #[test]
    fn test_parse_compare() {
        let config = Config::try_parse_from([
            "mirrorsize",
            "compare",
            "lodash",
            "-r",
            "https://a.example/",
            "-r",
            "https://b.example",
            "--no-canonical",
            "--rate-limit",
            "20",
        ])
        .unwrap();

        match config.command {
            Commands::Compare(compare) => {
                assert_eq!(compare.packages, vec!["lodash"]);
                assert_eq!(
                    compare.registry.registries,
                    vec!["https://a.example/", "https://b.example"]
                );
                assert_eq!(compare.canonical(), None);
                assert_eq!(compare.registry.http_config().rate_limit, 20);
            }
            _ => panic!("Expected compare command"),
        }
    }

    #[test]
    fn test_rank_list_shortcuts() {
        let config = CompareConfig {
            top_pagerank: true,
            ..Default::default()
        };
        assert_eq!(config.rank_list_url(), Some(TOP_PAGERANK_URL));
        assert_eq!(config.canonical(), Some(NPM_REGISTRY));
    }

    #[tokio::test]
    async fn test_load_packages_dedups() {
        let config = CompareConfig {
            packages: vec!["lodash".to_string(), " chalk ".to_string(), "lodash".to_string()],
            ..Default::default()
        };
        let client = RegistryClient::new(&config.registry.http_config()).unwrap();

        let packages = config.load_packages(&client).await.unwrap();
        assert_eq!(packages, vec!["lodash", "chalk"]);
    }
}
