//! Package name sources: plain lists, name files and markdown rank lists.

use crate::registry::RegistryClient;
use crate::types::Result;
use regex::Regex;
use std::collections::HashSet;
use tracing::info;

/// anvaka's "most depended-upon" npm rank list.
pub const TOP_DEPENDENTS_URL: &str = "https://gist.githubusercontent.com/anvaka/8e8fa57c7ee1350e3491/raw/8bafd425f48f713c1629bad6ef199fddd9fb2216/01.most-dependent-upon.md";

/// anvaka's npm page rank list.
pub const TOP_PAGERANK_URL: &str = "https://gist.githubusercontent.com/anvaka/8e8fa57c7ee1350e3491/raw/dbab7af56bd09a458a99618ce7a9cc0c62d852f1/03.pagerank.md";

/// Parser for markdown rank lists such as:
///
/// ```text
/// # Top 1000 most depended-upon packages
/// 0. [lodash](https://www.npmjs.org/package/lodash) - 50647
/// 1. [request](https://www.npmjs.org/package/request) - 29350
/// ```
///
/// Every bracketed link text is taken as a package name.
#[derive(Clone)]
pub struct RankListParser {
    link_text: Regex,
}

impl Default for RankListParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RankListParser {
    pub fn new() -> Self {
        Self {
            link_text: Regex::new(r"\[(.*?)\]").unwrap(),
        }
    }

    pub fn parse(&self, markdown: &str) -> Vec<String> {
        self.link_text
            .captures_iter(markdown)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Download a rank list and parse it.
    pub async fn fetch(&self, client: &RegistryClient, url: &str) -> Result<Vec<String>> {
        info!("Getting packages from {}", url);
        let markdown = client.get_text(url).await?;
        let names = self.parse(&markdown);
        info!("Processed {} packages", names.len());
        Ok(names)
    }
}

/// Package names from a file, one per line. Blank lines and `#` comments
/// are skipped.
pub fn parse_name_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Drop repeated names, keeping the first occurrence of each.
pub fn dedup_names(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
