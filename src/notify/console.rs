//! Colored console output for comparison counts.

use crate::registry::Registry;
use crate::types::{BatchReport, PackageReport};
use colored::Colorize;

/// Console output handler with colors and formatting.
pub struct ConsoleOutput {
    quiet: bool,
}

impl ConsoleOutput {
    /// Create a new console output handler. Quiet mode only prints
    /// packages with mismatches and the total.
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// Lines shown for one package: the count line, then the registries
    /// that contributed nothing. Empty when quiet and nothing mismatched.
    fn package_lines(&self, report: &PackageReport) -> Vec<String> {
        let count = report.mismatch_count();
        if count == 0 && self.quiet {
            return Vec::new();
        }

        let marker = if count > 0 { "[!]".red().bold() } else { "[+]".green() };
        let mut lines = vec![format!(
            "{} {}: {} mismatches ({} versions)",
            marker,
            report.package.bright_white(),
            count,
            report.versions_compared
        )];

        if !report.registries_without_data.is_empty() && !self.quiet {
            lines.push(format!(
                "    +-- no data from: {}",
                report.registries_without_data.join(", ").dimmed()
            ));
        }
        lines
    }

    fn total_line(batch: &BatchReport) -> String {
        let total = batch.total_mismatches.to_string();
        format!(
            "Number of differences: {}",
            if batch.total_mismatches > 0 {
                total.red().bold()
            } else {
                total.green().bold()
            }
        )
    }

    /// Print the mismatch count for one package.
    pub fn print_package(&self, report: &PackageReport) {
        for line in self.package_lines(report) {
            println!("{}", line);
        }
    }

    /// Print every package line and the total.
    pub fn print_summary(&self, batch: &BatchReport) {
        for report in &batch.reports {
            self.print_package(report);
        }

        for (package, reason) in &batch.skipped {
            println!("{} {:?} skipped: {}", "[-]".yellow(), package, reason.dimmed());
        }

        println!();
        println!("{}", Self::total_line(batch));
    }

    /// Print a registry with its info document.
    pub fn print_registry(&self, registry: &Registry) {
        println!("{} {}", "[*]".bright_blue(), registry.base_url().bright_white());

        match registry.info() {
            Some(info) => match serde_json::to_string_pretty(info) {
                Ok(json) => println!("{}", json),
                Err(e) => println!("    {}", e.to_string().yellow()),
            },
            None => println!("    {}", "no registry info".dimmed()),
        }
    }
}
