//! mirrorsize - Tarball size auditor for npm registry mirrors.
//!
//! CLI entry point.

use clap::Parser;
use mirrorsize::notify::ConsoleOutput;
use mirrorsize::{Auditor, Commands, CompareConfig, Config, InfoConfig, RegistryClient};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Set up logging
    let filter = if config.verbose {
        EnvFilter::new("mirrorsize=debug,info")
    } else {
        EnvFilter::new("mirrorsize=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match config.command.clone() {
        Commands::Compare(compare_config) => run_compare(compare_config).await,
        Commands::Info(info_config) => run_info(info_config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => code,
    }
}

async fn run_compare(config: CompareConfig) -> Result<(), ExitCode> {
    let client = match RegistryClient::new(&config.registry.http_config()) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    let packages = match config.load_packages(&client).await {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to load packages: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    if packages.is_empty() {
        error!("No packages specified. Use positional arguments, -f <file> or a rank list.");
        return Err(ExitCode::FAILURE);
    }

    let registries = match client.connect_all(&config.registry.registries).await {
        Ok(r) => r,
        Err(e) => {
            error!("Invalid registry: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    let auditor = match Auditor::new(client, registries).with_canonical(config.canonical()) {
        Ok(a) => a,
        Err(e) => {
            error!("Invalid canonical registry: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    let batch = match auditor.compare_packages(&packages).await {
        Ok(b) => b,
        Err(e) => {
            error!("Comparison failed: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    ConsoleOutput::new(config.quiet).print_summary(&batch);
    Ok(())
}

async fn run_info(config: InfoConfig) -> Result<(), ExitCode> {
    let client = match RegistryClient::new(&config.registry.http_config()) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    let registries = match client.connect_all(&config.registry.registries).await {
        Ok(r) => r,
        Err(e) => {
            error!("Invalid registry: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    let console = ConsoleOutput::new(false);
    for registry in &registries {
        console.print_registry(registry);
    }
    Ok(())
}
