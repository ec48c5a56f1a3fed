use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

mod config;
mod constants;
mod error;
mod extract;
mod flights;
mod geocode;
mod logging;
mod matrix;
mod pipeline;
mod registry;
mod resolver;
mod serialize;

use crate::config::Config;
use crate::geocode::Geocoder;

#[derive(Parser)]
#[command(name = "country_pipeline")]
#[command(about = "Country border, code and flight-route reference data pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the run configuration
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the adjacency artifacts (JSON, CSV grid, data module)
    Adjacency,
    /// Build the flight-travel data module
    Travel,
    /// Build every artifact sequentially
    All,
    /// List every name in the border table with its resolution
    CheckNames,
    /// Look up country coordinates from the geocoding service
    Geocode {
        /// Country name to look up
        name: String,
    },
}

fn run_adjacency(config: &Config) -> anyhow::Result<()> {
    let report = pipeline::run_adjacency(config).context("adjacency build failed")?;
    info!("Adjacency build finished");
    println!("\n📊 Adjacency results:");
    println!("   Entries extracted: {}", report.entries_extracted);
    println!("   Entries resolved: {}", report.entries_resolved);
    println!("   Entries dropped: {}", report.entries_dropped);
    Ok(())
}

fn run_travel(config: &Config) -> anyhow::Result<()> {
    let report = pipeline::run_travel(config).context("travel build failed")?;
    info!("Travel build finished");
    println!("\n📊 Travel results:");
    println!("   Matrix size: {}", report.matrix_size);
    println!("   Countries emitted: {}", report.countries_emitted);
    println!("   Countries skipped: {}", report.countries_skipped);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // The guard must outlive the run so buffered log lines get flushed
    let _guard = logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("cannot load configuration from {}", cli.config.display()))?;

    match cli.command {
        Commands::Adjacency => {
            println!("🔄 Building adjacency artifacts...");
            run_adjacency(&config)?;
            println!("✅ Adjacency build completed");
        }
        Commands::Travel => {
            println!("🔄 Building travel artifact...");
            run_travel(&config)?;
            println!("✅ Travel build completed");
        }
        Commands::All => {
            println!("🔄 Building all artifacts...");
            run_adjacency(&config)?;
            run_travel(&config)?;
            println!("✅ All artifacts completed");
        }
        Commands::CheckNames => {
            let resolutions = pipeline::check_names(&config)?;
            let mut unresolved = 0;
            for (name, code) in &resolutions {
                match code {
                    Some(code) => println!(": {} = {}", name, code),
                    None => {
                        println!("  :(): {}", name);
                        unresolved += 1;
                    }
                }
            }
            if unresolved > 0 {
                println!("\n⚠️  {} unresolved names", unresolved);
            }
        }
        Commands::Geocode { name } => {
            let timeout = Duration::from_secs(config.geocoder.timeout_seconds);
            let geocoder = Geocoder::new(timeout)?;
            let (latitude, longitude) = geocoder.country_coordinates(&name)?;
            println!("{}: ({}, {})", name, latitude, longitude);
        }
    }

    Ok(())
}
