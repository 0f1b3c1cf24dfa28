use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::*;
use config::{Config, OutputFormat};

#[derive(Parser)]
#[command(name = "nearby")]
#[command(author, version, about = "Nearby - find the closest restaurants, with a query cache", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the three closest restaurants to a location
    Search {
        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Only consider this cuisine
        #[arg(short = 'k', long)]
        cuisine: Option<String>,

        /// Restaurant collection (newline-delimited JSON)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Query cache file
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,
    },

    /// List the cuisines present in the collection
    Cuisines {
        /// Restaurant collection (newline-delimited JSON)
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// Show the state of the query cache
    CacheStats {
        /// Query cache file
        #[arg(long)]
        cache: Option<PathBuf>,
    },

    /// Remove every cached query
    CacheClear {
        /// Query cache file
        #[arg(long)]
        cache: Option<PathBuf>,
    },

    /// Write the active configuration to a file
    InitConfig {
        /// Destination file
        #[arg(default_value = "nearby.json")]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose)?;

    // Load configuration
    let config = if let Some(config_path) = cli.config {
        Config::from_file(&config_path)?
    } else {
        Config::default()
    };

    let json_output = match &cli.command {
        Commands::Search { output, .. } => {
            output.unwrap_or(config.output_format) == OutputFormat::Json
        }
        _ => false,
    };

    if !json_output {
        print_banner();
    }

    // Execute command
    match cli.command {
        Commands::Search {
            lat,
            lon,
            cuisine,
            data,
            cache,
            output,
        } => {
            let data = data.unwrap_or_else(|| config.data_path.clone());
            let cache = cache.unwrap_or_else(|| config.cache_path.clone());
            search(
                &config,
                SearchRequest {
                    latitude: lat,
                    longitude: lon,
                    cuisine: cuisine.as_deref(),
                    data: &data,
                    cache: &cache,
                    output: output.unwrap_or(config.output_format),
                },
            )?;
        }
        Commands::Cuisines { data } => {
            let data = data.unwrap_or_else(|| config.data_path.clone());
            list_cuisines(&config, &data)?;
        }
        Commands::CacheStats { cache } => {
            let cache = cache.unwrap_or_else(|| config.cache_path.clone());
            cache_stats(&config, &cache)?;
        }
        Commands::CacheClear { cache } => {
            let cache = cache.unwrap_or_else(|| config.cache_path.clone());
            cache_clear(&cache)?;
        }
        Commands::InitConfig { path } => {
            init_config(&config, &path)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        "nearby_cli=debug,nearby_core=debug,nearby_storage=debug,nearby_cache=debug,nearby_search=debug"
    } else {
        "warn,nearby_cli=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        r#"
  _   _                 _
 | \ | | ___  __ _ _ __| |__  _   _
 |  \| |/ _ \/ _` | '__| '_ \| | | |
 | |\  |  __/ (_| | |  | |_) | |_| |
 |_| \_|\___|\__,_|_|  |_.__/ \__, |
                              |___/
    "#
        .bright_cyan()
    );
    println!(
        "{}",
        "Closest restaurants, New York City v0.1.0".bright_yellow()
    );
}
