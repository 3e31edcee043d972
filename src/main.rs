//! Binary entry point for the `hazardwatch` command-line tool

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hazardwatch::cache;
use hazardwatch::config::HazardWatchConfig;
use hazardwatch::hazards::HazardKind;
use hazardwatch::report::{self, ForecastMode, ReportRequest};
use hazardwatch::web;

#[derive(Debug, Parser)]
#[command(name = "hazardwatch", version, about = "Philippine weather and hazard monitor")]
struct Cli {
    /// Path to an alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a weather and hazard report to the terminal
    Report {
        /// City or municipality to geocode; falls back to the configured
        /// default location when not found
        #[arg(long)]
        place: Option<String>,

        /// Latitude override (used with --lon)
        #[arg(long, requires = "lon")]
        lat: Option<f64>,

        /// Longitude override (used with --lat)
        #[arg(long, requires = "lat")]
        lon: Option<f64>,

        /// Forecast panel to render
        #[arg(long, value_enum, default_value = "current")]
        mode: ForecastMode,

        /// Hazard layers to summarize
        #[arg(long, value_enum, value_delimiter = ',', default_value = "flood,landslide")]
        hazards: Vec<HazardKind>,

        /// Skip the typhoon track panel
        #[arg(long)]
        no_cyclones: bool,
    },

    /// Serve the web dashboard
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },

    /// Cache maintenance
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Debug, Subcommand)]
enum CacheAction {
    /// Drop every cached feed response
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = HazardWatchConfig::load_from_path(cli.config.clone())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("hazardwatch={}", config.logging.level))),
        )
        .init();

    cache::init(config.cache_dir())?;

    match cli.command {
        Command::Report {
            place,
            lat,
            lon,
            mode,
            hazards,
            no_cyclones,
        } => {
            report::run(
                &config,
                ReportRequest {
                    place,
                    latitude: lat,
                    longitude: lon,
                    mode,
                    hazards,
                    include_cyclones: !no_cyclones,
                },
            )
            .await
        }
        Command::Serve { port } => web::run(config, port).await,
        Command::Cache {
            action: CacheAction::Clear,
        } => {
            let cleared = cache::clear().await?;
            println!("Cleared {cleared} cached entries");
            Ok(())
        }
    }
}
