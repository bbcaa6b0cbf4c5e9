//! Hospital Surge Planner CLI
//!
//! A command-line tool for requesting surge forecasts, reviewing forecast
//! history and asking the planning agents for action plans.

mod client;
mod commands;
mod output;

use clap::{Parser, Subcommand};
use commands::{forecast, health, plan};
use std::path::PathBuf;

/// Hospital Surge Planner CLI
#[derive(Parser)]
#[command(name = "surgectl")]
#[command(author, version, about = "CLI for the Hospital Surge Planner", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via SURGE_API_URL env var)
    #[arg(long, env = "SURGE_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show service health and readiness
    Health,

    /// Generate a surge forecast for a hospital
    Forecast {
        /// Hospital ID
        hospital: String,

        /// Forecast horizon in hours (service default if not specified)
        #[arg(long)]
        horizon: Option<u32>,

        /// Event the forecast is associated with
        #[arg(long)]
        event: Option<String>,
    },

    /// Show recorded forecasts for a hospital
    Forecasts {
        /// Hospital ID
        hospital: String,

        /// Maximum number of forecasts to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Ask the planning agents for an action plan
    Ask {
        /// JSON file holding the agent observation
        #[arg(long)]
        file: PathBuf,
    },
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = client::ApiClient::new(&cli.api_url)?;

    match cli.command {
        Commands::Health => health::show_health(&client, cli.format).await,
        Commands::Forecast {
            hospital,
            horizon,
            event,
        } => forecast::run_forecast(&client, &hospital, horizon, event, cli.format).await,
        Commands::Forecasts { hospital, limit } => {
            forecast::list_forecasts(&client, &hospital, limit, cli.format).await
        }
        Commands::Ask { file } => plan::ask(&client, &file, cli.format).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
