//! skyquery: resolve location/time-range requests against the local record
//! store, falling back to the satellite path when the store has no answer.
//!
//! `skyquery process` reads one JSON request on stdin and writes exactly one
//! JSON response line on stdout. All logging goes to stderr.

mod commands;
mod config;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

use skyquery_core::defaults::MSG_PROCESS_FAILED;
use skyquery_core::ResponseEnvelope;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "skyquery")]
#[command(author, version, about = "Location and time-range lookups over a local record store")]
#[command(propagate_version = true)]
struct Cli {
    /// SQLite record store (overrides SKYQUERY_DATABASE_PATH)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Directory request payloads are written to (overrides SKYQUERY_STORAGE_DIR)
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one JSON request from stdin
    Process,

    /// Show stored records and per-location counts
    View {
        /// Only show records for this location
        #[arg(short, long)]
        location: Option<String>,
    },

    /// Create the record store if it does not exist
    Init,

    /// Assign a location to every record that has none
    Backfill,

    /// Upsert records from a JSON listing file
    Ingest {
        /// Listing of {key, timestamp, url, location?} entries
        listing: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = logging::init();

    let config = match Config::from_env() {
        Ok(config) => config.with_overrides(cli.database, cli.storage_dir),
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            if matches!(cli.command, Commands::Process) {
                println!(
                    "{}",
                    ResponseEnvelope::error(e, MSG_PROCESS_FAILED).to_json_line()
                );
            } else {
                eprintln!("Error: {e}");
            }
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &Config) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Process => return Ok(commands::process(config).await),
        Commands::View { location } => commands::view(config, location.as_deref()).await?,
        Commands::Init => commands::init(config).await?,
        Commands::Backfill => commands::backfill(config).await?,
        Commands::Ingest { listing } => commands::ingest(config, &listing).await?,
    }
    Ok(ExitCode::SUCCESS)
}
