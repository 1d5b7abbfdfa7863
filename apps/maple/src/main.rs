//! Maple CLI
//!
//! Daily Canadian city guessing game.
//!
//! # Commands
//!
//! - `init`: create an empty database
//! - `seed <file>`: load cities from a JSON array
//! - `status`: store statistics
//! - `puzzle`: show the target for a date (operator view)
//! - `serve`: run the HTTP API
//!
//! Settings come from `MAPLE_*` environment variables; flags override them.

use clap::{Parser, Subcommand};
use maple::api::run_server;
use maple::backend::BackendKind;
use maple::cli::{self, CliError};
use maple::config::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "maple")]
#[command(version)]
#[command(about = "Daily Canadian city guessing game")]
#[command(propagate_version = true)]
struct Cli {
    /// Database file (overrides MAPLE_DB)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Storage backend: redb or memory (overrides MAPLE_BACKEND)
    #[arg(short, long, global = true)]
    backend: Option<BackendKind>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty database
    Init {
        /// Overwrite an existing database
        #[arg(long)]
        force: bool,
    },
    /// Load cities from a JSON file
    Seed {
        /// JSON array of `{name, province, latitude, longitude, population}`
        file: PathBuf,
    },
    /// Show store statistics
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Show the puzzle for a date, choosing it if needed
    Puzzle {
        /// Date as YYYY-MM-DD (default: today, UTC)
        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        json: bool,
    },
    /// Run the HTTP API
    Serve {
        /// Bind host (overrides MAPLE_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides MAPLE_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Seed cities from this file before serving
        #[arg(long)]
        seed: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(database) = cli.database {
        config.database = database;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, mut config: Config) -> Result<(), CliError> {
    let backend = config.backend.to_string();
    let db = config.database.clone();

    match command {
        Commands::Init { force } => cli::cmd_init(&db, &backend, force),
        Commands::Seed { file } => cli::cmd_seed(&db, &backend, &file).map(|_| ()),
        Commands::Status { json } => cli::cmd_status(&db, &backend, json).map(|_| ()),
        Commands::Puzzle { date, json } => {
            cli::cmd_puzzle(&db, &backend, &config.puzzle_salt, date.as_deref(), json).map(|_| ())
        }
        Commands::Serve { host, port, seed } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }

            let mut game = cli::open_game(&db, &backend, &config.puzzle_salt)?;
            if let Some(file) = seed {
                let report = game.seed_cities(cli::load_seed_file(&file)?)?;
                info!(
                    inserted = report.inserted,
                    skipped = report.skipped,
                    "Cities seeded"
                );
            }

            run_server(&config, game).await?;
            Ok(())
        }
    }
}
