//! # CLI Commands
//!
//! Operator commands behind the `maple` binary. Each command opens the store,
//! does its work and returns what it printed so tests can inspect it.

use crate::backend::{Backend, BackendKind};
use chrono::{NaiveDate, Utc};
use maple_core::game::SeedReport;
use maple_core::{City, DailyPuzzle, Game, MapleError, NewCity, StoreStats, today_utc};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Game(#[from] MapleError),

    #[error("Database already exists at {0} (use --force to overwrite)")]
    AlreadyExists(PathBuf),

    #[error("{0}")]
    UnknownBackend(String),

    #[error("Invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("`{0}` needs a persistent backend; the memory backend keeps nothing after exit")]
    NotPersistent(&'static str),
}

fn parse_backend(backend: &str) -> Result<BackendKind, CliError> {
    backend.parse().map_err(CliError::UnknownBackend)
}

/// Parse `backend` for a command whose only effect is the data it writes.
fn persistent_backend(backend: &str, command: &'static str) -> Result<BackendKind, CliError> {
    match parse_backend(backend)? {
        BackendKind::Memory => Err(CliError::NotPersistent(command)),
        kind => Ok(kind),
    }
}

/// Open the game services over the requested store.
pub fn open_game(db_path: &Path, backend: &str, salt: &str) -> Result<Game<Backend>, CliError> {
    let kind = parse_backend(backend)?;
    let store = Backend::open(kind, db_path)?;
    Ok(Game::new(store, salt))
}

/// Read a JSON array of cities.
pub fn load_seed_file(path: &Path) -> Result<Vec<NewCity>, CliError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Create an empty database.
pub fn cmd_init(db_path: &Path, backend: &str, force: bool) -> Result<(), CliError> {
    match parse_backend(backend)? {
        BackendKind::Memory => {
            println!("Memory backend needs no initialisation");
            Ok(())
        }
        BackendKind::Redb => {
            if db_path.exists() {
                if !force {
                    return Err(CliError::AlreadyExists(db_path.to_path_buf()));
                }
                fs::remove_file(db_path)?;
            }

            maple_core::RedbStore::open(db_path)?;
            info!(path = %db_path.display(), "Initialised database");
            println!("Initialised database at {}", db_path.display());
            Ok(())
        }
    }
}

/// Load cities from a JSON file into the store.
pub fn cmd_seed(db_path: &Path, backend: &str, file: &Path) -> Result<SeedReport, CliError> {
    persistent_backend(backend, "seed")?;
    let cities = load_seed_file(file)?;
    let mut game = open_game(db_path, backend, "")?;

    let report = game.seed_cities(cities)?;
    info!(
        inserted = report.inserted,
        skipped = report.skipped,
        "Cities seeded"
    );
    println!(
        "Cities seeded: {} inserted, {} already present",
        report.inserted, report.skipped
    );

    Ok(report)
}

/// Print row counts.
pub fn cmd_status(
    db_path: &Path,
    backend: &str,
    json_output: bool,
) -> Result<StoreStats, CliError> {
    let game = open_game(db_path, backend, "")?;
    let stats = game.stats()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Backend:        {backend}");
        println!("Cities:         {} ({} enabled)", stats.cities, stats.enabled_cities);
        println!("Players:        {}", stats.players);
        println!("Daily puzzles:  {}", stats.puzzles);
        println!("Sessions:       {}", stats.sessions);
        println!("Guesses:        {}", stats.guesses);
    }

    Ok(stats)
}

/// Show the puzzle for a date, picking it if it does not exist yet.
///
/// This is the operator view and includes the target city.
pub fn cmd_puzzle(
    db_path: &Path,
    backend: &str,
    salt: &str,
    date: Option<&str>,
    json_output: bool,
) -> Result<(DailyPuzzle, City), CliError> {
    persistent_backend(backend, "puzzle")?;

    let date = match date {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|_| CliError::InvalidDate(raw.to_string()))?,
        None => today_utc(),
    };

    let mut game = open_game(db_path, backend, salt)?;
    let (puzzle, city) = game.daily_target(date, Utc::now())?;

    if json_output {
        let output = json!({
            "date": puzzle.date,
            "cityId": city.id,
            "city": city.name,
            "province": city.province,
            "population": city.population,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!(
            "{}: {}, {} (city #{}, population {})",
            puzzle.date, city.name, city.province, city.id, city.population
        );
    }

    Ok((puzzle, city))
}
