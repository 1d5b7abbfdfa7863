//! # Config
//!
//! Server and storage settings read from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `MAPLE_DB` | `maple.redb` |
//! | `MAPLE_BACKEND` | `redb` |
//! | `MAPLE_HOST` | `0.0.0.0` |
//! | `MAPLE_PORT` | `3000` |
//! | `MAPLE_PUZZLE_SALT` | `maple` |
//! | `MAPLE_RATE_LIMIT_PER_MINUTE` | `120` (0 disables) |
//! | `MAPLE_CORS_ORIGINS` | empty (any origin) |
//!
//! CLI flags override these after loading.

use crate::backend::BackendKind;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_DB: &str = "maple.redb";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SALT: &str = "maple";
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 120;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database: PathBuf,
    pub backend: BackendKind,
    pub host: String,
    pub port: u16,
    pub puzzle_salt: String,
    pub rate_limit_per_minute: u32,
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DB),
            backend: BackendKind::Redb,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            puzzle_salt: DEFAULT_SALT.to_string(),
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            cors_origins: Vec::new(),
        }
    }
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using `lookup` in place of the environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let puzzle_salt = match lookup("MAPLE_PUZZLE_SALT") {
            Some(salt) if !salt.trim().is_empty() => salt,
            _ => {
                warn!("MAPLE_PUZZLE_SALT not set, daily targets are predictable");
                defaults.puzzle_salt
            }
        };

        Ok(Self {
            database: lookup("MAPLE_DB")
                .map(PathBuf::from)
                .unwrap_or(defaults.database),
            backend: try_load(&lookup, "MAPLE_BACKEND", defaults.backend)?,
            host: lookup("MAPLE_HOST").unwrap_or(defaults.host),
            port: try_load(&lookup, "MAPLE_PORT", defaults.port)?,
            puzzle_salt,
            rate_limit_per_minute: try_load(
                &lookup,
                "MAPLE_RATE_LIMIT_PER_MINUTE",
                defaults.rate_limit_per_minute,
            )?,
            cors_origins: lookup("MAPLE_CORS_ORIGINS")
                .map(|raw| parse_list(&raw))
                .unwrap_or_default(),
        })
    }

    /// Address the server binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn try_load<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => {
            debug!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
