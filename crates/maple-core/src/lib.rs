//! # Maple Core
//!
//! Game logic and persistence for Maple, a daily Canadian city guessing game.
//!
//! A hidden target city is chosen once per UTC day. Players guess cities and
//! get back the distance, compass direction, province match and a population
//! hint relative to the target.
//!
//! ## Layout
//!
//! - [`geo`]: haversine distance and 8-way compass bucketing
//! - [`feedback`]: scoring a guessed city against the target
//! - [`model`]: the stored rows (City, Player, DailyPuzzle, GameSession, Guess)
//! - [`store`]: the [`GameStore`] trait and the in-memory backend
//! - [`storage`]: the redb-backed store
//! - [`puzzle`]: daily target selection
//! - [`game`]: puzzle, session and guess services over a store
//!
//! This crate does no async and no network I/O. Dates and timestamps are
//! passed in by the caller.

pub mod error;
pub mod feedback;
pub mod game;
pub mod geo;
pub mod model;
pub mod puzzle;
pub mod storage;
pub mod store;

pub use error::{MapleError, Result};
pub use feedback::{GuessFeedback, PopulationHint, score};
pub use game::{Game, GuessRecord, SeedReport, SessionView};
pub use geo::{Coordinates, Direction, distance_km, direction};
pub use model::{City, DailyPuzzle, GameSession, Guess, NewCity, Player};
pub use puzzle::{pick_city, target_pool, today_utc};
pub use storage::RedbStore;
pub use store::{GameStore, MemoryStore, StoreStats};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a city row. Assigned sequentially by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityId(pub u64);

impl fmt::Display for CityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a player. Opaque to the client, generated server side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Generate a fresh random player id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PlayerId {
    type Err = MapleError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| MapleError::InvalidId(s.to_string()))
    }
}

/// Identifier of a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a fresh random session id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = MapleError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| MapleError::InvalidId(s.to_string()))
    }
}
