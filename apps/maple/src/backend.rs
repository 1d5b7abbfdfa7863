//! # Backend
//!
//! Runtime choice between the in-memory and the redb store.

use chrono::NaiveDate;
use maple_core::model::{City, DailyPuzzle, GameSession, Guess, NewCity, Player};
use maple_core::{
    CityId, GameStore, MapleError, MemoryStore, PlayerId, RedbStore, SessionId, StoreStats,
};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Which store to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Persistent redb file.
    Redb,
    /// Process-local maps, lost on exit.
    Memory,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redb" => Ok(Self::Redb),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(format!("Unknown backend: {other} (expected redb or memory)")),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redb => f.write_str("redb"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

/// A store chosen at runtime.
pub enum Backend {
    Memory(MemoryStore),
    Redb(RedbStore),
}

impl Backend {
    /// Open the store of the given kind. `path` is ignored for memory.
    pub fn open(kind: BackendKind, path: &Path) -> Result<Self, MapleError> {
        match kind {
            BackendKind::Memory => Ok(Self::Memory(MemoryStore::new())),
            BackendKind::Redb => Ok(Self::Redb(RedbStore::open(path)?)),
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            Backend::Memory($store) => $call,
            Backend::Redb($store) => $call,
        }
    };
}

impl GameStore for Backend {
    fn upsert_city(&mut self, city: NewCity) -> Result<(CityId, bool), MapleError> {
        dispatch!(self, store => store.upsert_city(city))
    }

    fn city(&self, id: CityId) -> Result<Option<City>, MapleError> {
        dispatch!(self, store => store.city(id))
    }

    fn find_city_by_name(&self, name: &str) -> Result<Option<City>, MapleError> {
        dispatch!(self, store => store.find_city_by_name(name))
    }

    fn cities(&self) -> Result<Vec<City>, MapleError> {
        dispatch!(self, store => store.cities())
    }

    fn insert_player(&mut self, player: &Player) -> Result<(), MapleError> {
        dispatch!(self, store => store.insert_player(player))
    }

    fn player(&self, id: PlayerId) -> Result<Option<Player>, MapleError> {
        dispatch!(self, store => store.player(id))
    }

    fn puzzle(&self, date: NaiveDate) -> Result<Option<DailyPuzzle>, MapleError> {
        dispatch!(self, store => store.puzzle(date))
    }

    fn insert_puzzle(&mut self, puzzle: &DailyPuzzle) -> Result<(), MapleError> {
        dispatch!(self, store => store.insert_puzzle(puzzle))
    }

    fn session(&self, id: SessionId) -> Result<Option<GameSession>, MapleError> {
        dispatch!(self, store => store.session(id))
    }

    fn session_for(
        &self,
        player: PlayerId,
        date: NaiveDate,
    ) -> Result<Option<GameSession>, MapleError> {
        dispatch!(self, store => store.session_for(player, date))
    }

    fn insert_session(&mut self, session: &GameSession) -> Result<(), MapleError> {
        dispatch!(self, store => store.insert_session(session))
    }

    fn guesses(&self, session: SessionId) -> Result<Vec<Guess>, MapleError> {
        dispatch!(self, store => store.guesses(session))
    }

    fn record_guess(&mut self, guess: &Guess, completes: bool) -> Result<(), MapleError> {
        dispatch!(self, store => store.record_guess(guess, completes))
    }

    fn stats(&self) -> Result<StoreStats, MapleError> {
        dispatch!(self, store => store.stats())
    }
}
