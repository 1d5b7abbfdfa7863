//! # Store
//!
//! The persistence seam for Maple.
//!
//! [`GameStore`] is implemented by [`MemoryStore`] (this module) and by
//! [`crate::storage::RedbStore`]. All iteration orders are deterministic:
//! cities come back ordered by id, guesses in insertion order.

use crate::error::{MapleError, Result};
use crate::model::{City, DailyPuzzle, GameSession, Guess, NewCity, Player};
use crate::{CityId, PlayerId, SessionId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// GAMESTORE TRAIT
// =============================================================================

/// Storage operations needed by the game services.
pub trait GameStore {
    /// Insert a city unless one with the same (name, province) exists.
    ///
    /// Returns the id and whether a new row was written. Existing rows are
    /// never modified.
    fn upsert_city(&mut self, city: NewCity) -> Result<(CityId, bool)>;

    /// Lookup a city by id.
    fn city(&self, id: CityId) -> Result<Option<City>>;

    /// Case-insensitive lookup by name. The lowest id wins on duplicates,
    /// which is why [`crate::puzzle::target_pool`] skips shadowed names.
    fn find_city_by_name(&self, name: &str) -> Result<Option<City>>;

    /// All cities, ordered by id.
    fn cities(&self) -> Result<Vec<City>>;

    /// Cities eligible as daily targets, ordered by id.
    fn enabled_cities(&self) -> Result<Vec<City>> {
        Ok(self.cities()?.into_iter().filter(|c| c.enabled).collect())
    }

    fn insert_player(&mut self, player: &Player) -> Result<()>;

    fn player(&self, id: PlayerId) -> Result<Option<Player>>;

    fn puzzle(&self, date: NaiveDate) -> Result<Option<DailyPuzzle>>;

    /// Store the puzzle for its date. A date already taken is left unchanged.
    fn insert_puzzle(&mut self, puzzle: &DailyPuzzle) -> Result<()>;

    fn session(&self, id: SessionId) -> Result<Option<GameSession>>;

    /// The session for (player, date), if one was started.
    fn session_for(&self, player: PlayerId, date: NaiveDate) -> Result<Option<GameSession>>;

    fn insert_session(&mut self, session: &GameSession) -> Result<()>;

    /// Guesses of a session in the order they were made.
    fn guesses(&self, session: SessionId) -> Result<Vec<Guess>>;

    /// Append a guess and, if `completes`, mark its session completed.
    ///
    /// Both writes happen together or not at all.
    fn record_guess(&mut self, guess: &Guess, completes: bool) -> Result<()>;

    /// Row counts.
    fn stats(&self) -> Result<StoreStats>;
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub cities: usize,
    pub enabled_cities: usize,
    pub players: usize,
    pub puzzles: usize,
    pub sessions: usize,
    pub guesses: usize,
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Non-persistent store backed by `BTreeMap`s.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    cities: BTreeMap<CityId, City>,
    city_keys: BTreeMap<String, CityId>,
    players: BTreeMap<PlayerId, Player>,
    puzzles: BTreeMap<NaiveDate, DailyPuzzle>,
    sessions: BTreeMap<SessionId, GameSession>,
    session_keys: BTreeMap<(PlayerId, NaiveDate), SessionId>,
    guesses: BTreeMap<SessionId, Vec<Guess>>,
    next_city_id: u64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameStore for MemoryStore {
    fn upsert_city(&mut self, city: NewCity) -> Result<(CityId, bool)> {
        city.validate()?;
        let key = city.unique_key();

        if let Some(&id) = self.city_keys.get(&key) {
            return Ok((id, false));
        }

        let id = CityId(self.next_city_id);
        self.next_city_id = self.next_city_id.saturating_add(1);

        self.city_keys.insert(key, id);
        self.cities.insert(id, city.into_city(id));

        Ok((id, true))
    }

    fn city(&self, id: CityId) -> Result<Option<City>> {
        Ok(self.cities.get(&id).cloned())
    }

    fn find_city_by_name(&self, name: &str) -> Result<Option<City>> {
        Ok(self.cities.values().find(|c| c.matches_name(name)).cloned())
    }

    fn cities(&self) -> Result<Vec<City>> {
        Ok(self.cities.values().cloned().collect())
    }

    fn insert_player(&mut self, player: &Player) -> Result<()> {
        self.players.entry(player.id).or_insert_with(|| player.clone());
        Ok(())
    }

    fn player(&self, id: PlayerId) -> Result<Option<Player>> {
        Ok(self.players.get(&id).cloned())
    }

    fn puzzle(&self, date: NaiveDate) -> Result<Option<DailyPuzzle>> {
        Ok(self.puzzles.get(&date).cloned())
    }

    fn insert_puzzle(&mut self, puzzle: &DailyPuzzle) -> Result<()> {
        self.puzzles
            .entry(puzzle.date)
            .or_insert_with(|| puzzle.clone());
        Ok(())
    }

    fn session(&self, id: SessionId) -> Result<Option<GameSession>> {
        Ok(self.sessions.get(&id).cloned())
    }

    fn session_for(&self, player: PlayerId, date: NaiveDate) -> Result<Option<GameSession>> {
        Ok(self
            .session_keys
            .get(&(player, date))
            .and_then(|id| self.sessions.get(id))
            .cloned())
    }

    fn insert_session(&mut self, session: &GameSession) -> Result<()> {
        let key = (session.player_id, session.puzzle_date);
        if self.session_keys.contains_key(&key) {
            return Ok(());
        }

        self.session_keys.insert(key, session.id);
        self.sessions.insert(session.id, session.clone());
        Ok(())
    }

    fn guesses(&self, session: SessionId) -> Result<Vec<Guess>> {
        Ok(self.guesses.get(&session).cloned().unwrap_or_default())
    }

    fn record_guess(&mut self, guess: &Guess, completes: bool) -> Result<()> {
        let session = self
            .sessions
            .get_mut(&guess.session_id)
            .ok_or(MapleError::SessionNotFound)?;

        if completes {
            session.completed = true;
        }
        self.guesses
            .entry(guess.session_id)
            .or_default()
            .push(guess.clone());

        Ok(())
    }

    fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            cities: self.cities.len(),
            enabled_cities: self.cities.values().filter(|c| c.enabled).count(),
            players: self.players.len(),
            puzzles: self.puzzles.len(),
            sessions: self.sessions.len(),
            guesses: self.guesses.values().map(Vec::len).sum(),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
