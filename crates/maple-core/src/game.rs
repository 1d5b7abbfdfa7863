//! # Game Module
//!
//! The puzzle, session and guess services.
//!
//! [`Game`] wraps a [`GameStore`] and sequences the store calls for each
//! player action. Callers pass the current date and time in, which keeps the
//! services deterministic under test.

use crate::error::{MapleError, Result};
use crate::feedback::{GuessFeedback, PopulationHint, score};
use crate::geo::Direction;
use crate::model::{City, DailyPuzzle, GameSession, Guess, NewCity, Player};
use crate::puzzle::{pick_city, target_pool};
use crate::store::{GameStore, StoreStats};
use crate::{PlayerId, SessionId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// VIEWS
// =============================================================================

/// A past guess as shown when a player resumes a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessRecord {
    pub city: String,
    pub correct: bool,
    pub distance_km: u32,
    pub direction: Direction,
    pub province_match: bool,
    pub population_hint: PopulationHint,
}

/// A session with its guesses, ready for the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: SessionId,
    pub player_id: PlayerId,
    pub puzzle_date: NaiveDate,
    pub completed: bool,
    pub guesses: Vec<GuessRecord>,
}

/// Outcome of loading a batch of seed cities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

// =============================================================================
// GAME
// =============================================================================

/// Game services over a store.
#[derive(Debug)]
pub struct Game<S> {
    store: S,
    salt: String,
}

impl<S: GameStore> Game<S> {
    /// Create the services. `salt` keys daily target selection.
    pub fn new(store: S, salt: impl Into<String>) -> Self {
        Self {
            store,
            salt: salt.into(),
        }
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // -------------------------------------------------------------------------
    // Cities
    // -------------------------------------------------------------------------

    /// Insert seed cities, skipping any (name, province) already present.
    ///
    /// Stops at the first invalid row; rows before it stay committed.
    pub fn seed_cities(
        &mut self,
        cities: impl IntoIterator<Item = NewCity>,
    ) -> Result<SeedReport> {
        let mut report = SeedReport::default();

        for city in cities {
            let (_, inserted) = self.store.upsert_city(city)?;
            if inserted {
                report.inserted = report.inserted.saturating_add(1);
            } else {
                report.skipped = report.skipped.saturating_add(1);
            }
        }

        Ok(report)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        self.store.stats()
    }

    // -------------------------------------------------------------------------
    // Puzzle
    // -------------------------------------------------------------------------

    /// The puzzle for `today`, choosing and storing a target on first request.
    pub fn daily_puzzle(&mut self, today: NaiveDate, now: DateTime<Utc>) -> Result<DailyPuzzle> {
        if let Some(puzzle) = self.store.puzzle(today)? {
            return Ok(puzzle);
        }

        let pool = target_pool(&self.store.cities()?);
        let city = pick_city(&self.salt, today, &pool).ok_or(MapleError::NoCitiesAvailable)?;

        let puzzle = DailyPuzzle {
            date: today,
            city_id: city.id,
            created_at: now,
        };
        self.store.insert_puzzle(&puzzle)?;

        // Another writer may have claimed the date first; theirs wins.
        Ok(self.store.puzzle(today)?.unwrap_or(puzzle))
    }

    /// The puzzle for `today` with its target city resolved.
    pub fn daily_target(
        &mut self,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<(DailyPuzzle, City)> {
        let puzzle = self.daily_puzzle(today, now)?;
        let city = self
            .store
            .city(puzzle.city_id)?
            .ok_or(MapleError::TargetCityNotFound)?;
        Ok((puzzle, city))
    }

    // -------------------------------------------------------------------------
    // Players and sessions
    // -------------------------------------------------------------------------

    /// Register a new anonymous player.
    pub fn create_player(&mut self, now: DateTime<Utc>) -> Result<PlayerId> {
        let player = Player::new(PlayerId::generate(), now);
        self.store.insert_player(&player)?;
        Ok(player.id)
    }

    /// Resume or start `player_id`'s session for `today`.
    ///
    /// Unknown player ids are registered on the spot.
    pub fn session_for(
        &mut self,
        player_id: PlayerId,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<SessionView> {
        if self.store.player(player_id)?.is_none() {
            self.store.insert_player(&Player::new(player_id, now))?;
        }

        let puzzle = self.daily_puzzle(today, now)?;

        if let Some(existing) = self.store.session_for(player_id, puzzle.date)? {
            return self.view(&existing);
        }

        let session = GameSession::start(player_id, &puzzle, now);
        self.store.insert_session(&session)?;

        // A concurrent start for the same (player, date) keeps the first row.
        match self.store.session_for(player_id, puzzle.date)? {
            Some(stored) if stored.id != session.id => self.view(&stored),
            _ => Ok(SessionView {
                session_id: session.id,
                player_id,
                puzzle_date: session.puzzle_date,
                completed: false,
                guesses: Vec::new(),
            }),
        }
    }

    /// Create a player and start their session in one step.
    pub fn start_anonymous(&mut self, today: NaiveDate, now: DateTime<Utc>) -> Result<SessionView> {
        let player_id = self.create_player(now)?;
        self.session_for(player_id, today, now)
    }

    /// Build the client view of a stored session.
    fn view(&self, session: &GameSession) -> Result<SessionView> {
        let target = self.store.city(session.target_city_id)?;

        let mut guesses = Vec::new();
        for guess in self.store.guesses(session.id)? {
            let city = self.store.city(guess.city_id)?;
            guesses.push(Self::record(&guess, city.as_ref(), target.as_ref()));
        }

        Ok(SessionView {
            session_id: session.id,
            player_id: session.player_id,
            puzzle_date: session.puzzle_date,
            completed: session.completed,
            guesses,
        })
    }

    fn record(guess: &Guess, city: Option<&City>, target: Option<&City>) -> GuessRecord {
        let (province_match, population_hint) = match (city, target) {
            (Some(city), Some(target)) => (
                city.province == target.province,
                PopulationHint::compare(city.population, target.population),
            ),
            _ => (false, PopulationHint::Equal),
        };

        GuessRecord {
            city: city.map(|c| c.name.clone()).unwrap_or_default(),
            correct: guess.correct,
            distance_km: guess.distance_km,
            direction: guess.direction,
            province_match,
            population_hint,
        }
    }

    // -------------------------------------------------------------------------
    // Guesses
    // -------------------------------------------------------------------------

    /// Score a guess for `session_id` and record it.
    ///
    /// A correct guess completes the session; later guesses are rejected.
    pub fn evaluate_guess(
        &mut self,
        session_id: SessionId,
        city_name: &str,
        now: DateTime<Utc>,
    ) -> Result<GuessFeedback> {
        let session = self
            .store
            .session(session_id)?
            .ok_or(MapleError::SessionNotFound)?;

        if session.completed {
            return Err(MapleError::SessionCompleted);
        }

        let name = city_name.trim();
        if name.is_empty() {
            return Err(MapleError::EmptyGuess);
        }

        let guessed = self
            .store
            .find_city_by_name(name)?
            .ok_or_else(|| MapleError::CityNotFound(name.to_string()))?;

        let target = self
            .store
            .city(session.target_city_id)?
            .ok_or(MapleError::TargetCityNotFound)?;

        let feedback = score(&guessed, &target);

        let guess = Guess {
            session_id,
            city_id: guessed.id,
            distance_km: feedback.distance_km,
            direction: feedback.direction,
            correct: feedback.correct,
            created_at: now,
        };
        self.store.record_guess(&guess, feedback.correct)?;

        Ok(feedback)
    }
}

// =============================================================================
// TESTS
// =============================================================================
