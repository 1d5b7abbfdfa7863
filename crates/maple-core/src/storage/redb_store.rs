//! redb implementation of [`GameStore`].
//!
//! Rows are encoded with postcard. Tables:
//!
//! | Table | Key | Value |
//! |---|---|---|
//! | `cities` | city id | [`City`] |
//! | `city_keys` | name + province | city id |
//! | `players` | player uuid | [`Player`] |
//! | `puzzles` | days since CE | [`DailyPuzzle`] |
//! | `sessions` | session uuid | [`GameSession`] |
//! | `session_keys` | (player uuid, days since CE) | session uuid |
//! | `guesses` | session uuid | `Vec<Guess>` in order |
//! | `metadata` | name | counter |

use crate::error::{MapleError, Result};
use crate::model::{City, DailyPuzzle, GameSession, Guess, NewCity, Player};
use crate::store::{GameStore, StoreStats};
use crate::{CityId, PlayerId, SessionId};
use chrono::{Datelike, NaiveDate};
use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, ReadableTableMetadata,
    TableDefinition,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

const CITIES: TableDefinition<u64, &[u8]> = TableDefinition::new("cities");
const CITY_KEYS: TableDefinition<&str, u64> = TableDefinition::new("city_keys");
const PLAYERS: TableDefinition<u128, &[u8]> = TableDefinition::new("players");
const PUZZLES: TableDefinition<i32, &[u8]> = TableDefinition::new("puzzles");
const SESSIONS: TableDefinition<u128, &[u8]> = TableDefinition::new("sessions");
const SESSION_KEYS: TableDefinition<(u128, i32), u128> = TableDefinition::new("session_keys");
const GUESSES: TableDefinition<u128, &[u8]> = TableDefinition::new("guesses");
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_CITY_ID: &str = "next_city_id";

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(postcard::to_allocvec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(postcard::from_bytes(bytes)?)
}

fn date_key(date: NaiveDate) -> i32 {
    date.num_days_from_ce()
}

/// Game store persisted in a single redb file.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open the database at `path`, creating the file and tables if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::create(path).map_err(MapleError::storage)?;

        let txn = db.begin_write().map_err(MapleError::storage)?;
        {
            txn.open_table(CITIES).map_err(MapleError::storage)?;
            txn.open_table(CITY_KEYS).map_err(MapleError::storage)?;
            txn.open_table(PLAYERS).map_err(MapleError::storage)?;
            txn.open_table(PUZZLES).map_err(MapleError::storage)?;
            txn.open_table(SESSIONS).map_err(MapleError::storage)?;
            txn.open_table(SESSION_KEYS).map_err(MapleError::storage)?;
            txn.open_table(GUESSES).map_err(MapleError::storage)?;
            txn.open_table(METADATA).map_err(MapleError::storage)?;
        }
        txn.commit().map_err(MapleError::storage)?;

        Ok(Self { db })
    }

    fn read(&self) -> Result<ReadTransaction> {
        self.db.begin_read().map_err(MapleError::storage)
    }

    fn load_session(txn: &ReadTransaction, id: u128) -> Result<Option<GameSession>> {
        let table = txn.open_table(SESSIONS).map_err(MapleError::storage)?;
        let row = table.get(id).map_err(MapleError::storage)?;
        row.map(|guard| decode(guard.value())).transpose()
    }
}

impl GameStore for RedbStore {
    fn upsert_city(&mut self, city: NewCity) -> Result<(CityId, bool)> {
        city.validate()?;
        let key = city.unique_key();

        let txn = self.db.begin_write().map_err(MapleError::storage)?;
        let outcome = {
            let mut keys = txn.open_table(CITY_KEYS).map_err(MapleError::storage)?;
            let existing = keys
                .get(key.as_str())
                .map_err(MapleError::storage)?
                .map(|guard| guard.value());

            match existing {
                Some(id) => (CityId(id), false),
                None => {
                    let mut meta = txn.open_table(METADATA).map_err(MapleError::storage)?;
                    let next = meta
                        .get(NEXT_CITY_ID)
                        .map_err(MapleError::storage)?
                        .map(|guard| guard.value())
                        .unwrap_or(0);
                    meta.insert(NEXT_CITY_ID, next.saturating_add(1))
                        .map_err(MapleError::storage)?;

                    let id = CityId(next);
                    let row = encode(&city.into_city(id))?;

                    let mut cities = txn.open_table(CITIES).map_err(MapleError::storage)?;
                    cities
                        .insert(id.0, row.as_slice())
                        .map_err(MapleError::storage)?;
                    keys.insert(key.as_str(), id.0)
                        .map_err(MapleError::storage)?;

                    (id, true)
                }
            }
        };
        txn.commit().map_err(MapleError::storage)?;

        Ok(outcome)
    }

    fn city(&self, id: CityId) -> Result<Option<City>> {
        let txn = self.read()?;
        let table = txn.open_table(CITIES).map_err(MapleError::storage)?;
        let row = table.get(id.0).map_err(MapleError::storage)?;
        row.map(|guard| decode(guard.value())).transpose()
    }

    fn find_city_by_name(&self, name: &str) -> Result<Option<City>> {
        let txn = self.read()?;
        let table = txn.open_table(CITIES).map_err(MapleError::storage)?;

        for entry in table.iter().map_err(MapleError::storage)? {
            let (_, value) = entry.map_err(MapleError::storage)?;
            let city: City = decode(value.value())?;
            if city.matches_name(name) {
                return Ok(Some(city));
            }
        }

        Ok(None)
    }

    fn cities(&self) -> Result<Vec<City>> {
        let txn = self.read()?;
        let table = txn.open_table(CITIES).map_err(MapleError::storage)?;

        let mut cities = Vec::new();
        for entry in table.iter().map_err(MapleError::storage)? {
            let (_, value) = entry.map_err(MapleError::storage)?;
            cities.push(decode(value.value())?);
        }

        Ok(cities)
    }

    fn insert_player(&mut self, player: &Player) -> Result<()> {
        let key = player.id.0.as_u128();
        let row = encode(player)?;

        let txn = self.db.begin_write().map_err(MapleError::storage)?;
        {
            let mut table = txn.open_table(PLAYERS).map_err(MapleError::storage)?;
            let exists = table.get(key).map_err(MapleError::storage)?.is_some();
            if !exists {
                table
                    .insert(key, row.as_slice())
                    .map_err(MapleError::storage)?;
            }
        }
        txn.commit().map_err(MapleError::storage)
    }

    fn player(&self, id: PlayerId) -> Result<Option<Player>> {
        let txn = self.read()?;
        let table = txn.open_table(PLAYERS).map_err(MapleError::storage)?;
        let row = table.get(id.0.as_u128()).map_err(MapleError::storage)?;
        row.map(|guard| decode(guard.value())).transpose()
    }

    fn puzzle(&self, date: NaiveDate) -> Result<Option<DailyPuzzle>> {
        let txn = self.read()?;
        let table = txn.open_table(PUZZLES).map_err(MapleError::storage)?;
        let row = table.get(date_key(date)).map_err(MapleError::storage)?;
        row.map(|guard| decode(guard.value())).transpose()
    }

    fn insert_puzzle(&mut self, puzzle: &DailyPuzzle) -> Result<()> {
        let key = date_key(puzzle.date);
        let row = encode(puzzle)?;

        let txn = self.db.begin_write().map_err(MapleError::storage)?;
        {
            let mut table = txn.open_table(PUZZLES).map_err(MapleError::storage)?;
            let exists = table.get(key).map_err(MapleError::storage)?.is_some();
            if !exists {
                table
                    .insert(key, row.as_slice())
                    .map_err(MapleError::storage)?;
            }
        }
        txn.commit().map_err(MapleError::storage)
    }

    fn session(&self, id: SessionId) -> Result<Option<GameSession>> {
        let txn = self.read()?;
        Self::load_session(&txn, id.0.as_u128())
    }

    fn session_for(&self, player: PlayerId, date: NaiveDate) -> Result<Option<GameSession>> {
        let txn = self.read()?;
        let keys = txn.open_table(SESSION_KEYS).map_err(MapleError::storage)?;
        let session_id = keys
            .get((player.0.as_u128(), date_key(date)))
            .map_err(MapleError::storage)?
            .map(|guard| guard.value());

        match session_id {
            Some(id) => Self::load_session(&txn, id),
            None => Ok(None),
        }
    }

    fn insert_session(&mut self, session: &GameSession) -> Result<()> {
        let id = session.id.0.as_u128();
        let key = (session.player_id.0.as_u128(), date_key(session.puzzle_date));
        let row = encode(session)?;

        let txn = self.db.begin_write().map_err(MapleError::storage)?;
        {
            let mut keys = txn.open_table(SESSION_KEYS).map_err(MapleError::storage)?;
            let taken = keys.get(key).map_err(MapleError::storage)?.is_some();
            if !taken {
                keys.insert(key, id).map_err(MapleError::storage)?;
                let mut sessions = txn.open_table(SESSIONS).map_err(MapleError::storage)?;
                sessions
                    .insert(id, row.as_slice())
                    .map_err(MapleError::storage)?;
            }
        }
        txn.commit().map_err(MapleError::storage)
    }

    fn guesses(&self, session: SessionId) -> Result<Vec<Guess>> {
        let txn = self.read()?;
        let table = txn.open_table(GUESSES).map_err(MapleError::storage)?;
        let row = table
            .get(session.0.as_u128())
            .map_err(MapleError::storage)?;

        Ok(row
            .map(|guard| decode(guard.value()))
            .transpose()?
            .unwrap_or_default())
    }

    fn record_guess(&mut self, guess: &Guess, completes: bool) -> Result<()> {
        let id = guess.session_id.0.as_u128();

        let txn = self.db.begin_write().map_err(MapleError::storage)?;
        {
            let mut sessions = txn.open_table(SESSIONS).map_err(MapleError::storage)?;
            let stored: Option<GameSession> = sessions
                .get(id)
                .map_err(MapleError::storage)?
                .map(|guard| decode(guard.value()))
                .transpose()?;
            let mut session = stored.ok_or(MapleError::SessionNotFound)?;

            if completes && !session.completed {
                session.completed = true;
                let row = encode(&session)?;
                sessions
                    .insert(id, row.as_slice())
                    .map_err(MapleError::storage)?;
            }

            let mut guesses = txn.open_table(GUESSES).map_err(MapleError::storage)?;
            let mut list: Vec<Guess> = guesses
                .get(id)
                .map_err(MapleError::storage)?
                .map(|guard| decode(guard.value()))
                .transpose()?
                .unwrap_or_default();
            list.push(guess.clone());

            let row = encode(&list)?;
            guesses
                .insert(id, row.as_slice())
                .map_err(MapleError::storage)?;
        }
        txn.commit().map_err(MapleError::storage)
    }

    fn stats(&self) -> Result<StoreStats> {
        let txn = self.read()?;

        let cities = self.cities()?;
        let enabled_cities = cities.iter().filter(|c| c.enabled).count();

        let players = txn.open_table(PLAYERS).map_err(MapleError::storage)?;
        let puzzles = txn.open_table(PUZZLES).map_err(MapleError::storage)?;
        let sessions = txn.open_table(SESSIONS).map_err(MapleError::storage)?;
        let guess_table = txn.open_table(GUESSES).map_err(MapleError::storage)?;

        let mut guesses = 0usize;
        for entry in guess_table.iter().map_err(MapleError::storage)? {
            let (_, value) = entry.map_err(MapleError::storage)?;
            let list: Vec<Guess> = decode(value.value())?;
            guesses = guesses.saturating_add(list.len());
        }

        Ok(StoreStats {
            cities: cities.len(),
            enabled_cities,
            players: players.len().map_err(MapleError::storage)? as usize,
            puzzles: puzzles.len().map_err(MapleError::storage)? as usize,
            sessions: sessions.len().map_err(MapleError::storage)? as usize,
            guesses,
        })
    }
}
