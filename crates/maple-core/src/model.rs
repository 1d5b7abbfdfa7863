//! # Model Module
//!
//! The stored rows. Each struct maps to one table of the store.
//!
//! | Row | Unique key |
//! |---|---|
//! | [`City`] | id, and (name, province) |
//! | [`Player`] | id |
//! | [`DailyPuzzle`] | date |
//! | [`GameSession`] | id, and (player, date) |
//! | [`Guess`] | (session, position) |

use crate::error::{MapleError, Result};
use crate::geo::{Coordinates, Direction};
use crate::{CityId, PlayerId, SessionId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound for city and province names.
pub const MAX_NAME_LEN: usize = 256;

// =============================================================================
// CITY
// =============================================================================

/// A guessable Canadian city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
    pub province: String,
    pub latitude: f64,
    pub longitude: f64,
    pub population: u64,
    /// Disabled cities can still be guessed but are never picked as targets.
    pub enabled: bool,
}

impl City {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Whether `name` refers to this city, ignoring case.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

/// A city as it appears in a seed file.
///
/// Unknown fields are ignored so seed files can carry extra data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCity {
    pub name: String,
    pub province: String,
    pub latitude: f64,
    pub longitude: f64,
    pub population: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl NewCity {
    /// Check names and coordinates before the row reaches a store.
    pub fn validate(&self) -> Result<()> {
        let name = self.name.trim();
        let province = self.province.trim();

        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(MapleError::InvalidCity(format!(
                "name length {} out of valid range 1..={MAX_NAME_LEN}",
                name.len()
            )));
        }
        if province.is_empty() || province.len() > MAX_NAME_LEN {
            return Err(MapleError::InvalidCity(format!(
                "province length {} out of valid range 1..={MAX_NAME_LEN} for {name}",
                province.len()
            )));
        }
        if !Coordinates::new(self.latitude, self.longitude).is_valid() {
            return Err(MapleError::InvalidCity(format!(
                "coordinates ({}, {}) out of range for {name}",
                self.latitude, self.longitude
            )));
        }

        Ok(())
    }

    /// Key enforcing uniqueness of (name, province).
    #[must_use]
    pub fn unique_key(&self) -> String {
        city_key(&self.name, &self.province)
    }

    /// Attach an id, trimming the text fields.
    #[must_use]
    pub fn into_city(self, id: CityId) -> City {
        City {
            id,
            name: self.name.trim().to_string(),
            province: self.province.trim().to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
            population: self.population,
            enabled: self.enabled,
        }
    }
}

/// Build the (name, province) key. Exact match on trimmed values.
#[must_use]
pub fn city_key(name: &str, province: &str) -> String {
    format!("{}\u{1f}{}", name.trim(), province.trim())
}

// =============================================================================
// PLAYER
// =============================================================================

/// Someone playing, identified only by an opaque id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub created_at: DateTime<Utc>,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, created_at: DateTime<Utc>) -> Self {
        Self { id, created_at }
    }
}

// =============================================================================
// DAILY PUZZLE
// =============================================================================

/// The target city for one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPuzzle {
    pub date: NaiveDate,
    pub city_id: CityId,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// GAME SESSION
// =============================================================================

/// One player's attempt at one day's puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub id: SessionId,
    pub player_id: PlayerId,
    pub puzzle_date: NaiveDate,
    /// Copied from the puzzle when the session starts.
    pub target_city_id: CityId,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl GameSession {
    /// A fresh, unsolved session against `puzzle`.
    #[must_use]
    pub fn start(player_id: PlayerId, puzzle: &DailyPuzzle, now: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::generate(),
            player_id,
            puzzle_date: puzzle.date,
            target_city_id: puzzle.city_id,
            completed: false,
            created_at: now,
        }
    }
}

// =============================================================================
// GUESS
// =============================================================================

/// A scored guess. Province match and population hint are derived on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guess {
    pub session_id: SessionId,
    pub city_id: CityId,
    pub distance_km: u32,
    pub direction: Direction,
    pub correct: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_city(name: &str, province: &str) -> NewCity {
        NewCity {
            name: name.to_string(),
            province: province.to_string(),
            latitude: 45.0,
            longitude: -75.0,
            population: 1000,
            enabled: true,
        }
    }

    #[test]
    fn unique_key_ignores_surrounding_whitespace() {
        assert_eq!(
            new_city(" Richmond ", "BC").unique_key(),
            new_city("Richmond", "BC ").unique_key()
        );
        assert_ne!(
            new_city("Richmond", "BC").unique_key(),
            new_city("Richmond", "QC").unique_key()
        );
    }

    #[test]
    fn validate_rejects_bad_rows() {
        assert!(new_city("Ottawa", "ON").validate().is_ok());
        assert!(new_city("  ", "ON").validate().is_err());
        assert!(new_city("Ottawa", "").validate().is_err());

        let mut far = new_city("Nowhere", "ON");
        far.latitude = 123.0;
        assert!(far.validate().is_err());
    }

    #[test]
    fn name_match_is_case_insensitive() {
        let city = new_city("Trois-Rivières", "QC").into_city(CityId(1));
        assert!(city.matches_name("trois-rivières"));
        assert!(city.matches_name(" TROIS-RIVIÈRES "));
        assert!(!city.matches_name("Trois"));
    }
}
