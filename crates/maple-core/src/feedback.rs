//! # Feedback Module
//!
//! Scores a guessed city against the hidden target.

use crate::geo::{Direction, direction, distance_km};
use crate::model::City;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How the target's population compares to the guess.
///
/// `Larger` means the target is bigger than the guessed city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PopulationHint {
    Larger,
    Smaller,
    Equal,
}

impl PopulationHint {
    /// Compare a guessed population to the target population.
    #[must_use]
    pub fn compare(guessed: u64, target: u64) -> Self {
        match guessed.cmp(&target) {
            Ordering::Less => Self::Larger,
            Ordering::Greater => Self::Smaller,
            Ordering::Equal => Self::Equal,
        }
    }
}

/// Everything a player learns from one guess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessFeedback {
    pub correct: bool,
    pub distance_km: u32,
    pub direction: Direction,
    pub province_match: bool,
    pub population_hint: PopulationHint,
}

/// Score `guessed` against `target`.
#[must_use]
pub fn score(guessed: &City, target: &City) -> GuessFeedback {
    GuessFeedback {
        correct: guessed.id == target.id,
        distance_km: distance_km(guessed.coordinates(), target.coordinates()),
        direction: direction(guessed.coordinates(), target.coordinates()),
        province_match: guessed.province == target.province,
        population_hint: PopulationHint::compare(guessed.population, target.population),
    }
}

// =============================================================================
// TESTS
// =============================================================================
