//! # Error Module
//!
//! One error type for the whole core crate.

use thiserror::Error;

/// Errors produced by the game services and the stores.
#[derive(Debug, Error)]
pub enum MapleError {
    /// No session with the given id.
    #[error("Session not found")]
    SessionNotFound,

    /// The session was already solved; no further guesses are accepted.
    #[error("Session already completed")]
    SessionCompleted,

    /// The guessed name matched no city.
    #[error("City not found: {0}")]
    CityNotFound(String),

    /// The session points at a target city that no longer exists.
    #[error("Target city not found")]
    TargetCityNotFound,

    /// A daily puzzle was requested but no city is enabled.
    #[error("No cities available")]
    NoCitiesAvailable,

    /// The guess was empty after trimming.
    #[error("Guess must name a city")]
    EmptyGuess,

    /// An identifier could not be parsed.
    #[error("Invalid id: {0}")]
    InvalidId(String),

    /// A seed row failed validation.
    #[error("Invalid city: {0}")]
    InvalidCity(String),

    /// The storage backend failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A stored row could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(#[from] postcard::Error),
}

impl MapleError {
    /// Wrap any redb error as a storage failure.
    pub fn storage(err: impl Into<redb::Error>) -> Self {
        Self::Storage(err.into().to_string())
    }

    /// Whether the error comes from the backend rather than from the request.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Codec(_))
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, MapleError>;
