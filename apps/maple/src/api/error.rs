//! Error type for the HTTP layer.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use maple_core::MapleError;
use thiserror::Error;
use tracing::error;

use super::types::ErrorResponse;

/// Errors returned by handlers.
///
/// The body is always `{ "error": message }`. Backend failures are logged and
/// answered with a generic message.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body could not be parsed.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Too many requests in the current window.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// A game rule or storage failure.
    #[error(transparent)]
    Game(#[from] MapleError),

    /// The worker running a store call failed or the game lock is poisoned.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Whether the failure is on our side. Details are logged, not returned.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        match self {
            Self::Internal(_) => true,
            Self::Game(err) => err.is_internal(),
            Self::MalformedPayload(_) | Self::RateLimited => false,
        }
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        if self.is_internal() {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }

        match self {
            Self::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Game(err) => match err {
                MapleError::SessionNotFound
                | MapleError::CityNotFound(_)
                | MapleError::TargetCityNotFound => StatusCode::NOT_FOUND,
                MapleError::SessionCompleted => StatusCode::CONFLICT,
                MapleError::EmptyGuess | MapleError::InvalidId(_) | MapleError::InvalidCity(_) => {
                    StatusCode::BAD_REQUEST
                }
                MapleError::NoCitiesAvailable => StatusCode::SERVICE_UNAVAILABLE,
                MapleError::Storage(_) | MapleError::Codec(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if self.is_internal() {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::from(MapleError::SessionNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(MapleError::CityNotFound("X".into())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(MapleError::TargetCityNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(MapleError::SessionCompleted).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(MapleError::EmptyGuess).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(MapleError::NoCitiesAvailable).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(MapleError::Storage("disk".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::MalformedPayload("eof".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::RateLimited.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            ApiError::Internal("join".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let response = ApiError::from(MapleError::Storage("/secret/path".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
