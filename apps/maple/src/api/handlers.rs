//! Route handlers.
//!
//! Each handler runs one service call through [`AppState::with_game`].

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use chrono::Utc;
use maple_core::{GuessFeedback, PlayerId, SessionId, SessionView, StoreStats, today_utc};
use tracing::{debug, info};

use super::AppState;
use super::error::ApiError;
use super::types::{
    GuessRequest, HealthResponse, PlayerResponse, PuzzleResponse, SessionRequest,
    StatusResponse,
};

/// `GET /`
pub async fn root_handler() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "maple-map API running".to_string(),
    })
}

/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /puzzle/today`
pub async fn puzzle_handler(
    State(state): State<AppState>,
) -> Result<Json<PuzzleResponse>, ApiError> {
    let puzzle = state
        .with_game(|game| game.daily_puzzle(today_utc(), Utc::now()))
        .await?;

    Ok(Json(PuzzleResponse {
        date: puzzle.date,
        puzzle_id: puzzle.city_id,
    }))
}

/// `POST /player`
pub async fn player_handler(
    State(state): State<AppState>,
) -> Result<Json<PlayerResponse>, ApiError> {
    let player_id = state
        .with_game(|game| game.create_player(Utc::now()))
        .await?;
    info!(%player_id, "Player created");

    Ok(Json(PlayerResponse { player_id }))
}

/// `POST /session`
///
/// The body is optional. Without a `playerId` a new player is created.
pub async fn session_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SessionView>, ApiError> {
    let request = parse_session_request(&body)?;

    let player_id = match request.player_id.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(raw.parse::<PlayerId>()?),
        _ => None,
    };

    let view = state
        .with_game(move |game| {
            let (today, now) = (today_utc(), Utc::now());
            match player_id {
                Some(player_id) => game.session_for(player_id, today, now),
                None => game.start_anonymous(today, now),
            }
        })
        .await?;
    debug!(
        session_id = %view.session_id,
        guesses = view.guesses.len(),
        "Session ready"
    );

    Ok(Json(view))
}

fn parse_session_request(body: &[u8]) -> Result<SessionRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(SessionRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::MalformedPayload(e.to_string()))
}

/// `POST /guess`
pub async fn guess_handler(
    State(state): State<AppState>,
    payload: Result<Json<GuessRequest>, JsonRejection>,
) -> Result<Json<GuessFeedback>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::MalformedPayload(e.body_text()))?;
    let session_id: SessionId = request.session_id.parse()?;

    let city = request.city;
    let feedback = state
        .with_game(move |game| game.evaluate_guess(session_id, &city, Utc::now()))
        .await?;

    if feedback.correct {
        info!(%session_id, "Puzzle solved");
    }

    Ok(Json(feedback))
}

/// `GET /stats`
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StoreStats>, ApiError> {
    let stats = state.with_game(|game| game.stats()).await?;
    Ok(Json(stats))
}
