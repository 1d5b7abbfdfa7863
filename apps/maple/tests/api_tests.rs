//! Integration tests for the HTTP API.
//!
//! Runs the router in-process with axum-test over the memory backend.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::Utc;
use maple::api::{AppState, create_router};
use maple::backend::Backend;
use maple::maple_core::{
    City, CityId, DailyPuzzle, Game, GameStore, GuessFeedback, MemoryStore, NewCity, SessionView,
    today_utc,
};
use serde_json::{Value, json};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn city(name: &str, province: &str, latitude: f64, longitude: f64, population: u64) -> NewCity {
    NewCity {
        name: name.to_string(),
        province: province.to_string(),
        latitude,
        longitude,
        population,
        enabled: true,
    }
}

fn seeded_game() -> Game<Backend> {
    let mut game = Game::new(Backend::Memory(MemoryStore::new()), "test-salt");
    game.seed_cities([
        city("Toronto", "Ontario", 43.6532, -79.3832, 2_794_356),
        city("Ottawa", "Ontario", 45.4215, -75.6972, 1_017_449),
        city("Montreal", "Quebec", 45.5017, -73.5673, 1_762_949),
        city("Vancouver", "British Columbia", 49.2827, -123.1207, 662_248),
        city("Halifax", "Nova Scotia", 44.6488, -63.5752, 439_819),
    ])
    .unwrap();
    game
}

/// Server over a seeded game, plus today's target.
fn test_server(rate_limit_per_minute: u32) -> (TestServer, City) {
    let mut game = seeded_game();
    let (_, target) = game.daily_target(today_utc(), Utc::now()).unwrap();

    let state = AppState::new(game, rate_limit_per_minute);
    let server = TestServer::new(create_router(state, &[])).unwrap();
    (server, target)
}

/// A seeded city that is not the target.
fn wrong_city(target: &City) -> &'static str {
    if target.name == "Toronto" { "Halifax" } else { "Toronto" }
}

async fn start_session(server: &TestServer) -> SessionView {
    let response = server.post("/session").await;
    response.assert_status_ok();
    response.json::<SessionView>()
}

// =============================================================================
// INFO ROUTES
// =============================================================================

#[tokio::test]
async fn test_root_banner() {
    let (server, _) = test_server(0);

    let response = server.get("/").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "maple-map API running" }));
}

#[tokio::test]
async fn test_health() {
    let (server, _) = test_server(0);

    let body: Value = server.get("/health").await.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_puzzle_today_hides_city() {
    let (server, target) = test_server(0);

    let response = server.get("/puzzle/today").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["date"], today_utc().to_string());
    assert_eq!(body["puzzleId"], target.id.0);
    assert!(!response.text().contains(&target.name));
}

#[tokio::test]
async fn test_stats_counts() {
    let (server, _) = test_server(0);
    start_session(&server).await;

    let body: Value = server.get("/stats").await.json();
    assert_eq!(body["cities"], 5);
    assert_eq!(body["enabledCities"], 5);
    assert_eq!(body["players"], 1);
    assert_eq!(body["sessions"], 1);
    assert_eq!(body["puzzles"], 1);
}

// =============================================================================
// PLAYERS AND SESSIONS
// =============================================================================

#[tokio::test]
async fn test_create_player() {
    let (server, _) = test_server(0);

    let response = server.post("/player").await;
    response.assert_status_ok();

    let body: Value = response.json();
    let id = body["playerId"].as_str().unwrap();
    assert_eq!(id.len(), 36);
}

#[tokio::test]
async fn test_anonymous_session() {
    let (server, _) = test_server(0);

    let view = start_session(&server).await;
    assert_eq!(view.puzzle_date, today_utc());
    assert!(!view.completed);
    assert!(view.guesses.is_empty());
}

#[tokio::test]
async fn test_session_with_empty_object_is_anonymous() {
    let (server, _) = test_server(0);

    let response = server.post("/session").json(&json!({})).await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_session_resumes_for_player() {
    let (server, target) = test_server(0);

    let first = start_session(&server).await;
    server
        .post("/guess")
        .json(&json!({ "sessionId": first.session_id, "city": wrong_city(&target) }))
        .await
        .assert_status_ok();

    let response = server
        .post("/session")
        .json(&json!({ "playerId": first.player_id }))
        .await;
    response.assert_status_ok();

    let resumed: SessionView = response.json();
    assert_eq!(resumed.session_id, first.session_id);
    assert_eq!(resumed.guesses.len(), 1);
    assert_eq!(resumed.guesses[0].city, wrong_city(&target));
}

#[tokio::test]
async fn test_session_for_unknown_player_registers_it() {
    let (server, _) = test_server(0);
    let player_id = "6a2f41a3-c54c-4d6f-9b1e-2b8e2c5d7f10";

    let response = server
        .post("/session")
        .json(&json!({ "playerId": player_id }))
        .await;
    response.assert_status_ok();

    let view: SessionView = response.json();
    assert_eq!(view.player_id.to_string(), player_id);
}

#[tokio::test]
async fn test_session_malformed_player_id() {
    let (server, _) = test_server(0);

    let response = server
        .post("/session")
        .json(&json!({ "playerId": "not-a-uuid" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_malformed_body() {
    let (server, _) = test_server(0);

    let response = server.post("/session").text("{oops").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().starts_with("Malformed payload"));
}

// =============================================================================
// GUESSES
// =============================================================================

#[tokio::test]
async fn test_wrong_guess_feedback() {
    let (server, target) = test_server(0);
    let session = start_session(&server).await;

    let response = server
        .post("/guess")
        .json(&json!({ "sessionId": session.session_id, "city": wrong_city(&target) }))
        .await;
    response.assert_status_ok();

    let feedback: GuessFeedback = response.json();
    assert!(!feedback.correct);
    assert!(feedback.distance_km > 0);

    let raw: Value = response.json();
    assert!(raw.get("distanceKm").is_some());
    assert!(raw.get("provinceMatch").is_some());
    assert!(raw.get("populationHint").is_some());
}

#[tokio::test]
async fn test_correct_guess_completes_session() {
    let (server, target) = test_server(0);
    let session = start_session(&server).await;

    let response = server
        .post("/guess")
        .json(&json!({
            "sessionId": session.session_id,
            "city": target.name.to_uppercase(),
        }))
        .await;
    response.assert_status_ok();

    let feedback: GuessFeedback = response.json();
    assert!(feedback.correct);
    assert_eq!(feedback.distance_km, 0);
    assert!(feedback.province_match);

    let again = server
        .post("/guess")
        .json(&json!({ "sessionId": session.session_id, "city": wrong_city(&target) }))
        .await;
    again.assert_status(StatusCode::CONFLICT);

    let resumed: SessionView = server
        .post("/session")
        .json(&json!({ "playerId": session.player_id }))
        .await
        .json();
    assert!(resumed.completed);
    assert_eq!(resumed.guesses.len(), 1);
}

#[tokio::test]
async fn test_guess_unknown_session() {
    let (server, _) = test_server(0);

    let response = server
        .post("/guess")
        .json(&json!({
            "sessionId": "00000000-0000-0000-0000-000000000000",
            "city": "Toronto",
        }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_json(&json!({ "error": "Session not found" }));
}

#[tokio::test]
async fn test_guess_unknown_city() {
    let (server, _) = test_server(0);
    let session = start_session(&server).await;

    let response = server
        .post("/guess")
        .json(&json!({ "sessionId": session.session_id, "city": "Atlantis" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_guess_empty_city() {
    let (server, _) = test_server(0);
    let session = start_session(&server).await;

    let response = server
        .post("/guess")
        .json(&json!({ "sessionId": session.session_id, "city": "   " }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_guess_malformed_session_id() {
    let (server, _) = test_server(0);

    let response = server
        .post("/guess")
        .json(&json!({ "sessionId": "42", "city": "Toronto" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_guess_missing_fields() {
    let (server, _) = test_server(0);

    let response = server.post("/guess").json(&json!({ "city": "Toronto" })).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert!(body["error"].is_string());
}

// =============================================================================
// FAILURE MODES
// =============================================================================

#[tokio::test]
async fn test_no_cities_is_unavailable() {
    let game = Game::new(Backend::Memory(MemoryStore::new()), "test-salt");
    let server = TestServer::new(create_router(AppState::new(game, 0), &[])).unwrap();

    server
        .get("/puzzle/today")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
    server
        .post("/session")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_missing_target_city_is_not_found() {
    let mut store = Backend::Memory(MemoryStore::new());
    store
        .upsert_city(city("Ottawa", "Ontario", 45.4215, -75.6972, 1_017_449))
        .unwrap();
    store
        .insert_puzzle(&DailyPuzzle {
            date: today_utc(),
            city_id: CityId(999),
            created_at: Utc::now(),
        })
        .unwrap();
    let game = Game::new(store, "test-salt");
    let server = TestServer::new(create_router(AppState::new(game, 0), &[])).unwrap();

    let session = start_session(&server).await;
    let response = server
        .post("/guess")
        .json(&json!({ "sessionId": session.session_id, "city": "Ottawa" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_json(&json!({ "error": "Target city not found" }));
}

#[tokio::test]
async fn test_poisoned_game_lock_is_internal_error() {
    let state = AppState::new(seeded_game(), 0);
    let game = std::sync::Arc::clone(&state.game);
    let crashed = std::thread::spawn(move || {
        let _guard = game.lock().unwrap();
        panic!("worker died holding the game");
    })
    .join();
    assert!(crashed.is_err());

    let server = TestServer::new(create_router(state, &[])).unwrap();
    let response = server.get("/stats").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_json(&json!({ "error": "Internal server error" }));
}

#[tokio::test]
async fn test_rate_limit_on_writes() {
    let (server, _) = test_server(2);

    server.post("/player").await.assert_status_ok();
    server.post("/player").await.assert_status_ok();

    let limited = server.post("/player").await;
    limited.assert_status(StatusCode::TOO_MANY_REQUESTS);
    limited.assert_json(&json!({ "error": "Rate limit exceeded" }));

    // Reads are not limited.
    server.get("/puzzle/today").await.assert_status_ok();
}
