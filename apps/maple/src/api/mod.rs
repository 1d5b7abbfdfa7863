//! # HTTP API
//!
//! axum router over a shared [`Game`].
//!
//! | Method | Path | Response |
//! |---|---|---|
//! | GET | `/` | service banner |
//! | GET | `/health` | status and version |
//! | GET | `/puzzle/today` | date and puzzle id |
//! | POST | `/player` | new player id |
//! | POST | `/session` | session view (body optional) |
//! | POST | `/guess` | guess feedback |
//! | GET | `/stats` | store counts |
//!
//! POST routes share one global rate limiter. Store calls are synchronous
//! (redb commits fsync), so handlers run them on the blocking pool.

pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod types;

use crate::backend::Backend;
use crate::config::Config;
use axum::http::{HeaderValue, Method, header::CONTENT_TYPE};
use axum::routing::{get, post};
use axum::{Router, middleware};
use governor::DefaultDirectRateLimiter;
use maple_core::Game;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use error::ApiError;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub game: Arc<Mutex<Game<Backend>>>,
    pub limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl AppState {
    /// Wrap `game`; `rate_limit_per_minute == 0` disables limiting.
    #[must_use]
    pub fn new(game: Game<Backend>, rate_limit_per_minute: u32) -> Self {
        Self {
            game: Arc::new(Mutex::new(game)),
            limiter: rate_limit::build_limiter(rate_limit_per_minute).map(Arc::new),
        }
    }

    /// Run `op` against the game on Tokio's blocking pool.
    ///
    /// The lock is held only inside the blocking task.
    pub async fn with_game<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Game<Backend>) -> maple_core::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let game = Arc::clone(&self.game);

        tokio::task::spawn_blocking(move || {
            let mut game = game
                .lock()
                .map_err(|_| ApiError::Internal("game lock poisoned".to_string()))?;
            op(&mut game).map_err(ApiError::from)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("spawn_blocking failed: {e}")))?
    }
}

/// Build the application router.
pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    let writes = Router::new()
        .route("/player", post(handlers::player_handler))
        .route("/session", post(handlers::session_handler))
        .route("/guess", post(handlers::guess_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit,
        ));

    Router::new()
        .route("/", get(handlers::root_handler))
        .route("/health", get(handlers::health_handler))
        .route("/puzzle/today", get(handlers::puzzle_handler))
        .route("/stats", get(handlers::stats_handler))
        .merge(writes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(cors_origins)),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Serve the API until Ctrl+C or SIGTERM.
pub async fn run_server(config: &Config, game: Game<Backend>) -> std::io::Result<()> {
    let state = AppState::new(game, config.rate_limit_per_minute);
    let app = create_router(state, &config.cors_origins);

    let address = config.bind_address();
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!(
        backend = %config.backend,
        rate_limit_per_minute = config.rate_limit_per_minute,
        "Server running on {address}"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
