//! Global rate limiting for the write endpoints.
//!
//! A single token bucket from `governor` shared by all clients. The bucket
//! holds one minute of quota, so short bursts up to the per-minute limit pass.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use tracing::warn;

use super::AppState;
use super::error::ApiError;

/// Build a limiter, or `None` when `per_minute` is zero (unlimited).
#[must_use]
pub fn build_limiter(per_minute: u32) -> Option<DefaultDirectRateLimiter> {
    NonZeroU32::new(per_minute).map(|n| RateLimiter::direct(Quota::per_minute(n)))
}

/// Middleware rejecting requests once the bucket is empty.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(limiter) = state.limiter.as_deref()
        && limiter.check().is_err()
    {
        warn!(path = %request.uri().path(), "Rate limit exceeded");
        return Err(ApiError::RateLimited);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_disables_limiting() {
        assert!(build_limiter(0).is_none());
    }

    #[test]
    fn burst_up_to_quota() {
        let Some(limiter) = build_limiter(3) else {
            unreachable!("non-zero quota builds a limiter");
        };
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }
}
