//! Rate limiting middleware using token bucket algorithm

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use governor::{
    clock::QuantaClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter using governor crate
pub type GlobalRateLimiter = RateLimiter<NotKeyed, InMemoryState, QuantaClock>;

/// Create a limiter, or `None` when the rate is zero
pub fn create_rate_limiter(requests_per_second: u32, burst: u32) -> Option<Arc<GlobalRateLimiter>> {
    let rate = NonZeroU32::new(requests_per_second)?;
    let burst = NonZeroU32::new(burst).unwrap_or(rate);

    Some(Arc::new(RateLimiter::direct(Quota::per_second(rate).allow_burst(burst))))
}

/// Rejects requests over the global rate with 429
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<GlobalRateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    match limiter.check() {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            tracing::warn!(path = %request.uri().path(), "Rate limit exceeded");
            Err(StatusCode::TOO_MANY_REQUESTS)
        }
    }
}
