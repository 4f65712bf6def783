use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

use super::client::client_identifier;
use super::window::{RateDecision, RateLimited, WindowConfig, WindowCounter};
use crate::clock::{Clock, SystemClock};
use crate::config::LimitsConfig;

pub const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window: Duration::from_secs(60),
        }
    }
}

impl From<&LimitsConfig> for RateLimitConfig {
    fn from(limits: &LimitsConfig) -> Self {
        Self {
            max_requests: limits.rate_limit_max,
            window: limits.rate_limit_window,
        }
    }
}

/// Per-client fixed-window request limiter.
pub struct FixedWindowLimiter {
    counter: WindowCounter,
    clock: Arc<dyn Clock>,
}

impl FixedWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        let counter = WindowCounter::new(WindowConfig {
            max_hits: config.max_requests,
            window: config.window,
        });
        Self { counter, clock }
    }

    pub fn limit(&self) -> u32 {
        self.counter.config().max_hits
    }

    /// Count one request for `identifier`, or report how long until its window resets.
    pub fn check(&self, identifier: &str) -> Result<RateDecision, RateLimited> {
        self.counter.hit(identifier, self.clock.now())
    }

    /// Forget identifiers whose window has elapsed. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.counter.purge(self.clock.now())
    }

    pub fn tracked_identifiers(&self) -> usize {
        self.counter.tracked()
    }
}

/// Axum middleware rejecting over-limit clients with 429 and `{success, message, retryAfter}`.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<FixedWindowLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_identifier(&request);

    match limiter.check(&client) {
        Ok(decision) => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(decision.limit));
            headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(decision.remaining));
            response
        }
        Err(limited) => {
            let retry_after = limited.retry_after_secs();
            warn!(
                %client,
                path = %request.uri().path(),
                retry_after,
                "rate limit exceeded"
            );
            let body = json!({
                "success": false,
                "message": "Too many requests, please try again later.",
                "retryAfter": retry_after,
            });
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, HeaderValue::from(retry_after))],
                Json(body),
            )
                .into_response()
        }
    }
}
