//! Request-boundary protection: rate limiting, file-operation throttling, and injection guards.

pub mod client;
pub mod middleware;
pub mod patterns;
pub mod rate_limit;
pub mod throttle;
pub mod window;

pub use client::client_identifier;
pub use middleware::{request_logging_middleware, security_guard_middleware};
pub use patterns::{scan_json, scan_text, SecurityThreat};
pub use rate_limit::{rate_limit_middleware, FixedWindowLimiter, RateLimitConfig};
pub use throttle::{OperationThrottler, ThrottleConfig, ThrottleError, ThrottledFs};
pub use window::{RateDecision, RateLimited, RateWindow};
