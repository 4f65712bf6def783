use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-identifier counter for the current fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub count: u32,
    pub window_start: Instant,
}

/// Ceiling and window length shared by the request limiter and the file throttler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    pub max_hits: u32,
    pub window: Duration,
}

/// Accepted hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

/// Rejected hit; the client has to wait out the rest of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rate limit exceeded, retry in {}s", .retry_after.as_secs().max(1))]
pub struct RateLimited {
    pub retry_after: Duration,
}

impl RateLimited {
    /// Whole seconds for `Retry-After`, never zero.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.retry_after.as_secs();
        let rounded = if self.retry_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        };
        rounded.max(1)
    }
}

/// Fixed-window counters keyed by client identifier.
///
/// A window resets wholesale once more than `window` has elapsed since it opened, so a
/// client can land up to twice the ceiling across a boundary.
#[derive(Debug)]
pub(crate) struct WindowCounter {
    config: WindowConfig,
    windows: Mutex<HashMap<String, RateWindow>>,
}

impl WindowCounter {
    pub(crate) fn new(config: WindowConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn config(&self) -> WindowConfig {
        self.config
    }

    pub(crate) fn hit(&self, identifier: &str, now: Instant) -> Result<RateDecision, RateLimited> {
        let mut windows = self.windows.lock().expect("rate window mutex poisoned");
        let window = windows
            .entry(identifier.to_string())
            .or_insert(RateWindow {
                count: 0,
                window_start: now,
            });

        if now.saturating_duration_since(window.window_start) > self.config.window {
            *window = RateWindow {
                count: 0,
                window_start: now,
            };
        }

        let elapsed = now.saturating_duration_since(window.window_start);
        let reset_after = self.config.window.saturating_sub(elapsed);

        if window.count >= self.config.max_hits {
            return Err(RateLimited {
                retry_after: reset_after,
            });
        }

        window.count += 1;
        Ok(RateDecision {
            limit: self.config.max_hits,
            remaining: self.config.max_hits - window.count,
            reset_after,
        })
    }

    /// Drop identifiers whose window has already elapsed.
    pub(crate) fn purge(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock().expect("rate window mutex poisoned");
        let before = windows.len();
        windows.retain(|_, window| {
            now.saturating_duration_since(window.window_start) <= self.config.window
        });
        before - windows.len()
    }

    pub(crate) fn tracked(&self) -> usize {
        self.windows.lock().expect("rate window mutex poisoned").len()
    }
}
