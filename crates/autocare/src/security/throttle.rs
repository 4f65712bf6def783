//! Throttling of file-system work per client: a fixed window plus a cap on in-flight calls.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, warn};

use super::window::{WindowConfig, WindowCounter};
use crate::clock::{Clock, SystemClock};
use crate::config::LimitsConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    pub max_per_window: u32,
    pub window: Duration,
    pub max_concurrent: usize,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_per_window: 30,
            window: Duration::from_secs(60),
            max_concurrent: 5,
        }
    }
}

impl From<&LimitsConfig> for ThrottleConfig {
    fn from(limits: &LimitsConfig) -> Self {
        Self {
            max_per_window: limits.fs_throttle_max,
            window: limits.fs_throttle_window,
            max_concurrent: limits.fs_throttle_concurrency,
        }
    }
}

#[derive(Debug)]
pub enum ThrottleError<E> {
    RateLimited { retry_after: Duration },
    TooManyConcurrent { limit: usize },
    Operation(E),
}

impl<E: fmt::Display> fmt::Display for ThrottleError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThrottleError::RateLimited { retry_after } => write!(
                f,
                "too many file operations, retry in {}s",
                retry_after.as_secs().max(1)
            ),
            ThrottleError::TooManyConcurrent { limit } => {
                write!(f, "too many concurrent file operations (limit {limit})")
            }
            ThrottleError::Operation(err) => write!(f, "file operation failed: {err}"),
        }
    }
}

impl<E> std::error::Error for ThrottleError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ThrottleError::Operation(err) => Some(err),
            _ => None,
        }
    }
}

/// Gate for client-triggered operations.
///
/// In-flight operations are tracked by a unique `identifier:timestamp_ms:sequence` key so the
/// concurrency count stays exact regardless of completion order.
pub struct OperationThrottler {
    config: ThrottleConfig,
    window: WindowCounter,
    in_flight: Mutex<HashMap<String, String>>,
    sequence: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl OperationThrottler {
    pub fn new(config: ThrottleConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ThrottleConfig, clock: Arc<dyn Clock>) -> Self {
        let window = WindowCounter::new(WindowConfig {
            max_hits: config.max_per_window,
            window: config.window,
        });
        Self {
            config,
            window,
            in_flight: Mutex::new(HashMap::new()),
            sequence: AtomicU64::new(0),
            clock,
        }
    }

    pub fn config(&self) -> ThrottleConfig {
        self.config
    }

    pub fn in_flight(&self, identifier: &str) -> usize {
        self.in_flight
            .lock()
            .expect("throttle mutex poisoned")
            .values()
            .filter(|owner| owner.as_str() == identifier)
            .count()
    }

    pub fn purge_expired(&self) -> usize {
        self.window.purge(self.clock.now())
    }

    fn admit<E>(&self, identifier: &str) -> Result<InFlight<'_>, ThrottleError<E>> {
        if let Err(limited) = self.window.hit(identifier, self.clock.now()) {
            warn!(%identifier, retry_after = ?limited.retry_after, "file operation rate limit exceeded");
            return Err(ThrottleError::RateLimited {
                retry_after: limited.retry_after,
            });
        }

        let mut in_flight = self.in_flight.lock().expect("throttle mutex poisoned");
        let active = in_flight
            .values()
            .filter(|owner| owner.as_str() == identifier)
            .count();
        if active >= self.config.max_concurrent {
            warn!(%identifier, active, "file operation concurrency limit reached");
            return Err(ThrottleError::TooManyConcurrent {
                limit: self.config.max_concurrent,
            });
        }

        let key = format!(
            "{identifier}:{}:{}",
            self.clock.utc_now().timestamp_millis(),
            self.sequence.fetch_add(1, Ordering::Relaxed)
        );
        in_flight.insert(key.clone(), identifier.to_string());
        debug!(%key, "file operation admitted");

        Ok(InFlight {
            throttler: self,
            key,
        })
    }

    /// Run `operation` on behalf of `identifier` once both limits allow it.
    pub async fn run<F, T, E>(&self, identifier: &str, operation: F) -> Result<T, ThrottleError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        let _slot = self.admit::<E>(identifier)?;
        operation.await.map_err(ThrottleError::Operation)
    }
}

/// Releases its in-flight slot when dropped, whether the operation finished or was cancelled.
struct InFlight<'a> {
    throttler: &'a OperationThrottler,
    key: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.throttler.in_flight.lock() {
            in_flight.remove(&self.key);
        }
    }
}

/// `tokio::fs` calls routed through an [`OperationThrottler`].
#[derive(Clone)]
pub struct ThrottledFs {
    throttler: Arc<OperationThrottler>,
}

impl ThrottledFs {
    pub fn new(throttler: Arc<OperationThrottler>) -> Self {
        Self { throttler }
    }

    pub fn throttler(&self) -> &OperationThrottler {
        &self.throttler
    }

    pub async fn read_to_string(
        &self,
        identifier: &str,
        path: impl AsRef<Path>,
    ) -> Result<String, ThrottleError<std::io::Error>> {
        self.throttler
            .run(identifier, tokio::fs::read_to_string(path.as_ref()))
            .await
    }

    pub async fn write(
        &self,
        identifier: &str,
        path: impl AsRef<Path>,
        contents: impl AsRef<[u8]>,
    ) -> Result<(), ThrottleError<std::io::Error>> {
        self.throttler
            .run(identifier, tokio::fs::write(path.as_ref(), contents.as_ref()))
            .await
    }

    pub async fn remove_file(
        &self,
        identifier: &str,
        path: impl AsRef<Path>,
    ) -> Result<(), ThrottleError<std::io::Error>> {
        self.throttler
            .run(identifier, tokio::fs::remove_file(path.as_ref()))
            .await
    }

    pub async fn metadata_len(
        &self,
        identifier: &str,
        path: impl AsRef<Path>,
    ) -> Result<u64, ThrottleError<std::io::Error>> {
        self.throttler
            .run(identifier, async {
                tokio::fs::metadata(path.as_ref()).await.map(|meta| meta.len())
            })
            .await
    }
}
