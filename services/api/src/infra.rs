use autocare::config::{LimitsConfig, NotificationConfig};
use autocare::notifications::{InMemoryNotificationStore, NotificationDispatcher};
use autocare::security::{FixedWindowLimiter, OperationThrottler, ThrottleConfig, ThrottledFs};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) files: ThrottledFs,
}

pub(crate) type Dispatcher = NotificationDispatcher<InMemoryNotificationStore>;

pub(crate) fn in_memory_dispatcher(config: &NotificationConfig) -> Arc<Dispatcher> {
    let store = Arc::new(InMemoryNotificationStore::default());
    Arc::new(NotificationDispatcher::from_config(store, config))
}

pub(crate) fn throttled_files(limits: &LimitsConfig) -> ThrottledFs {
    ThrottledFs::new(Arc::new(OperationThrottler::new(ThrottleConfig::from(limits))))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HousekeepingPass {
    pub(crate) expired_deleted: usize,
    pub(crate) stale_marked_read: usize,
    pub(crate) rate_windows_purged: usize,
    pub(crate) file_windows_purged: usize,
}

/// One round of notification cleanup plus eviction of idle limiter windows.
pub(crate) fn housekeeping_pass(
    dispatcher: &Dispatcher,
    limiter: &FixedWindowLimiter,
    files: &ThrottledFs,
) -> HousekeepingPass {
    let report = dispatcher.run_maintenance();
    let pass = HousekeepingPass {
        expired_deleted: report.expired_deleted,
        stale_marked_read: report.stale_marked_read,
        rate_windows_purged: limiter.purge_expired(),
        file_windows_purged: files.throttler().purge_expired(),
    };
    info!(
        expired_deleted = pass.expired_deleted,
        stale_marked_read = pass.stale_marked_read,
        rate_windows_purged = pass.rate_windows_purged,
        file_windows_purged = pass.file_windows_purged,
        "maintenance pass finished"
    );
    pass
}

pub(crate) fn spawn_maintenance(
    dispatcher: Arc<Dispatcher>,
    limiter: Arc<FixedWindowLimiter>,
    files: ThrottledFs,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every.max(Duration::from_secs(1)));
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            housekeeping_pass(&dispatcher, &limiter, &files);
        }
    })
}
