use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use super::domain::{
    NewNotification, Notification, NotificationId, NotificationPreferences, NotificationType,
    Priority, PreferencesUpdate, UserId,
};
use super::repository::{NotificationStore, StoreError};
use super::templates::{self, InspectionEvent, MaintenanceEvent, ReminderEvent};
use crate::clock::{Clock, SystemClock};
use crate::config::NotificationConfig;

const DEFAULT_STALE_AFTER_DAYS: i64 = 15;

/// What happened to a creation request.
///
/// Preference suppression is a normal outcome; `Failed` means the store misbehaved and the
/// error has already been logged.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Created(Notification),
    Suppressed(NotificationType),
    Failed(String),
}

impl DispatchOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, DispatchOutcome::Created(_))
    }

    pub fn notification(&self) -> Option<&Notification> {
        match self {
            DispatchOutcome::Created(notification) => Some(notification),
            _ => None,
        }
    }

    pub fn into_notification(self) -> Option<Notification> {
        match self {
            DispatchOutcome::Created(notification) => Some(notification),
            _ => None,
        }
    }
}

/// Counts from one housekeeping pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceReport {
    pub expired_deleted: usize,
    pub stale_marked_read: usize,
}

/// Preference-aware notification creation plus periodic cleanup.
pub struct NotificationDispatcher<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    stale_after: Duration,
}

impl<S> NotificationDispatcher<S>
where
    S: NotificationStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            stale_after: Duration::days(DEFAULT_STALE_AFTER_DAYS),
        }
    }

    pub fn from_config(store: Arc<S>, config: &NotificationConfig) -> Self {
        Self::new(store).with_stale_after_days(config.stale_after_days)
    }

    pub fn with_stale_after_days(mut self, days: i64) -> Self {
        self.stale_after = Duration::days(days.max(0));
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Persist `request` unless the owner opted out of its category.
    pub fn create_notification(&self, request: NewNotification) -> DispatchOutcome {
        let user_id = request.user_id;
        let kind = request.kind;

        let preferences = match self.store.preferences(user_id) {
            Ok(preferences) => preferences,
            Err(err) => {
                error!(%user_id, kind = kind.as_str(), error = %err, "failed to load notification preferences");
                return DispatchOutcome::Failed(err.to_string());
            }
        };

        if let Some(preferences) = preferences {
            if !preferences.allows(kind) {
                debug!(%user_id, kind = kind.as_str(), "notification suppressed by user preferences");
                return DispatchOutcome::Suppressed(kind);
            }
        }

        let now = self.clock.utc_now();
        let data = match request.data {
            Value::Null => json!({}),
            other => other,
        };
        let notification = Notification {
            id: NotificationId::new(),
            user_id,
            kind,
            title: request.title,
            message: request.message,
            priority: request.priority.unwrap_or_default(),
            data,
            action_url: request.action_url,
            expires_at: request.expires_at,
            read: false,
            read_at: None,
            created_at: now,
            updated_at: now,
        };

        match self.store.insert(notification) {
            Ok(stored) => {
                info!(%user_id, id = %stored.id, kind = kind.as_str(), priority = ?stored.priority, "notification created");
                DispatchOutcome::Created(stored)
            }
            Err(err) => {
                error!(%user_id, kind = kind.as_str(), error = %err, "failed to persist notification");
                DispatchOutcome::Failed(err.to_string())
            }
        }
    }

    pub fn notify_inspection_created(&self, user_id: UserId, event: &InspectionEvent) -> DispatchOutcome {
        self.create_notification(templates::inspection_created(user_id, event, self.clock.utc_now()))
    }

    pub fn notify_inspection_approved(&self, user_id: UserId, event: &InspectionEvent) -> DispatchOutcome {
        self.create_notification(templates::inspection_approved(user_id, event, self.clock.utc_now()))
    }

    pub fn notify_inspection_rejected(
        &self,
        user_id: UserId,
        event: &InspectionEvent,
        reason: Option<&str>,
    ) -> DispatchOutcome {
        self.create_notification(templates::inspection_rejected(
            user_id,
            event,
            reason,
            self.clock.utc_now(),
        ))
    }

    pub fn notify_maintenance_created(&self, user_id: UserId, event: &MaintenanceEvent) -> DispatchOutcome {
        self.create_notification(templates::maintenance_created(user_id, event, self.clock.utc_now()))
    }

    pub fn notify_maintenance_completed(&self, user_id: UserId, event: &MaintenanceEvent) -> DispatchOutcome {
        self.create_notification(templates::maintenance_completed(user_id, event, self.clock.utc_now()))
    }

    pub fn notify_maintenance_reminder(&self, user_id: UserId, event: &ReminderEvent) -> DispatchOutcome {
        self.create_notification(templates::maintenance_reminder(user_id, event, self.clock.utc_now()))
    }

    pub fn notify_inspection_reminder(&self, user_id: UserId, event: &ReminderEvent) -> DispatchOutcome {
        self.create_notification(templates::inspection_reminder(user_id, event, self.clock.utc_now()))
    }

    pub fn notify_system_update(
        &self,
        user_id: UserId,
        title: &str,
        message: &str,
        priority: Priority,
    ) -> DispatchOutcome {
        self.create_notification(templates::system_update(
            user_id,
            title,
            message,
            priority,
            self.clock.utc_now(),
        ))
    }

    /// Delete notifications whose expiry has passed. Store failures are logged and count as 0.
    pub fn cleanup_expired(&self) -> usize {
        match self.store.delete_expired(self.clock.utc_now()) {
            Ok(deleted) => {
                info!(deleted, "expired notifications removed");
                deleted
            }
            Err(err) => {
                error!(error = %err, "expired notification cleanup failed");
                0
            }
        }
    }

    /// Mark unread notifications older than the stale threshold as read. Failures count as 0.
    pub fn mark_stale_as_read(&self) -> usize {
        let now = self.clock.utc_now();
        match self.store.mark_stale_read(now - self.stale_after, now) {
            Ok(updated) => {
                info!(updated, stale_after_days = self.stale_after.num_days(), "stale notifications marked read");
                updated
            }
            Err(err) => {
                error!(error = %err, "stale notification sweep failed");
                0
            }
        }
    }

    pub fn run_maintenance(&self) -> MaintenanceReport {
        MaintenanceReport {
            expired_deleted: self.cleanup_expired(),
            stale_marked_read: self.mark_stale_as_read(),
        }
    }

    pub fn list_for_user(&self, user_id: UserId, unread_only: bool) -> Result<Vec<Notification>, StoreError> {
        self.store.list_for_user(user_id, unread_only)
    }

    pub fn mark_read(&self, id: &NotificationId) -> Result<Notification, StoreError> {
        self.store.mark_read(id, self.clock.utc_now())
    }

    pub fn mark_all_read(&self, user_id: UserId) -> Result<usize, StoreError> {
        self.store.mark_all_read(user_id, self.clock.utc_now())
    }

    /// Stored preferences, or the allow-everything default.
    pub fn preferences(&self, user_id: UserId) -> Result<NotificationPreferences, StoreError> {
        Ok(self
            .store
            .preferences(user_id)?
            .unwrap_or_else(|| NotificationPreferences::permissive(user_id)))
    }

    pub fn update_preferences(
        &self,
        user_id: UserId,
        update: &PreferencesUpdate,
    ) -> Result<NotificationPreferences, StoreError> {
        let mut preferences = self.preferences(user_id)?;
        preferences.apply(update);
        let saved = self.store.save_preferences(preferences)?;
        info!(%user_id, "notification preferences updated");
        Ok(saved)
    }
}
