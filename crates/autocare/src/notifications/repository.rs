use chrono::{DateTime, Utc};

use super::domain::{Notification, NotificationId, NotificationPreferences, UserId};

/// Persistence boundary for notifications and their per-user preferences.
pub trait NotificationStore: Send + Sync {
    fn insert(&self, notification: Notification) -> Result<Notification, StoreError>;
    fn preferences(&self, user_id: UserId) -> Result<Option<NotificationPreferences>, StoreError>;
    fn save_preferences(
        &self,
        preferences: NotificationPreferences,
    ) -> Result<NotificationPreferences, StoreError>;
    /// Newest first.
    fn list_for_user(
        &self,
        user_id: UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError>;
    fn mark_read(&self, id: &NotificationId, at: DateTime<Utc>) -> Result<Notification, StoreError>;
    fn mark_all_read(&self, user_id: UserId, at: DateTime<Utc>) -> Result<usize, StoreError>;
    /// Remove notifications whose `expires_at` is strictly before `now`.
    fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
    /// Mark unread notifications created strictly before `created_before` as read.
    fn mark_stale_read(
        &self,
        created_before: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<usize, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("notification not found")]
    NotFound,
    #[error("notification store unavailable: {0}")]
    Unavailable(String),
}
