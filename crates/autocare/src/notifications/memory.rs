use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use super::domain::{Notification, NotificationId, NotificationPreferences, UserId};
use super::repository::{NotificationStore, StoreError};

#[derive(Default)]
struct Tables {
    notifications: HashMap<NotificationId, Notification>,
    preferences: HashMap<UserId, NotificationPreferences>,
}

/// Process-local store used by the API binary and tests.
#[derive(Default, Clone)]
pub struct InMemoryNotificationStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryNotificationStore {
    pub fn len(&self) -> usize {
        self.tables
            .lock()
            .expect("notification store mutex poisoned")
            .notifications
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn all(&self) -> Vec<Notification> {
        let guard = self.tables.lock().expect("notification store mutex poisoned");
        let mut all: Vec<_> = guard.notifications.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }
}

impl NotificationStore for InMemoryNotificationStore {
    fn insert(&self, notification: Notification) -> Result<Notification, StoreError> {
        let mut guard = self.tables.lock().expect("notification store mutex poisoned");
        guard
            .notifications
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    fn preferences(&self, user_id: UserId) -> Result<Option<NotificationPreferences>, StoreError> {
        let guard = self.tables.lock().expect("notification store mutex poisoned");
        Ok(guard.preferences.get(&user_id).copied())
    }

    fn save_preferences(
        &self,
        preferences: NotificationPreferences,
    ) -> Result<NotificationPreferences, StoreError> {
        let mut guard = self.tables.lock().expect("notification store mutex poisoned");
        guard.preferences.insert(preferences.user_id, preferences);
        Ok(preferences)
    }

    fn list_for_user(
        &self,
        user_id: UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError> {
        let guard = self.tables.lock().expect("notification store mutex poisoned");
        let mut list: Vec<_> = guard
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.read))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    fn mark_read(&self, id: &NotificationId, at: DateTime<Utc>) -> Result<Notification, StoreError> {
        let mut guard = self.tables.lock().expect("notification store mutex poisoned");
        let notification = guard.notifications.get_mut(id).ok_or(StoreError::NotFound)?;
        if !notification.read {
            notification.mark_read(at);
        }
        Ok(notification.clone())
    }

    fn mark_all_read(&self, user_id: UserId, at: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut guard = self.tables.lock().expect("notification store mutex poisoned");
        let mut updated = 0;
        for notification in guard
            .notifications
            .values_mut()
            .filter(|n| n.user_id == user_id && !n.read)
        {
            notification.mark_read(at);
            updated += 1;
        }
        Ok(updated)
    }

    fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut guard = self.tables.lock().expect("notification store mutex poisoned");
        let before = guard.notifications.len();
        guard.notifications.retain(|_, n| !n.is_expired(now));
        Ok(before - guard.notifications.len())
    }

    fn mark_stale_read(
        &self,
        created_before: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let mut guard = self.tables.lock().expect("notification store mutex poisoned");
        let mut updated = 0;
        for notification in guard
            .notifications
            .values_mut()
            .filter(|n| !n.read && n.created_at < created_before)
        {
            notification.mark_read(at);
            updated += 1;
        }
        Ok(updated)
    }
}
