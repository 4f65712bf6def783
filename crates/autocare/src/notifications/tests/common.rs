use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::clock::ManualClock;
use crate::notifications::domain::{
    Notification, NotificationId, NotificationPreferences, UserId,
};
use crate::notifications::repository::{NotificationStore, StoreError};
use crate::notifications::templates::{InspectionEvent, MaintenanceEvent, ReminderEvent};
use crate::notifications::{InMemoryNotificationStore, NotificationDispatcher};

pub(super) const OWNER: UserId = UserId(42);

pub(super) fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 9, 30, 0)
        .single()
        .expect("valid start time")
}

pub(super) fn build_dispatcher() -> (
    NotificationDispatcher<InMemoryNotificationStore>,
    Arc<InMemoryNotificationStore>,
    Arc<ManualClock>,
) {
    let store = Arc::new(InMemoryNotificationStore::default());
    let clock = Arc::new(ManualClock::starting_at(start_time()));
    let dispatcher = NotificationDispatcher::with_clock(store.clone(), clock.clone());
    (dispatcher, store, clock)
}

pub(super) fn inspection_event() -> InspectionEvent {
    InspectionEvent {
        inspection_id: 12,
        vehicle_id: 7,
        vehicle_label: "HB20 QWE4R56".to_string(),
        workshop_name: Some("Auto Center Paulista".to_string()),
        scheduled_for: chrono::NaiveDate::from_ymd_opt(2025, 6, 20),
    }
}

pub(super) fn maintenance_event() -> MaintenanceEvent {
    MaintenanceEvent {
        maintenance_id: 55,
        vehicle_id: 7,
        vehicle_label: "HB20 QWE4R56".to_string(),
        service: "Oil change".to_string(),
        cost: Some(289.9),
        mileage: Some(48250.0),
    }
}

pub(super) fn reminder_event(days_until_due: i64) -> ReminderEvent {
    ReminderEvent {
        vehicle_id: 7,
        vehicle_label: "HB20 QWE4R56".to_string(),
        subject: "Timing belt replacement".to_string(),
        days_until_due,
    }
}

/// Store whose every call fails, for exercising the soft-failure paths.
pub(super) struct UnavailableStore;

fn unavailable<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("database offline".to_string()))
}

impl NotificationStore for UnavailableStore {
    fn insert(&self, _notification: Notification) -> Result<Notification, StoreError> {
        unavailable()
    }

    fn preferences(&self, _user_id: UserId) -> Result<Option<NotificationPreferences>, StoreError> {
        unavailable()
    }

    fn save_preferences(
        &self,
        _preferences: NotificationPreferences,
    ) -> Result<NotificationPreferences, StoreError> {
        unavailable()
    }

    fn list_for_user(
        &self,
        _user_id: UserId,
        _unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError> {
        unavailable()
    }

    fn mark_read(&self, _id: &NotificationId, _at: DateTime<Utc>) -> Result<Notification, StoreError> {
        unavailable()
    }

    fn mark_all_read(&self, _user_id: UserId, _at: DateTime<Utc>) -> Result<usize, StoreError> {
        unavailable()
    }

    fn delete_expired(&self, _now: DateTime<Utc>) -> Result<usize, StoreError> {
        unavailable()
    }

    fn mark_stale_read(
        &self,
        _created_before: DateTime<Utc>,
        _at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        unavailable()
    }
}

/// Store that serves preferences but cannot write notifications.
#[derive(Default)]
pub(super) struct ReadOnlyStore {
    pub(super) inner: InMemoryNotificationStore,
}

impl NotificationStore for ReadOnlyStore {
    fn insert(&self, _notification: Notification) -> Result<Notification, StoreError> {
        unavailable()
    }

    fn preferences(&self, user_id: UserId) -> Result<Option<NotificationPreferences>, StoreError> {
        self.inner.preferences(user_id)
    }

    fn save_preferences(
        &self,
        preferences: NotificationPreferences,
    ) -> Result<NotificationPreferences, StoreError> {
        self.inner.save_preferences(preferences)
    }

    fn list_for_user(
        &self,
        user_id: UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, StoreError> {
        self.inner.list_for_user(user_id, unread_only)
    }

    fn mark_read(&self, id: &NotificationId, at: DateTime<Utc>) -> Result<Notification, StoreError> {
        self.inner.mark_read(id, at)
    }

    fn mark_all_read(&self, user_id: UserId, at: DateTime<Utc>) -> Result<usize, StoreError> {
        self.inner.mark_all_read(user_id, at)
    }

    fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        self.inner.delete_expired(now)
    }

    fn mark_stale_read(
        &self,
        created_before: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        self.inner.mark_stale_read(created_before, at)
    }
}
