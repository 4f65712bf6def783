//! Preference-aware notification creation, read tracking, and periodic cleanup.

pub mod dispatcher;
pub mod domain;
pub mod memory;
pub mod repository;
pub mod router;
pub mod templates;

#[cfg(test)]
mod tests;

pub use dispatcher::{DispatchOutcome, MaintenanceReport, NotificationDispatcher};
pub use domain::{
    NewNotification, Notification, NotificationId, NotificationPreferences, NotificationType,
    PreferenceCategory, PreferencesUpdate, Priority, UserId,
};
pub use memory::InMemoryNotificationStore;
pub use repository::{NotificationStore, StoreError};
pub use router::notification_router;
pub use templates::{urgency_for_days, InspectionEvent, MaintenanceEvent, ReminderEvent};
