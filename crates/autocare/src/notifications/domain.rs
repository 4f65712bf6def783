use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Owner of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub Uuid);

impl NotificationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reminder and alert kinds emitted by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    MaintenanceReminder,
    MaintenanceCreated,
    MaintenanceCompleted,
    InspectionReminder,
    InspectionCreated,
    InspectionApproved,
    InspectionRejected,
    PaymentDue,
    Promotional,
    SystemUpdate,
    Emergency,
}

impl NotificationType {
    pub const ALL: [NotificationType; 11] = [
        NotificationType::MaintenanceReminder,
        NotificationType::MaintenanceCreated,
        NotificationType::MaintenanceCompleted,
        NotificationType::InspectionReminder,
        NotificationType::InspectionCreated,
        NotificationType::InspectionApproved,
        NotificationType::InspectionRejected,
        NotificationType::PaymentDue,
        NotificationType::Promotional,
        NotificationType::SystemUpdate,
        NotificationType::Emergency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::MaintenanceReminder => "MAINTENANCE_REMINDER",
            NotificationType::MaintenanceCreated => "MAINTENANCE_CREATED",
            NotificationType::MaintenanceCompleted => "MAINTENANCE_COMPLETED",
            NotificationType::InspectionReminder => "INSPECTION_REMINDER",
            NotificationType::InspectionCreated => "INSPECTION_CREATED",
            NotificationType::InspectionApproved => "INSPECTION_APPROVED",
            NotificationType::InspectionRejected => "INSPECTION_REJECTED",
            NotificationType::PaymentDue => "PAYMENT_DUE",
            NotificationType::Promotional => "PROMOTIONAL",
            NotificationType::SystemUpdate => "SYSTEM_UPDATE",
            NotificationType::Emergency => "EMERGENCY",
        }
    }

    /// Case-insensitive lookup of the wire name.
    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
    }

    pub fn category(&self) -> PreferenceCategory {
        match self {
            NotificationType::MaintenanceReminder
            | NotificationType::MaintenanceCreated
            | NotificationType::MaintenanceCompleted => PreferenceCategory::Maintenance,
            NotificationType::InspectionReminder
            | NotificationType::InspectionCreated
            | NotificationType::InspectionApproved
            | NotificationType::InspectionRejected => PreferenceCategory::Inspection,
            NotificationType::PaymentDue => PreferenceCategory::Payment,
            NotificationType::Promotional => PreferenceCategory::Promotional,
            NotificationType::SystemUpdate => PreferenceCategory::System,
            NotificationType::Emergency => PreferenceCategory::Emergency,
        }
    }
}

/// Opt-in/opt-out buckets a user controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceCategory {
    Maintenance,
    Inspection,
    Payment,
    Promotional,
    System,
    Emergency,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

/// Persisted notification owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: Priority,
    pub data: Value,
    pub action_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |expires_at| expires_at < now)
    }

    pub fn mark_read(&mut self, at: DateTime<Utc>) {
        self.read = true;
        self.read_at = Some(at);
        self.updated_at = at;
    }
}

/// Request to create a notification; the dispatcher fills in identity and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub action_url: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewNotification {
    pub fn new(
        user_id: UserId,
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            priority: None,
            data: Value::Null,
            action_url: None,
            expires_at: None,
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn action_url(mut self, url: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self
    }

    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }
}

/// Per-user category flags. Users without a record receive everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub user_id: UserId,
    pub maintenance: bool,
    pub inspection: bool,
    pub payment: bool,
    pub promotional: bool,
    pub system: bool,
    pub emergency: bool,
}

impl NotificationPreferences {
    pub fn permissive(user_id: UserId) -> Self {
        Self {
            user_id,
            maintenance: true,
            inspection: true,
            payment: true,
            promotional: true,
            system: true,
            emergency: true,
        }
    }

    pub fn allows(&self, kind: NotificationType) -> bool {
        match kind.category() {
            PreferenceCategory::Maintenance => self.maintenance,
            PreferenceCategory::Inspection => self.inspection,
            PreferenceCategory::Payment => self.payment,
            PreferenceCategory::Promotional => self.promotional,
            PreferenceCategory::System => self.system,
            PreferenceCategory::Emergency => self.emergency,
        }
    }

    pub fn apply(&mut self, update: &PreferencesUpdate) {
        let fields = [
            (&mut self.maintenance, update.maintenance),
            (&mut self.inspection, update.inspection),
            (&mut self.payment, update.payment),
            (&mut self.promotional, update.promotional),
            (&mut self.system, update.system),
            (&mut self.emergency, update.emergency),
        ];
        for (flag, value) in fields {
            if let Some(value) = value {
                *flag = value;
            }
        }
    }
}

/// Partial preference change; absent flags keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesUpdate {
    pub maintenance: Option<bool>,
    pub inspection: Option<bool>,
    pub payment: Option<bool>,
    pub promotional: Option<bool>,
    pub system: Option<bool>,
    pub emergency: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_type_maps_to_a_category_and_round_trips_its_name() {
        for kind in NotificationType::ALL {
            assert_eq!(NotificationType::parse(kind.as_str()), Some(kind));
            let wire = serde_json::to_value(kind).expect("serializes");
            assert_eq!(wire, kind.as_str());
        }
        assert_eq!(
            NotificationType::parse("inspection_rejected"),
            Some(NotificationType::InspectionRejected)
        );
        assert_eq!(NotificationType::parse("birthday"), None);
    }

    #[test]
    fn preferences_gate_by_category() {
        let mut prefs = NotificationPreferences::permissive(UserId(1));
        prefs.apply(&PreferencesUpdate {
            maintenance: Some(false),
            ..PreferencesUpdate::default()
        });

        assert!(!prefs.allows(NotificationType::MaintenanceReminder));
        assert!(!prefs.allows(NotificationType::MaintenanceCompleted));
        assert!(prefs.allows(NotificationType::InspectionApproved));
        assert!(prefs.allows(NotificationType::Emergency));
    }

    #[test]
    fn priority_defaults_to_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(Priority::parse("HIGH"), Some(Priority::High));
        assert_eq!(Priority::parse("urgent"), None);
    }
}
