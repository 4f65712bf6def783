//! Title/message/priority/expiry templates for domain events.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{NewNotification, NotificationType, Priority, UserId};
use crate::validation::numeric::{format_kilometers, format_monetary};

const EVENT_TTL_DAYS: i64 = 30;
const SYSTEM_UPDATE_TTL_DAYS: i64 = 7;

/// Inspection lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionEvent {
    pub inspection_id: u64,
    pub vehicle_id: u64,
    pub vehicle_label: String,
    pub workshop_name: Option<String>,
    pub scheduled_for: Option<NaiveDate>,
}

/// Maintenance lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceEvent {
    pub maintenance_id: u64,
    pub vehicle_id: u64,
    pub vehicle_label: String,
    pub service: String,
    pub cost: Option<f64>,
    pub mileage: Option<f64>,
}

/// Something due on a vehicle in `days_until_due` days (negative when overdue).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderEvent {
    pub vehicle_id: u64,
    pub vehicle_label: String,
    pub subject: String,
    pub days_until_due: i64,
}

/// `<= 7` days (including overdue) is high, `<= 30` medium, anything later low.
pub fn urgency_for_days(days_until_due: i64) -> Priority {
    if days_until_due <= 7 {
        Priority::High
    } else if days_until_due <= 30 {
        Priority::Medium
    } else {
        Priority::Low
    }
}

fn due_phrase(days: i64) -> String {
    match days {
        d if d < 0 => format!("is overdue by {} day(s)", d.unsigned_abs()),
        0 => "is due today".to_string(),
        1 => "is due tomorrow".to_string(),
        d => format!("is due in {d} days"),
    }
}

pub fn inspection_created(user_id: UserId, event: &InspectionEvent, now: DateTime<Utc>) -> NewNotification {
    let place = event
        .workshop_name
        .as_deref()
        .map(|name| format!(" at {name}"))
        .unwrap_or_default();
    let when = event
        .scheduled_for
        .map(|date| format!(" for {}", date.format("%d/%m/%Y")))
        .unwrap_or_default();

    NewNotification::new(
        user_id,
        NotificationType::InspectionCreated,
        "Inspection scheduled",
        format!(
            "An inspection for {} was scheduled{place}{when}.",
            event.vehicle_label
        ),
    )
    .priority(Priority::Medium)
    .data(json!({
        "inspectionId": event.inspection_id,
        "vehicleId": event.vehicle_id,
        "workshop": event.workshop_name,
        "scheduledFor": event.scheduled_for,
    }))
    .action_url(format!("/inspections/{}", event.inspection_id))
    .expires_at(now + Duration::days(EVENT_TTL_DAYS))
}

pub fn inspection_approved(user_id: UserId, event: &InspectionEvent, now: DateTime<Utc>) -> NewNotification {
    NewNotification::new(
        user_id,
        NotificationType::InspectionApproved,
        "Inspection approved",
        format!("The inspection of {} was approved.", event.vehicle_label),
    )
    .priority(Priority::Medium)
    .data(json!({
        "inspectionId": event.inspection_id,
        "vehicleId": event.vehicle_id,
        "status": "APPROVED",
    }))
    .action_url(format!("/inspections/{}", event.inspection_id))
    .expires_at(now + Duration::days(EVENT_TTL_DAYS))
}

pub fn inspection_rejected(
    user_id: UserId,
    event: &InspectionEvent,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> NewNotification {
    let message = match reason.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reason) => format!(
            "The inspection of {} was rejected: {reason}",
            event.vehicle_label
        ),
        None => format!("The inspection of {} was rejected.", event.vehicle_label),
    };

    NewNotification::new(
        user_id,
        NotificationType::InspectionRejected,
        "Inspection rejected",
        message,
    )
    .priority(Priority::High)
    .data(json!({
        "inspectionId": event.inspection_id,
        "vehicleId": event.vehicle_id,
        "status": "REJECTED",
        "reason": reason,
    }))
    .action_url(format!("/inspections/{}", event.inspection_id))
    .expires_at(now + Duration::days(EVENT_TTL_DAYS))
}

pub fn maintenance_created(user_id: UserId, event: &MaintenanceEvent, now: DateTime<Utc>) -> NewNotification {
    NewNotification::new(
        user_id,
        NotificationType::MaintenanceCreated,
        "Maintenance registered",
        format!("{} was registered for {}.", event.service, event.vehicle_label),
    )
    .priority(Priority::Low)
    .data(json!({
        "maintenanceId": event.maintenance_id,
        "vehicleId": event.vehicle_id,
        "service": event.service,
    }))
    .action_url(format!("/maintenances/{}", event.maintenance_id))
    .expires_at(now + Duration::days(EVENT_TTL_DAYS))
}

pub fn maintenance_completed(user_id: UserId, event: &MaintenanceEvent, now: DateTime<Utc>) -> NewNotification {
    let mut message = format!("{} on {} was completed", event.service, event.vehicle_label);
    if let Some(mileage) = event.mileage {
        message.push_str(&format!(" at {}", format_kilometers(mileage)));
    }
    if let Some(cost) = event.cost {
        message.push_str(&format!(" ({})", format_monetary(cost)));
    }
    message.push('.');

    NewNotification::new(
        user_id,
        NotificationType::MaintenanceCompleted,
        "Maintenance completed",
        message,
    )
    .priority(Priority::Medium)
    .data(json!({
        "maintenanceId": event.maintenance_id,
        "vehicleId": event.vehicle_id,
        "service": event.service,
        "cost": event.cost,
        "mileage": event.mileage,
    }))
    .action_url(format!("/maintenances/{}", event.maintenance_id))
    .expires_at(now + Duration::days(EVENT_TTL_DAYS))
}

fn reminder(
    user_id: UserId,
    kind: NotificationType,
    title: &str,
    event: &ReminderEvent,
    now: DateTime<Utc>,
) -> NewNotification {
    let priority = urgency_for_days(event.days_until_due);
    // Reminders linger one day past the due date.
    let ttl = event.days_until_due.max(0).saturating_add(1);

    let mut notification = NewNotification::new(
        user_id,
        kind,
        title,
        format!(
            "{} for {} {}.",
            event.subject,
            event.vehicle_label,
            due_phrase(event.days_until_due)
        ),
    )
    .priority(priority)
    .data(json!({
        "vehicleId": event.vehicle_id,
        "subject": event.subject,
        "daysUntilDue": event.days_until_due,
    }))
    .action_url(format!("/vehicles/{}", event.vehicle_id));
    // Due dates past chrono's range simply never expire.
    notification.expires_at = Duration::try_days(ttl).and_then(|ttl| now.checked_add_signed(ttl));
    notification
}

pub fn maintenance_reminder(user_id: UserId, event: &ReminderEvent, now: DateTime<Utc>) -> NewNotification {
    reminder(
        user_id,
        NotificationType::MaintenanceReminder,
        "Maintenance reminder",
        event,
        now,
    )
}

pub fn inspection_reminder(user_id: UserId, event: &ReminderEvent, now: DateTime<Utc>) -> NewNotification {
    reminder(
        user_id,
        NotificationType::InspectionReminder,
        "Inspection reminder",
        event,
        now,
    )
}

pub fn system_update(
    user_id: UserId,
    title: &str,
    message: &str,
    priority: Priority,
    now: DateTime<Utc>,
) -> NewNotification {
    NewNotification::new(user_id, NotificationType::SystemUpdate, title, message)
        .priority(priority)
        .data(json!({}))
        .expires_at(now + Duration::days(SYSTEM_UPDATE_TTL_DAYS))
}
