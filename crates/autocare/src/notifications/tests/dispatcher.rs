use super::common::*;
use crate::notifications::domain::{
    NewNotification, NotificationPreferences, NotificationType, PreferencesUpdate, Priority,
};
use crate::notifications::repository::{NotificationStore, StoreError};
use crate::notifications::{DispatchOutcome, NotificationDispatcher};
use chrono::Duration;
use std::sync::Arc;

fn reminder_request() -> NewNotification {
    NewNotification::new(
        OWNER,
        NotificationType::MaintenanceReminder,
        "Oil change due",
        "Your oil change is due soon.",
    )
}

#[test]
fn creates_when_no_preferences_exist() {
    let (dispatcher, store, _clock) = build_dispatcher();

    let outcome = dispatcher.create_notification(reminder_request());

    let notification = outcome.into_notification().expect("notification created");
    assert_eq!(notification.priority, Priority::Medium);
    assert_eq!(notification.created_at, start_time());
    assert!(!notification.read);
    assert!(notification.data.is_object());
    assert_eq!(store.len(), 1);
}

#[test]
fn suppresses_when_category_flag_is_off() {
    let (dispatcher, store, _clock) = build_dispatcher();
    let mut preferences = NotificationPreferences::permissive(OWNER);
    preferences.maintenance = false;
    store.save_preferences(preferences).expect("preferences saved");

    let outcome = dispatcher.create_notification(reminder_request());

    assert_eq!(
        outcome,
        DispatchOutcome::Suppressed(NotificationType::MaintenanceReminder)
    );
    assert!(outcome.notification().is_none());
    assert!(store.is_empty());

    let other_category = dispatcher.notify_inspection_approved(OWNER, &inspection_event());
    assert!(other_category.is_created());
}

#[test]
fn proceeds_when_category_flag_is_on() {
    let (dispatcher, store, _clock) = build_dispatcher();
    let mut preferences = NotificationPreferences::permissive(OWNER);
    preferences.promotional = false;
    store.save_preferences(preferences).expect("preferences saved");

    assert!(dispatcher.create_notification(reminder_request()).is_created());
}

#[test]
fn store_failures_are_reported_without_panicking() {
    let dispatcher = NotificationDispatcher::new(Arc::new(UnavailableStore));

    match dispatcher.create_notification(reminder_request()) {
        DispatchOutcome::Failed(reason) => assert!(reason.contains("database offline")),
        other => panic!("expected failure outcome, got {other:?}"),
    }
    assert_eq!(dispatcher.cleanup_expired(), 0);
    assert_eq!(dispatcher.mark_stale_as_read(), 0);

    let write_failure = NotificationDispatcher::new(Arc::new(ReadOnlyStore::default()));
    assert!(matches!(
        write_failure.create_notification(reminder_request()),
        DispatchOutcome::Failed(_)
    ));
}

#[test]
fn event_helpers_apply_templates() {
    let (dispatcher, _store, _clock) = build_dispatcher();

    let created = dispatcher
        .notify_inspection_created(OWNER, &inspection_event())
        .into_notification()
        .expect("created");
    assert_eq!(created.kind, NotificationType::InspectionCreated);
    assert_eq!(created.action_url.as_deref(), Some("/inspections/12"));
    assert_eq!(created.expires_at, Some(start_time() + Duration::days(30)));
    assert!(created.message.contains("Auto Center Paulista"));
    assert!(created.message.contains("20/06/2025"));

    let rejected = dispatcher
        .notify_inspection_rejected(OWNER, &inspection_event(), Some("headlight misaligned"))
        .into_notification()
        .expect("created");
    assert_eq!(rejected.priority, Priority::High);

    let completed = dispatcher
        .notify_maintenance_completed(OWNER, &maintenance_event())
        .into_notification()
        .expect("created");
    assert!(completed.message.contains("R$ 289,90"));
    assert!(completed.message.contains("48.250 km"));

    let logged = dispatcher
        .notify_maintenance_created(OWNER, &maintenance_event())
        .into_notification()
        .expect("created");
    assert_eq!(logged.priority, Priority::Low);

    let update = dispatcher
        .notify_system_update(OWNER, "New release", "Version 2 is live.", Priority::Low)
        .into_notification()
        .expect("created");
    assert_eq!(update.kind, NotificationType::SystemUpdate);
    assert_eq!(update.expires_at, Some(start_time() + Duration::days(7)));
}

#[test]
fn reminders_pick_priority_from_days_until_due() {
    let (dispatcher, _store, _clock) = build_dispatcher();

    let cases = [(3, Priority::High), (21, Priority::Medium), (90, Priority::Low)];
    for (days, expected) in cases {
        let maintenance = dispatcher
            .notify_maintenance_reminder(OWNER, &reminder_event(days))
            .into_notification()
            .expect("created");
        assert_eq!(maintenance.priority, expected, "maintenance, {days} days");

        let inspection = dispatcher
            .notify_inspection_reminder(OWNER, &reminder_event(days))
            .into_notification()
            .expect("created");
        assert_eq!(inspection.priority, expected, "inspection, {days} days");
        assert_eq!(inspection.kind, NotificationType::InspectionReminder);
    }
}

#[test]
fn cleanup_deletes_only_strictly_expired_and_is_idempotent() {
    let (dispatcher, store, clock) = build_dispatcher();
    let now = start_time();

    let expiring = [
        ("already expired", Some(now - Duration::hours(1))),
        ("expires exactly now", Some(now)),
        ("expires later", Some(now + Duration::days(2))),
        ("never expires", None),
    ];
    for (title, expires_at) in expiring {
        let mut request = reminder_request();
        request.title = title.to_string();
        request.expires_at = expires_at;
        assert!(dispatcher.create_notification(request).is_created());
    }

    assert_eq!(dispatcher.cleanup_expired(), 1);
    assert_eq!(dispatcher.cleanup_expired(), 0);
    let remaining: Vec<_> = store.all().into_iter().map(|n| n.title).collect();
    assert_eq!(remaining.len(), 3);
    assert!(!remaining.contains(&"already expired".to_string()));

    clock.advance(std::time::Duration::from_secs(1));
    assert_eq!(dispatcher.cleanup_expired(), 1);
    assert_eq!(store.len(), 2);
}

#[test]
fn stale_unread_notifications_are_marked_read_after_fifteen_days() {
    let (dispatcher, store, clock) = build_dispatcher();

    let old = dispatcher
        .create_notification(reminder_request())
        .into_notification()
        .expect("created");
    clock.advance(std::time::Duration::from_secs(10 * 24 * 3600));
    let recent = dispatcher
        .create_notification(reminder_request())
        .into_notification()
        .expect("created");
    clock.advance(std::time::Duration::from_secs(6 * 24 * 3600));

    let report = dispatcher.run_maintenance();
    assert_eq!(report.stale_marked_read, 1);
    assert_eq!(report.expired_deleted, 0);

    let unread = store.list_for_user(OWNER, true).expect("listing works");
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].id, recent.id);
    let all = store.list_for_user(OWNER, false).expect("listing works");
    let old_now = all.iter().find(|n| n.id == old.id).expect("old still stored");
    assert!(old_now.read);
    assert!(old_now.read_at.is_some());

    assert_eq!(dispatcher.mark_stale_as_read(), 0);
}

#[test]
fn read_marking_and_preferences_round_trip_through_the_store() {
    let (dispatcher, _store, _clock) = build_dispatcher();
    let first = dispatcher
        .create_notification(reminder_request())
        .into_notification()
        .expect("created");
    dispatcher
        .create_notification(reminder_request())
        .into_notification()
        .expect("created");

    let read = dispatcher.mark_read(&first.id).expect("marked");
    assert!(read.read);
    assert_eq!(dispatcher.mark_all_read(OWNER).expect("marked"), 1);
    assert!(dispatcher
        .list_for_user(OWNER, true)
        .expect("listed")
        .is_empty());

    let missing = crate::notifications::NotificationId::new();
    assert!(matches!(
        dispatcher.mark_read(&missing),
        Err(StoreError::NotFound)
    ));

    let defaults = dispatcher.preferences(OWNER).expect("defaults");
    assert_eq!(defaults, NotificationPreferences::permissive(OWNER));

    let updated = dispatcher
        .update_preferences(
            OWNER,
            &PreferencesUpdate {
                inspection: Some(false),
                ..PreferencesUpdate::default()
            },
        )
        .expect("updated");
    assert!(!updated.inspection);
    assert!(updated.maintenance);
    assert!(!dispatcher
        .notify_inspection_created(OWNER, &inspection_event())
        .is_created());
}

#[test]
fn reminders_for_extreme_due_dates_are_still_created() {
    let (dispatcher, store, _clock) = build_dispatcher();

    let overdue = dispatcher
        .notify_maintenance_reminder(OWNER, &reminder_event(i64::MIN))
        .into_notification()
        .expect("created");
    assert_eq!(overdue.priority, Priority::High);
    assert_eq!(overdue.expires_at, Some(start_time() + Duration::days(1)));

    let distant = dispatcher
        .notify_inspection_reminder(OWNER, &reminder_event(i64::MAX))
        .into_notification()
        .expect("created");
    assert_eq!(distant.priority, Priority::Low);
    assert!(distant.expires_at.is_none());
    assert_eq!(store.len(), 2);
}
