use std::sync::Arc;
use std::time::Duration;

use autocare::clock::ManualClock;
use autocare::notifications::{
    DispatchOutcome, InMemoryNotificationStore, NotificationDispatcher, NotificationType,
    PreferencesUpdate, Priority, ReminderEvent, UserId,
};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

fn reminder(days_until_due: i64) -> ReminderEvent {
    ReminderEvent {
        vehicle_id: 3,
        vehicle_label: "Gol KLM2N34".to_string(),
        subject: "Annual inspection".to_string(),
        days_until_due,
    }
}

#[test]
fn reminders_expire_and_go_stale_on_schedule() {
    let store = Arc::new(InMemoryNotificationStore::default());
    let clock = Arc::new(ManualClock::new());
    let dispatcher = NotificationDispatcher::with_clock(store.clone(), clock.clone())
        .with_stale_after_days(15);
    let owner = UserId(8);

    let soon = dispatcher
        .notify_inspection_reminder(owner, &reminder(2))
        .into_notification()
        .expect("created");
    assert_eq!(soon.priority, Priority::High);
    let later = dispatcher
        .notify_inspection_reminder(owner, &reminder(60))
        .into_notification()
        .expect("created");
    assert_eq!(later.priority, Priority::Low);

    clock.advance(4 * DAY);
    let report = dispatcher.run_maintenance();
    assert_eq!(report.expired_deleted, 1);
    assert_eq!(report.stale_marked_read, 0);
    assert_eq!(store.len(), 1);

    clock.advance(12 * DAY);
    let report = dispatcher.run_maintenance();
    assert_eq!(report.expired_deleted, 0);
    assert_eq!(report.stale_marked_read, 1);
    assert!(dispatcher
        .list_for_user(owner, true)
        .expect("listed")
        .is_empty());
}

#[test]
fn opting_out_suppresses_one_category_only() {
    let store = Arc::new(InMemoryNotificationStore::default());
    let dispatcher = NotificationDispatcher::new(store.clone());
    let owner = UserId(8);

    dispatcher
        .update_preferences(
            owner,
            &PreferencesUpdate {
                inspection: Some(false),
                ..PreferencesUpdate::default()
            },
        )
        .expect("preferences saved");

    assert_eq!(
        dispatcher.notify_inspection_reminder(owner, &reminder(5)),
        DispatchOutcome::Suppressed(NotificationType::InspectionReminder)
    );
    assert!(dispatcher
        .notify_maintenance_reminder(owner, &reminder(5))
        .is_created());
    assert!(dispatcher
        .notify_maintenance_reminder(UserId(9), &reminder(5))
        .is_created());
    assert_eq!(store.len(), 2);
}
