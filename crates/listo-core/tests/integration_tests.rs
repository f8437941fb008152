mod helpers;

use chrono::{DateTime, Duration as ChronoDuration, Timelike, Utc};
use std::sync::Arc;
use std::time::Duration;

use helpers::{response_for, setup, SchedulerOp};
use listo_core::error::CoreError;
use listo_core::models::{Frequency, NewTaskData, RecurrenceRule};
use listo_core::storage::KeyValueStore;
use listo_core::store::StateStore;

/// A future instant at whole-second precision, the granularity recurrence
/// occurrences are computed at.
fn future(hours: i64) -> DateTime<Utc> {
    (Utc::now() + ChronoDuration::hours(hours))
        .with_nanosecond(0)
        .unwrap()
}

fn new_task(title: &str, list_key: &str) -> NewTaskData {
    NewTaskData {
        title: title.to_string(),
        list_key: list_key.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn add_and_complete_basic_task() {
    let env = setup().await;
    let key = env.lists.create_list("Errands").expect("list created");

    let task = env
        .tasks
        .add_task(new_task("Buy milk", &key))
        .await
        .expect("task created");
    assert!(!task.done);
    assert_eq!(task.notification_id, None);
    assert_eq!(task.due_date, None);

    assert!(env.tasks.toggle_done(&key, &task.id).await);
    let state = env.store.snapshot();
    assert!(state.task(&key, &task.id).unwrap().done);
    assert_eq!(state.list(&key).unwrap().count, Some(1));
}

#[tokio::test]
async fn future_due_date_gets_a_reminder() {
    let env = setup().await;
    let key = env.lists.create_list("Family").expect("list created");
    let due = Utc::now() + ChronoDuration::hours(3);

    let mut data = new_task("Call mom", &key);
    data.due_date = Some(due);
    let task = env.tasks.add_task(data).await.expect("task created");

    assert_eq!(task.due_date, Some(due));
    assert_eq!(task.notification_id.as_deref(), Some("notif-1"));
    assert_eq!(
        env.scheduler.ops(),
        vec![SchedulerOp::Schedule {
            identifier: "notif-1".to_string(),
            trigger_at: due,
        }]
    );
}

#[tokio::test]
async fn past_due_date_schedules_nothing() {
    let env = setup().await;
    let key = env.lists.create_list("Errands").expect("list created");

    let mut data = new_task("Missed it", &key);
    data.due_date = Some(Utc::now() - ChronoDuration::hours(1));
    let task = env.tasks.add_task(data).await.expect("task created");

    assert!(task.due_date.is_some());
    assert_eq!(task.notification_id, None);
    assert_eq!(env.scheduler.schedule_count(), 0);
}

#[tokio::test]
async fn empty_title_is_a_silent_noop() {
    let env = setup().await;
    let key = env.lists.create_list("Errands").expect("list created");

    assert!(env.tasks.add_task(new_task("   ", &key)).await.is_none());
    assert!(env.store.snapshot().tasks(&key).is_empty());
    assert!(env.scheduler.ops().is_empty());
}

#[tokio::test]
async fn unknown_list_key_is_a_silent_noop() {
    let env = setup().await;
    env.lists.create_list("Errands").expect("list created");

    // A stale or fabricated key must neither create an orphan task
    // collection nor schedule a reminder.
    let mut data = new_task("Orphan", "no-such-list");
    data.due_date = Some(future(1));
    assert!(env.tasks.add_task(data).await.is_none());

    let state = env.store.snapshot();
    assert!(!state.tasks_map.contains_key("no-such-list"));
    assert!(env.scheduler.ops().is_empty());
}

#[tokio::test]
async fn scheduler_failure_still_creates_the_task() {
    let env = setup().await;
    let key = env.lists.create_list("Errands").expect("list created");
    env.scheduler.fail_schedule(true);

    let mut data = new_task("Water plants", &key);
    data.due_date = Some(Utc::now() + ChronoDuration::hours(1));
    let task = env.tasks.add_task(data).await.expect("task created");

    assert!(task.due_date.is_some());
    assert_eq!(task.notification_id, None);
    assert_eq!(env.store.snapshot().tasks(&key).len(), 1);
}

#[tokio::test]
async fn completing_cancels_and_uncompleting_does_not_restore() {
    let env = setup().await;
    let key = env.lists.create_list("Errands").expect("list created");

    let mut data = new_task("Dentist", &key);
    data.due_date = Some(Utc::now() + ChronoDuration::days(1));
    let task = env.tasks.add_task(data).await.expect("task created");

    assert!(env.tasks.toggle_done(&key, &task.id).await);
    assert_eq!(env.scheduler.cancel_count(), 1);
    let state = env.store.snapshot();
    let toggled = state.task(&key, &task.id).unwrap();
    assert!(toggled.done);
    assert_eq!(toggled.notification_id, None);

    // Toggling back does not bring the reminder back.
    assert!(env.tasks.toggle_done(&key, &task.id).await);
    assert_eq!(env.scheduler.schedule_count(), 1);
    let state = env.store.snapshot();
    let toggled = state.task(&key, &task.id).unwrap();
    assert!(!toggled.done);
    assert_eq!(toggled.notification_id, None);
}

#[tokio::test]
async fn delete_task_cancels_pending_reminder() {
    let env = setup().await;
    let key = env.lists.create_list("Errands").expect("list created");

    let mut data = new_task("Return parcel", &key);
    data.due_date = Some(Utc::now() + ChronoDuration::hours(2));
    let task = env.tasks.add_task(data).await.expect("task created");

    assert!(env.tasks.delete_task(&key, &task.id).await);
    assert_eq!(
        env.scheduler.ops().last(),
        Some(&SchedulerOp::Cancel {
            identifier: "notif-1".to_string()
        })
    );
    let state = env.store.snapshot();
    assert!(state.tasks(&key).is_empty());
    assert_eq!(state.list(&key).unwrap().count, Some(0));
}

#[tokio::test]
async fn reschedule_cancels_old_before_scheduling_new() {
    let env = setup().await;
    let key = env.lists.create_list("Errands").expect("list created");

    let mut data = new_task("Pay rent", &key);
    data.due_date = Some(Utc::now() + ChronoDuration::days(1));
    let task = env.tasks.add_task(data).await.expect("task created");

    let new_due = Utc::now() + ChronoDuration::days(3);
    assert!(env.tasks.reschedule_due_date(&key, &task.id, new_due).await);

    let cancel_old = env
        .scheduler
        .position_of(&SchedulerOp::Cancel {
            identifier: "notif-1".to_string(),
        })
        .expect("old reminder cancelled");
    let schedule_new = env
        .scheduler
        .position_of(&SchedulerOp::Schedule {
            identifier: "notif-2".to_string(),
            trigger_at: new_due,
        })
        .expect("new reminder scheduled");
    assert!(cancel_old < schedule_new);

    let state = env.store.snapshot();
    let rescheduled = state.task(&key, &task.id).unwrap();
    assert_eq!(rescheduled.due_date, Some(new_due));
    assert_eq!(rescheduled.notification_id.as_deref(), Some("notif-2"));
}

#[tokio::test]
async fn fired_recurring_reminder_schedules_next_occurrence() {
    let env = setup().await;
    let key = env.lists.create_list("Chores").expect("list created");
    let due = future(1);

    let mut data = new_task("Take out bins", &key);
    data.due_date = Some(due);
    data.recurrence = Some(RecurrenceRule::every(Frequency::Weekly));
    let task = env.tasks.add_task(data).await.expect("task created");
    assert_eq!(task.notification_id.as_deref(), Some("notif-1"));

    env.tasks.handle_response(response_for("notif-1")).await;

    let state = env.store.snapshot();
    let rescheduled = state.task(&key, &task.id).unwrap();
    assert_eq!(rescheduled.due_date, Some(due + ChronoDuration::days(7)));
    assert_eq!(rescheduled.notification_id.as_deref(), Some("notif-2"));
    // The original identifier is gone for good, never reissued.
    assert_eq!(env.scheduler.schedule_count(), 2);
}

#[tokio::test]
async fn duplicate_response_delivery_reschedules_once() {
    let env = setup().await;
    let key = env.lists.create_list("Chores").expect("list created");
    let due = future(1);

    let mut data = new_task("Vacuum", &key);
    data.due_date = Some(due);
    data.recurrence = Some(RecurrenceRule::every(Frequency::Daily));
    env.tasks.add_task(data).await.expect("task created");

    env.tasks.handle_response(response_for("notif-1")).await;
    env.tasks.handle_response(response_for("notif-1")).await;

    assert_eq!(env.scheduler.schedule_count(), 2);
    let state = env.store.snapshot();
    let task = &state.tasks(&key)[0];
    assert_eq!(task.due_date, Some(due + ChronoDuration::days(1)));
    assert_eq!(task.notification_id.as_deref(), Some("notif-2"));
}

#[tokio::test]
async fn one_shot_reminder_response_does_not_reschedule() {
    let env = setup().await;
    let key = env.lists.create_list("Errands").expect("list created");

    let mut data = new_task("Pick up keys", &key);
    data.due_date = Some(Utc::now() + ChronoDuration::hours(1));
    env.tasks.add_task(data).await.expect("task created");

    env.tasks.handle_response(response_for("notif-1")).await;
    assert_eq!(env.scheduler.schedule_count(), 1);
}

#[tokio::test]
async fn unknown_response_is_deferred_then_resolved_once() {
    let env = setup().await;
    let key = env.lists.create_list("Chores").expect("list created");
    let due = future(1);

    // Response arrives before the task state carrying its identifier exists,
    // as when the platform replays a response at startup.
    env.tasks.handle_response(response_for("notif-99")).await;
    assert_eq!(env.scheduler.schedule_count(), 0);

    env.store.update(|state| {
        let mut task = listo_core::models::Task::new("Laundry");
        task.due_date = Some(due);
        task.notification_id = Some("notif-99".to_string());
        task.recurrence = Some(RecurrenceRule::every(Frequency::Weekly));
        state.tasks_map.get_mut(&key).unwrap().push(task);
        state.refresh_count(&key);
    });

    env.tasks.flush_deferred().await;
    assert_eq!(env.scheduler.schedule_count(), 1);
    let state = env.store.snapshot();
    assert_eq!(
        state.tasks(&key)[0].due_date,
        Some(due + ChronoDuration::days(7))
    );

    // A second flush has nothing left to do.
    env.tasks.flush_deferred().await;
    assert_eq!(env.scheduler.schedule_count(), 1);
}

#[tokio::test]
async fn deleting_a_list_cancels_every_pending_reminder() {
    let env = setup().await;
    let key = env.lists.create_list("Trip prep").expect("list created");

    for i in 0..3 {
        let mut data = new_task(&format!("Item {}", i), &key);
        data.due_date = Some(Utc::now() + ChronoDuration::hours(i + 1));
        env.tasks.add_task(data).await.expect("task created");
    }
    // One task without a reminder must not produce a cancel.
    env.tasks
        .add_task(new_task("No reminder", &key))
        .await
        .expect("task created");

    assert!(env.lists.delete_list(&key).await);
    assert_eq!(env.scheduler.cancel_count(), 3);

    let state = env.store.snapshot();
    assert!(state.list(&key).is_none());
    assert!(!state.tasks_map.contains_key(&key));
}

#[tokio::test]
async fn builtin_lists_resist_rename_and_delete() {
    let env = setup().await;
    let key = env.lists.create_list("Inbox").expect("list created");
    let lists = listo_core::lists::ListManager::new(env.store.clone(), env.scheduler.clone())
        .with_builtin_keys([key.clone()]);

    assert!(!lists.rename_list(&key, "Renamed"));
    assert!(!lists.delete_list(&key).await);
    assert!(!lists.rename_list("missing", "Whatever"));

    let state = env.store.snapshot();
    assert_eq!(state.list(&key).unwrap().label, "Inbox");
}

#[tokio::test]
async fn rename_with_empty_label_is_a_noop() {
    let env = setup().await;
    let key = env.lists.create_list("Groceries").expect("list created");

    assert!(!env.lists.rename_list(&key, "  "));
    assert_eq!(env.store.snapshot().list(&key).unwrap().label, "Groceries");

    assert!(env.lists.rename_list(&key, "Weekly groceries"));
    assert_eq!(
        env.store.snapshot().list(&key).unwrap().label,
        "Weekly groceries"
    );
}

#[tokio::test]
async fn create_then_add_race_attaches_exactly_once() {
    let env = setup().await;
    let draft = Arc::new(env.lists.begin_draft());
    let tasks = Arc::new(env.tasks);

    // The task add is issued before the list title is committed.
    let adder = {
        let draft = draft.clone();
        let tasks = tasks.clone();
        tokio::spawn(async move {
            let key = draft.await_key().await.expect("list became visible");
            tasks
                .add_task(NewTaskData {
                    title: "First task".to_string(),
                    list_key: key.clone(),
                    ..Default::default()
                })
                .await
                .expect("task created");
            key
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    let committed = draft.set_title("Weekend plans").expect("key assigned");
    let attached = adder.await.expect("adder finished");
    assert_eq!(attached, committed);

    let state = env.store.snapshot();
    assert_eq!(state.lists.len(), 1);
    assert_eq!(state.tasks(&committed).len(), 1);
    assert_eq!(state.tasks(&committed)[0].title, "First task");
    assert_eq!(state.list(&committed).unwrap().count, Some(1));
}

#[tokio::test]
async fn draft_retitle_before_commit_keeps_one_key() {
    let env = setup().await;
    let draft = env.lists.begin_draft();

    assert_eq!(draft.set_title(""), None);
    let key = draft.set_title("Packing").expect("key assigned");
    assert_eq!(draft.set_title("Packing list"), Some(key.clone()));

    let state = env.store.snapshot();
    assert_eq!(state.lists.len(), 1);
    assert_eq!(state.list(&key).unwrap().label, "Packing list");
}

#[tokio::test(start_paused = true)]
async fn draft_wait_times_out_when_list_never_commits() {
    let env = setup().await;
    let draft = env.lists.begin_draft();

    let result = draft.await_key().await;
    assert!(matches!(result, Err(CoreError::WaitTimeout(_))));
    assert!(env.store.snapshot().lists.is_empty());
}

#[tokio::test]
async fn state_survives_a_reload_from_storage() {
    let env = setup().await;
    let key = env.lists.create_list("Plants").expect("list created");

    let mut data = new_task("Water ferns", &key);
    data.due_date = Some(Utc::now() + ChronoDuration::days(2));
    data.recurrence = Some(RecurrenceRule::every(Frequency::Weekly).on_weekdays([2, 5]));
    env.tasks.add_task(data).await.expect("task created");
    env.store.update(|state| {
        state.mode = "dark".to_string();
        state.lang = "fr".to_string();
    });

    // Wait for the fire-and-forget writer to land the final snapshot.
    let mut persisted = false;
    for _ in 0..200 {
        if let Ok(Some(raw)) = env.storage.get(helpers::STORAGE_KEY).await {
            if raw.contains("dark") && raw.contains("Water ferns") {
                persisted = true;
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(persisted);

    let reloaded = StateStore::load(
        env.storage.clone() as Arc<dyn KeyValueStore>,
        helpers::STORAGE_KEY,
    )
    .await;
    assert_eq!(reloaded.snapshot(), env.store.snapshot());
}
