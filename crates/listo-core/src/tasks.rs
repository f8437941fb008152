//! Task lifecycle manager.
//!
//! Orchestrates task mutations against the state store and keeps reminder
//! scheduling in step with them. Failures from the scheduler are caught here
//! and never propagate: a task is always created or updated even when its
//! reminder could not be scheduled.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::models::{NewTaskData, Task};
use crate::recurrence;
use crate::scheduler::{ReminderRequest, ReminderResponse, ReminderScheduler};
use crate::store::StateStore;

pub struct TaskManager {
    store: Arc<StateStore>,
    scheduler: Arc<dyn ReminderScheduler>,
    /// Identifiers of reminder responses already processed. Guarantees
    /// at-most-once rescheduling even when the platform delivers the same
    /// response event more than once.
    handled: Mutex<HashSet<String>>,
    /// Responses whose identifier matched no known task, kept for one retry
    /// after the task collections finish loading.
    deferred: Mutex<Vec<ReminderResponse>>,
}

impl TaskManager {
    pub fn new(store: Arc<StateStore>, scheduler: Arc<dyn ReminderScheduler>) -> Self {
        Self {
            store,
            scheduler,
            handled: Mutex::new(HashSet::new()),
            deferred: Mutex::new(Vec::new()),
        }
    }

    /// Creates a task in the given list. Titles that trim to empty and keys
    /// that match no list are silent no-ops. A reminder is scheduled only for
    /// due dates strictly in the future; if scheduling fails the task is
    /// still created without one.
    pub async fn add_task(&self, data: NewTaskData) -> Option<Task> {
        let title = data.title.trim();
        if title.is_empty() {
            debug!("ignoring task with empty title");
            return None;
        }
        if !self.store.contains_list(&data.list_key) {
            debug!(list = %data.list_key, "ignoring task for unknown list");
            return None;
        }

        let mut notification_id = None;
        if let Some(due) = data.due_date {
            if due > Utc::now() {
                match self.scheduler.schedule(reminder_for(title, due)).await {
                    Ok(id) => notification_id = Some(id),
                    Err(e) => {
                        warn!(error = %e, title, "reminder scheduling failed, creating task without one")
                    }
                }
            }
        }

        let mut task = Task::new(title);
        task.due_date = data.due_date;
        task.notification_id = notification_id;
        task.recurrence = data.recurrence;

        let created = task.clone();
        let list_key = data.list_key;
        self.store.update(|state| {
            state.tasks_map.entry(list_key.clone()).or_default().push(task);
            state.refresh_count(&list_key);
        });
        Some(created)
    }

    /// Flips a task's completion state. Completing a task cancels its pending
    /// reminder; un-completing does not restore it (only explicit due-date
    /// edits create new reminders).
    pub async fn toggle_done(&self, list_key: &str, task_id: &str) -> bool {
        let snapshot = self.store.snapshot();
        let Some(task) = snapshot.task(list_key, task_id) else {
            return false;
        };

        let completing = !task.done;
        if completing {
            if let Some(identifier) = &task.notification_id {
                self.cancel_quietly(identifier).await;
            }
        }

        self.store.update(|state| {
            if let Some(task) = state.task_mut(list_key, task_id) {
                task.done = completing;
                if completing {
                    task.notification_id = None;
                }
            }
        });
        true
    }

    /// Removes a task, cancelling its pending reminder first.
    pub async fn delete_task(&self, list_key: &str, task_id: &str) -> bool {
        let snapshot = self.store.snapshot();
        let Some(task) = snapshot.task(list_key, task_id) else {
            return false;
        };

        if let Some(identifier) = &task.notification_id {
            self.cancel_quietly(identifier).await;
        }

        self.store.update(|state| {
            if let Some(tasks) = state.tasks_map.get_mut(list_key) {
                tasks.retain(|t| t.id != task_id);
            }
            state.refresh_count(list_key);
        });
        true
    }

    /// Moves a task's due date. The old reminder is cancelled strictly before
    /// the new one is scheduled, and `due_date`/`notification_id` are
    /// replaced in a single store mutation so they are never observed
    /// inconsistent.
    pub async fn reschedule_due_date(
        &self,
        list_key: &str,
        task_id: &str,
        new_date: DateTime<Utc>,
    ) -> bool {
        let snapshot = self.store.snapshot();
        let Some(task) = snapshot.task(list_key, task_id) else {
            return false;
        };

        if let Some(identifier) = &task.notification_id {
            self.cancel_quietly(identifier).await;
        }

        let notification_id = match self.scheduler.schedule(reminder_for(&task.title, new_date)).await
        {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, task = %task.id, "reminder scheduling failed on reschedule");
                None
            }
        };

        self.store.update(|state| {
            if let Some(task) = state.task_mut(list_key, task_id) {
                task.due_date = Some(new_date);
                task.notification_id = notification_id;
            }
        });
        true
    }

    /// Entry point for the platform's fired-reminder response plumbing.
    ///
    /// Duplicate deliveries of the same identifier are ignored. A response
    /// that matches no known task (deleted, or state not yet loaded) is kept
    /// for exactly one retry via [`flush_deferred`](Self::flush_deferred).
    pub async fn handle_response(&self, response: ReminderResponse) {
        if !self.mark_handled(&response.identifier) {
            debug!(identifier = %response.identifier, "duplicate reminder response ignored");
            return;
        }
        if !self.process_response(&response).await {
            debug!(identifier = %response.identifier, "deferring reminder response, no matching task yet");
            self.deferred
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(response);
        }
    }

    /// Retries deferred responses once the task collections are loaded.
    /// Responses that still match nothing are dropped.
    pub async fn flush_deferred(&self) {
        let pending: Vec<ReminderResponse> = {
            let mut deferred = self.deferred.lock().unwrap_or_else(|e| e.into_inner());
            deferred.drain(..).collect()
        };
        for response in pending {
            if !self.process_response(&response).await {
                debug!(identifier = %response.identifier, "dropping reminder response with no matching task");
            }
        }
    }

    fn mark_handled(&self, identifier: &str) -> bool {
        self.handled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(identifier.to_string())
    }

    /// Resolves a fired reminder to its task and reschedules the next
    /// occurrence for recurring tasks. Returns false when no task currently
    /// holds the identifier.
    async fn process_response(&self, response: &ReminderResponse) -> bool {
        let snapshot = self.store.snapshot();
        let Some((list_key, task)) = snapshot.task_by_notification(&response.identifier) else {
            return false;
        };
        let list_key = list_key.to_string();
        let task = task.clone();

        let (Some(rule), Some(due)) = (task.recurrence.clone(), task.due_date) else {
            debug!(task = %task.id, "one-shot reminder fired, nothing to reschedule");
            return true;
        };

        let next = match recurrence::occurrence_after(due, &rule) {
            Ok(Some(next)) => next,
            Ok(None) => {
                debug!(task = %task.id, "recurrence exhausted, no further reminders");
                return true;
            }
            Err(e) => {
                warn!(error = %e, task = %task.id, "cannot evaluate recurrence rule");
                return true;
            }
        };

        let notification_id = match self.scheduler.schedule(reminder_for(&task.title, next)).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, task = %task.id, "could not schedule next occurrence");
                None
            }
        };

        self.store.update(|state| {
            if let Some(task) = state.task_mut(&list_key, &task.id) {
                task.due_date = Some(next);
                task.notification_id = notification_id;
            }
        });
        true
    }

    async fn cancel_quietly(&self, identifier: &str) {
        if let Err(e) = self.scheduler.cancel(identifier).await {
            warn!(error = %e, identifier, "reminder cancellation failed");
        }
    }
}

fn reminder_for(title: &str, at: DateTime<Utc>) -> ReminderRequest {
    ReminderRequest {
        title: title.to_string(),
        body: format!("Due {}", at.format("%Y-%m-%d %H:%M")),
        trigger_at: at,
    }
}
