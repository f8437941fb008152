//! List lifecycle manager.
//!
//! Creation, rename and deletion of lists, plus the create-with-first-task
//! race: a list being composed gets its key pinned and committed the moment
//! its title first becomes non-empty, and early task additions wait (bounded)
//! for that key to be visible in the store before attaching.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::List;
use crate::scheduler::ReminderScheduler;
use crate::store::StateStore;
use crate::wait::await_condition;

/// Poll interval for the create-with-first-task wait.
pub const DRAFT_POLL_INTERVAL: Duration = Duration::from_millis(50);
/// Upper bound on the create-with-first-task wait; past this the task
/// addition is abandoned.
pub const DRAFT_WAIT_TIMEOUT: Duration = Duration::from_secs(2);

pub struct ListManager {
    store: Arc<StateStore>,
    scheduler: Arc<dyn ReminderScheduler>,
    /// Built-in lists can be neither renamed nor deleted.
    builtin_keys: HashSet<String>,
}

impl ListManager {
    pub fn new(store: Arc<StateStore>, scheduler: Arc<dyn ReminderScheduler>) -> Self {
        Self {
            store,
            scheduler,
            builtin_keys: HashSet::new(),
        }
    }

    pub fn with_builtin_keys(mut self, keys: impl IntoIterator<Item = String>) -> Self {
        self.builtin_keys = keys.into_iter().collect();
        self
    }

    pub fn is_builtin(&self, key: &str) -> bool {
        self.builtin_keys.contains(key)
    }

    /// Creates a list with a fresh process-unique key. Labels that trim to
    /// empty are a silent no-op.
    pub fn create_list(&self, label: &str) -> Option<String> {
        let label = label.trim();
        if label.is_empty() {
            debug!("ignoring list with empty label");
            return None;
        }

        let key = Uuid::now_v7().to_string();
        let list = List::new(key.clone(), label);
        self.store.update(|state| {
            state.tasks_map.entry(list.key.clone()).or_default();
            state.lists.push(list);
        });
        Some(key)
    }

    /// Relabels a list. No-op for empty labels, built-in lists, and unknown
    /// keys.
    pub fn rename_list(&self, key: &str, new_label: &str) -> bool {
        let new_label = new_label.trim();
        if new_label.is_empty() || self.is_builtin(key) || !self.store.contains_list(key) {
            return false;
        }

        self.store.update(|state| {
            if let Some(list) = state.list_mut(key) {
                list.label = new_label.to_string();
            }
        });
        true
    }

    /// Deletes a list. Every pending reminder held by its tasks is cancelled
    /// before the list disappears from the store.
    pub async fn delete_list(&self, key: &str) -> bool {
        if self.is_builtin(key) {
            return false;
        }
        let snapshot = self.store.snapshot();
        if snapshot.list(key).is_none() {
            return false;
        }

        for task in snapshot.tasks(key) {
            if let Some(identifier) = &task.notification_id {
                if let Err(e) = self.scheduler.cancel(identifier).await {
                    warn!(error = %e, identifier, "reminder cancellation failed during list delete");
                }
            }
        }

        self.store.update(|state| {
            state.lists.retain(|l| l.key != key);
            state.tasks_map.remove(key);
        });
        true
    }

    /// Starts composing a new list whose title is still being typed.
    pub fn begin_draft(&self) -> ListDraft {
        ListDraft::new(self.store.clone())
    }
}

/// A list under composition. The key is assigned and the list committed to
/// the store on the first non-empty title; task additions racing that commit
/// use [`await_key`](Self::await_key) to block until the key is observably
/// present.
pub struct ListDraft {
    store: Arc<StateStore>,
    key: Mutex<Option<String>>,
}

impl ListDraft {
    fn new(store: Arc<StateStore>) -> Self {
        Self {
            store,
            key: Mutex::new(None),
        }
    }

    /// Applies the title as currently typed. The first non-empty title
    /// synchronously assigns the key and commits the list; later titles
    /// relabel it. Empty titles before the commit leave the draft unkeyed.
    pub fn set_title(&self, title: &str) -> Option<String> {
        let title = title.trim();
        if title.is_empty() {
            return self.key();
        }

        let mut slot = self.key.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(key) = slot.clone() {
            drop(slot);
            self.store.update(|state| {
                if let Some(list) = state.list_mut(&key) {
                    list.label = title.to_string();
                }
            });
            return Some(key);
        }

        let key = Uuid::now_v7().to_string();
        *slot = Some(key.clone());
        drop(slot);

        let list = List::new(key.clone(), title);
        self.store.update(|state| {
            state.tasks_map.entry(list.key.clone()).or_default();
            state.lists.push(list);
        });
        Some(key)
    }

    pub fn key(&self) -> Option<String> {
        self.key.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Bounded wait until the draft's list key exists and is visible in the
    /// store. Task additions issued before the commit call this first; on
    /// timeout the addition is abandoned (logged, not surfaced).
    pub async fn await_key(&self) -> Result<String, CoreError> {
        let visible = await_condition(
            || match self.key() {
                Some(key) => self.store.contains_list(&key),
                None => false,
            },
            DRAFT_POLL_INTERVAL,
            DRAFT_WAIT_TIMEOUT,
        )
        .await;

        if !visible {
            warn!("abandoning task attach: draft list never became visible in the store");
            return Err(CoreError::WaitTimeout("draft list key".to_string()));
        }
        self.key()
            .ok_or_else(|| CoreError::WaitTimeout("draft list key".to_string()))
    }
}
