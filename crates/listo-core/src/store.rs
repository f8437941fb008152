//! Application state store.
//!
//! Single authoritative in-memory snapshot of lists and tasks, with a
//! synchronous change-subscription mechanism and a fire-and-forget
//! persistence side effect. The in-memory copy stays authoritative for the
//! session; a failed write only matters if the process dies before the next
//! successful one.
//!
//! Writes are funneled through one writer task per store which always drains
//! to the newest pending snapshot, so an older in-flight write can never
//! stomp a newer one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::models::{AppState, List, Task};
use crate::storage::KeyValueStore;

pub type SubscriptionId = u64;

type Subscriber = Box<dyn Fn(&AppState) + Send + Sync>;

pub struct StateStore {
    state: Mutex<AppState>,
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: AtomicU64,
    persist_tx: mpsc::UnboundedSender<String>,
}

impl StateStore {
    /// Reads the persisted blob from `storage` under `storage_key` and builds
    /// the store. Absent or malformed blobs fall back to an empty state;
    /// malformed individual entries are filtered rather than rejecting the
    /// whole load.
    pub async fn load(storage: Arc<dyn KeyValueStore>, storage_key: impl Into<String>) -> Arc<Self> {
        let storage_key = storage_key.into();
        let state = match storage.get(&storage_key).await {
            Ok(Some(raw)) => decode_state(&raw),
            Ok(None) => AppState::default(),
            Err(e) => {
                warn!(error = %e, "failed to read persisted state, starting empty");
                AppState::default()
            }
        };

        let (persist_tx, persist_rx) = mpsc::unbounded_channel();
        tokio::spawn(persist_loop(storage, storage_key, persist_rx));

        Arc::new(Self {
            state: Mutex::new(state),
            subscribers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
            persist_tx,
        })
    }

    /// Current snapshot of the full state.
    pub fn snapshot(&self) -> AppState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn contains_list(&self, key: &str) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .list(key)
            .is_some()
    }

    /// Applies one mutation, then notifies subscribers synchronously and
    /// enqueues the new snapshot for persistence.
    pub fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut AppState),
    {
        let snapshot = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            mutate(&mut state);
            state.clone()
        };
        self.notify(&snapshot);
        self.enqueue_persist(&snapshot);
    }

    pub fn set_lists(&self, lists: Vec<List>) {
        self.update(|state| state.lists = lists);
    }

    pub fn set_tasks_map(&self, tasks_map: HashMap<String, Vec<Task>>) {
        self.update(|state| state.tasks_map = tasks_map);
    }

    /// Registers an observer called synchronously after every mutation.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&AppState) + Send + Sync + 'static,
    {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|(sub_id, _)| *sub_id != id);
    }

    fn notify(&self, state: &AppState) {
        let subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        for (_, observer) in subscribers.iter() {
            observer(state);
        }
    }

    fn enqueue_persist(&self, state: &AppState) {
        match serde_json::to_string(state) {
            // Send only fails once the writer task is gone (runtime shutdown).
            Ok(blob) => {
                let _ = self.persist_tx.send(blob);
            }
            Err(e) => warn!(error = %e, "failed to serialize state for persistence"),
        }
    }
}

/// Writer task: drains to the newest pending snapshot before each write, so
/// writes for this key are serialized and last-write-wins.
async fn persist_loop(
    storage: Arc<dyn KeyValueStore>,
    storage_key: String,
    mut rx: mpsc::UnboundedReceiver<String>,
) {
    while let Some(mut blob) = rx.recv().await {
        while let Ok(newer) = rx.try_recv() {
            blob = newer;
        }
        if let Err(e) = storage.set(&storage_key, blob).await {
            warn!(error = %e, key = %storage_key, "persist failed, in-memory state remains authoritative");
        }
    }
}

/// Lenient decode of the persisted blob. List entries that are not objects or
/// lack a string `key` are dropped, as are tasks that fail to deserialize.
fn decode_state(raw: &str) -> AppState {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "persisted state is not valid JSON, starting empty");
            return AppState::default();
        }
    };

    let mut state = AppState::default();

    if let Some(mode) = value.get("mode").and_then(|v| v.as_str()) {
        state.mode = mode.to_string();
    }
    if let Some(lang) = value.get("lang").and_then(|v| v.as_str()) {
        state.lang = lang.to_string();
    }

    if let Some(items) = value.get("lists").and_then(|v| v.as_array()) {
        for item in items {
            if !item.get("key").map_or(false, serde_json::Value::is_string) {
                debug!("dropping malformed list entry from persisted state");
                continue;
            }
            match serde_json::from_value::<List>(item.clone()) {
                Ok(list) => state.lists.push(list),
                Err(e) => debug!(error = %e, "dropping undecodable list entry"),
            }
        }
    }

    if let Some(map) = value.get("tasksMap").and_then(|v| v.as_object()) {
        for (key, entry) in map {
            let Some(items) = entry.as_array() else {
                debug!(list = %key, "dropping malformed task collection");
                continue;
            };
            let tasks: Vec<Task> = items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect();
            state.tasks_map.insert(key.clone(), tasks);
        }
    }

    state
}
