use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Icon assigned to lists created without an explicit icon choice.
pub const DEFAULT_LIST_ICON: &str = "format-list-checkbox";

/// A named, ordered collection of tasks. Identity is `key`, which stays
/// stable for the lifetime of the list and is never reused after deletion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub key: String,
    pub icon: String,
    pub label: String,
    /// Cached length of the list's task collection. Refreshed on every task
    /// mutation; allowed to lag for at most one state-update cycle.
    #[serde(default)]
    pub count: Option<usize>,
}

impl List {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            icon: DEFAULT_LIST_ICON.to_string(),
            label: label.into(),
            count: Some(0),
        }
    }
}

/// A single checklist item. Owned by exactly one list (by key).
///
/// `notification_id` is the opaque capability handle into the reminder
/// scheduler; it is only ever `Some` while `due_date` is `Some`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub done: bool,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notification_id: Option<String>,
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            title: title.into(),
            done: false,
            due_date: None,
            notification_id: None,
            recurrence: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid frequency: {0}")]
pub struct ParseFrequencyError(String);

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            _ => Err(ParseFrequencyError(s.to_string())),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Frequency::Daily => write!(f, "daily"),
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Yearly => write!(f, "yearly"),
        }
    }
}

/// Recurrence specification attached to a task. Immutable value; replaced
/// wholesale on edit, never partially mutated.
///
/// Weekdays are numbered 0=Sunday through 6=Saturday, matching the persisted
/// layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekdays: Option<BTreeSet<u8>>,
}

impl RecurrenceRule {
    pub fn every(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            weekdays: None,
        }
    }

    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn on_weekdays(mut self, weekdays: impl IntoIterator<Item = u8>) -> Self {
        self.weekdays = Some(weekdays.into_iter().collect());
        self
    }
}

/// Data required to create a new task.
#[derive(Debug, Clone, Default)]
pub struct NewTaskData {
    pub title: String,
    pub due_date: Option<DateTime<Utc>>,
    pub list_key: String,
    pub recurrence: Option<RecurrenceRule>,
}

/// The authoritative in-memory snapshot, and exactly the subset persisted to
/// durable storage. `mode` and `lang` are opaque presentation settings
/// carried through for the UI layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub lists: Vec<List>,
    pub tasks_map: HashMap<String, Vec<Task>>,
    pub mode: String,
    pub lang: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            lists: Vec::new(),
            tasks_map: HashMap::new(),
            mode: "light".to_string(),
            lang: "en".to_string(),
        }
    }
}

impl AppState {
    pub fn list(&self, key: &str) -> Option<&List> {
        self.lists.iter().find(|l| l.key == key)
    }

    pub fn list_mut(&mut self, key: &str) -> Option<&mut List> {
        self.lists.iter_mut().find(|l| l.key == key)
    }

    pub fn tasks(&self, list_key: &str) -> &[Task] {
        self.tasks_map.get(list_key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn task(&self, list_key: &str, task_id: &str) -> Option<&Task> {
        self.tasks_map
            .get(list_key)?
            .iter()
            .find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, list_key: &str, task_id: &str) -> Option<&mut Task> {
        self.tasks_map
            .get_mut(list_key)?
            .iter_mut()
            .find(|t| t.id == task_id)
    }

    /// Locates the task currently holding the given notification identifier.
    pub fn task_by_notification(&self, identifier: &str) -> Option<(&str, &Task)> {
        self.tasks_map.iter().find_map(|(key, tasks)| {
            tasks
                .iter()
                .find(|t| t.notification_id.as_deref() == Some(identifier))
                .map(|t| (key.as_str(), t))
        })
    }

    /// Re-derives a list's cached count from its task collection.
    pub fn refresh_count(&mut self, list_key: &str) {
        let count = self.tasks_map.get(list_key).map(Vec::len).unwrap_or(0);
        if let Some(list) = self.list_mut(list_key) {
            list.count = Some(count);
        }
    }
}
