#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use listo_core::error::CoreError;
use listo_core::lists::ListManager;
use listo_core::scheduler::{ReminderRequest, ReminderResponse, ReminderScheduler};
use listo_core::storage::{KeyValueStore, MemoryStore};
use listo_core::store::StateStore;
use listo_core::tasks::TaskManager;

pub const STORAGE_KEY: &str = "listo.state";

/// Everything the fake scheduler was asked to do, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerOp {
    Schedule {
        identifier: String,
        trigger_at: DateTime<Utc>,
    },
    Cancel {
        identifier: String,
    },
}

/// Recording scheduler. Identifiers are `notif-1`, `notif-2`, ... and are
/// never reused.
#[derive(Debug, Default)]
pub struct FakeScheduler {
    ops: Mutex<Vec<SchedulerOp>>,
    counter: AtomicUsize,
    fail_schedule: AtomicBool,
}

impl FakeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_schedule(&self, fail: bool) {
        self.fail_schedule.store(fail, Ordering::SeqCst);
    }

    pub fn ops(&self) -> Vec<SchedulerOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn schedule_count(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, SchedulerOp::Schedule { .. }))
            .count()
    }

    pub fn cancel_count(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, SchedulerOp::Cancel { .. }))
            .count()
    }

    /// Index of the first op matching `target`, for ordering assertions.
    pub fn position_of(&self, target: &SchedulerOp) -> Option<usize> {
        self.ops().iter().position(|op| op == target)
    }
}

#[async_trait]
impl ReminderScheduler for FakeScheduler {
    async fn schedule(&self, request: ReminderRequest) -> Result<String, CoreError> {
        if self.fail_schedule.load(Ordering::SeqCst) {
            return Err(CoreError::Scheduler("scheduler offline".to_string()));
        }
        let identifier = format!("notif-{}", self.counter.fetch_add(1, Ordering::SeqCst) + 1);
        self.ops.lock().unwrap().push(SchedulerOp::Schedule {
            identifier: identifier.clone(),
            trigger_at: request.trigger_at,
        });
        Ok(identifier)
    }

    async fn cancel(&self, identifier: &str) -> Result<(), CoreError> {
        self.ops.lock().unwrap().push(SchedulerOp::Cancel {
            identifier: identifier.to_string(),
        });
        Ok(())
    }
}

pub struct TestEnv {
    pub storage: Arc<MemoryStore>,
    pub store: Arc<StateStore>,
    pub scheduler: Arc<FakeScheduler>,
    pub tasks: TaskManager,
    pub lists: ListManager,
}

pub async fn setup() -> TestEnv {
    let storage = Arc::new(MemoryStore::new());
    let store = StateStore::load(storage.clone() as Arc<dyn KeyValueStore>, STORAGE_KEY).await;
    let scheduler = Arc::new(FakeScheduler::new());
    let tasks = TaskManager::new(store.clone(), scheduler.clone());
    let lists = ListManager::new(store.clone(), scheduler.clone());
    TestEnv {
        storage,
        store,
        scheduler,
        tasks,
        lists,
    }
}

pub fn response_for(identifier: &str) -> ReminderResponse {
    ReminderResponse {
        identifier: identifier.to_string(),
        delivered_at: Utc::now(),
        user_tapped_at: Some(Utc::now()),
    }
}
