//! # Listo Core Library
//!
//! The state-synchronization and recurring-reminder core of the Listo
//! checklist app. Everything here is local to the device: lists and tasks
//! live in an in-memory store that persists itself to host-provided
//! key/value storage, and reminders are one-shot notifications scheduled
//! through a host-provided scheduler.
//!
//! ## Features
//!
//! - **Authoritative state store**: single in-memory snapshot with
//!   synchronous change subscriptions and serialized fire-and-forget
//!   persistence
//! - **Reminder coordination**: due-date reminders scheduled and cancelled in
//!   lock-step with task mutations; scheduler failures are never fatal
//! - **Recurring reminders**: typed recurrence rules evaluated through
//!   RFC 5545, with at-most-once rescheduling per fired notification
//! - **Race-safe list creation**: a list composed together with its first
//!   task is never lost and never attached to two keys
//!
//! ## Core Modules
//!
//! - [`models`]: lists, tasks, recurrence rules, and the persisted snapshot
//! - [`store`]: the application state store
//! - [`recurrence`]: pure occurrence calculation
//! - [`tasks`]: task lifecycle manager and the reminder firing protocol
//! - [`lists`]: list lifecycle manager and the create-with-first-task draft
//! - [`storage`] / [`scheduler`]: host platform boundary traits
//! - [`error`]: error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use listo_core::{
//!     models::NewTaskData,
//!     scheduler::ReminderScheduler,
//!     storage::{KeyValueStore, MemoryStore},
//!     store::StateStore,
//!     tasks::TaskManager,
//!     lists::ListManager,
//! };
//! use std::sync::Arc;
//!
//! # async fn run(scheduler: Arc<dyn ReminderScheduler>) {
//! let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
//! let store = StateStore::load(storage, "listo.state").await;
//!
//! let lists = ListManager::new(store.clone(), scheduler.clone());
//! let tasks = TaskManager::new(store.clone(), scheduler);
//!
//! if let Some(key) = lists.create_list("Groceries") {
//!     let _ = tasks
//!         .add_task(NewTaskData {
//!             title: "Buy milk".to_string(),
//!             list_key: key,
//!             ..Default::default()
//!         })
//!         .await;
//! }
//! # }
//! ```

pub mod error;
pub mod lists;
pub mod models;
pub mod recurrence;
pub mod scheduler;
pub mod storage;
pub mod store;
pub mod tasks;
pub mod wait;
