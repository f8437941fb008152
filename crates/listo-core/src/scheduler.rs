//! Local reminder scheduler boundary.
//!
//! The host platform owns actual notification delivery. The core treats the
//! returned identifier as a capability: it is the only handle that can cancel
//! or correlate a scheduled reminder, and it is never regenerated or guessed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CoreError;

/// Content and trigger instant for a one-shot reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRequest {
    pub title: String,
    pub body: String,
    pub trigger_at: DateTime<Utc>,
}

/// Event delivered when a scheduled reminder fires and the user interacts
/// with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderResponse {
    pub identifier: String,
    pub delivered_at: DateTime<Utc>,
    pub user_tapped_at: Option<DateTime<Utc>>,
}

/// One-shot reminder scheduling, provided by the host platform.
///
/// `schedule` may fail (offline scheduler, OS denial); callers treat that as
/// non-fatal. `cancel` is idempotent: cancelling an already-fired or unknown
/// identifier is not an error.
#[async_trait]
pub trait ReminderScheduler: Send + Sync {
    async fn schedule(&self, request: ReminderRequest) -> Result<String, CoreError>;
    async fn cancel(&self, identifier: &str) -> Result<(), CoreError>;
}
