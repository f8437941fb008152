use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use listo_core::error::CoreError;
use listo_core::scheduler::{ReminderRequest, ReminderScheduler};

/// Stand-in for the platform notification scheduler: assigns real
/// identifiers but only logs what would be scheduled. Lets the rest of the
/// stack run unchanged on the command line.
pub struct LogScheduler;

#[async_trait]
impl ReminderScheduler for LogScheduler {
    async fn schedule(&self, request: ReminderRequest) -> Result<String, CoreError> {
        let identifier = Uuid::now_v7().to_string();
        info!(
            %identifier,
            title = %request.title,
            trigger_at = %request.trigger_at,
            "reminder scheduled"
        );
        Ok(identifier)
    }

    async fn cancel(&self, identifier: &str) -> Result<(), CoreError> {
        info!(identifier, "reminder cancelled");
        Ok(())
    }
}
