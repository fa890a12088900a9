//! Stopped-task notification pipeline.
//!
//! For each `ECS Task State Change` event:
//! 1. Skip the event if every container exited with code 0
//! 2. Resolve the task definition (via `TaskDefinitionSource`)
//! 3. Build the failure report (via `report::build_report`)
//! 4. Post it to the configured channel (via `ChatSender`)

use stopwatch_common::config::NotifierConfig;
use stopwatch_common::error::HandlerError;
use stopwatch_common::types::{NotificationMessage, Outcome, TaskStateChangeEvent};

use crate::metadata::TaskDefinitionSource;
use crate::report::build_report;
use crate::slack::ChatSender;

/// Turns failed-task events into chat notifications.
///
/// Holds no per-event state, so one instance serves every invocation.
pub struct NotificationHandler {
    config: NotifierConfig,
    definitions: Box<dyn TaskDefinitionSource>,
    chat: Box<dyn ChatSender>,
}

impl NotificationHandler {
    pub fn new(
        config: NotifierConfig,
        definitions: Box<dyn TaskDefinitionSource>,
        chat: Box<dyn ChatSender>,
    ) -> Self {
        Self {
            config,
            definitions,
            chat,
        }
    }

    /// Process one task state change event.
    ///
    /// Returns `Outcome::NoFailures` without touching the network when every
    /// container succeeded. Otherwise issues exactly one metadata lookup and
    /// one delivery, in that order, stopping at the first error.
    pub async fn handle(&self, event: &TaskStateChangeEvent) -> Result<Outcome, HandlerError> {
        let detail = &event.detail;

        if !detail.has_failures() {
            tracing::debug!(
                task_arn = %detail.task_arn,
                containers = detail.containers.len(),
                "Task stopped cleanly, nothing to report"
            );
            return Ok(Outcome::NoFailures);
        }

        let failed = detail.containers.iter().filter(|c| c.failed()).count();
        tracing::info!(
            task_arn = %detail.task_arn,
            task_definition_arn = %detail.task_definition_arn,
            failed,
            stopped_reason = detail.stopped_reason.as_deref().unwrap_or("-"),
            "Task stopped with failed containers"
        );

        let definition = self
            .definitions
            .describe(&event.region, &detail.task_definition_arn)
            .await?;

        let text = build_report(event, &definition)?;

        let message = NotificationMessage {
            token: self.config.access_token.clone(),
            channel: self.config.channel_id.clone(),
            text,
        };

        let receipt = self.chat.send(&message).await?;
        Ok(Outcome::Notified(receipt))
    }
}
