//! Stopwatch Lambda entrypoint.
//!
//! Subscribed to `ECS Task State Change` events for stopped tasks; reports
//! failed tasks to Slack.

use anyhow::Context;
use lambda_runtime::{Error, LambdaEvent, service_fn};

use stopwatch_common::config::NotifierConfig;
use stopwatch_common::types::{Outcome, TaskStateChangeEvent};
use stopwatch_notifier::NotificationHandler;
use stopwatch_notifier::metadata::EcsTaskDefinitions;
use stopwatch_notifier::slack::SlackClient;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stopwatch_lambda=info,stopwatch_notifier=info".into()),
        )
        .json()
        .without_time()
        .init();

    let handler = build_handler().await?;
    tracing::info!("Stopwatch notifier ready");

    let handler = &handler;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<TaskStateChangeEvent>| async move {
        handle(handler, event).await
    }))
    .await
}

/// Build the handler once per cold start.
async fn build_handler() -> anyhow::Result<NotificationHandler> {
    let config = NotifierConfig::from_env().context("loading Slack configuration")?;
    tracing::info!(channel = %config.channel_id, "Configuration loaded");

    let sdk_config = aws_config::load_from_env().await;
    let http = reqwest::Client::builder()
        .build()
        .context("building HTTP client")?;

    let slack = SlackClient::new(http, config.slack_api_url.clone());
    Ok(NotificationHandler::new(
        config,
        Box::new(EcsTaskDefinitions::new(sdk_config)),
        Box::new(slack),
    ))
}

async fn handle(
    handler: &NotificationHandler,
    event: LambdaEvent<TaskStateChangeEvent>,
) -> Result<Outcome, Error> {
    let (payload, context) = event.into_parts();

    match handler.handle(&payload).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            tracing::error!(
                request_id = %context.request_id,
                event_id = payload.id.as_deref().unwrap_or("-"),
                task_arn = %payload.detail.task_arn,
                error = %e,
                "Failed to process task state change"
            );
            Err(e.into())
        }
    }
}
