//! Slack delivery via the Web API `chat.postMessage` method.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use stopwatch_common::error::HandlerError;
use stopwatch_common::types::{DeliveryReceipt, NotificationMessage};

/// Delivers a single chat message.
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send(&self, message: &NotificationMessage) -> Result<DeliveryReceipt, HandlerError>;
}

/// Body returned by `chat.postMessage`.
#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

/// Slack Web API client. Posts the message as a URL-encoded form.
pub struct SlackClient {
    http: reqwest::Client,
    api_url: String,
}

impl SlackClient {
    pub fn new(http: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
        }
    }
}

#[async_trait]
impl ChatSender for SlackClient {
    async fn send(&self, message: &NotificationMessage) -> Result<DeliveryReceipt, HandlerError> {
        let response = self
            .http
            .post(&self.api_url)
            .form(message)
            .send()
            .await
            .map_err(|e| HandlerError::Delivery(format!("request to Slack failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| HandlerError::Delivery(format!("reading Slack response failed: {}", e)))?;

        let receipt = interpret_response(status, &body, &message.channel)?;
        tracing::info!(
            channel = %receipt.channel,
            ts = receipt.ts.as_deref().unwrap_or("-"),
            "Slack message delivered"
        );
        Ok(receipt)
    }
}

/// Map a `chat.postMessage` reply to a receipt.
///
/// Slack answers API-level failures (bad token, unknown channel) with HTTP 200
/// and `"ok": false`, so both the status and the body are checked.
fn interpret_response(
    status: StatusCode,
    body: &str,
    requested_channel: &str,
) -> Result<DeliveryReceipt, HandlerError> {
    if !status.is_success() {
        return Err(HandlerError::Delivery(format!(
            "Slack returned HTTP {}: {}",
            status,
            body.trim()
        )));
    }

    let parsed: PostMessageResponse = serde_json::from_str(body).map_err(|e| {
        HandlerError::Delivery(format!("unparseable Slack response: {}", e))
    })?;

    if !parsed.ok {
        return Err(HandlerError::Delivery(format!(
            "Slack rejected message: {}",
            parsed.error.as_deref().unwrap_or("unknown_error")
        )));
    }

    Ok(DeliveryReceipt {
        channel: parsed
            .channel
            .unwrap_or_else(|| requested_channel.to_string()),
        ts: parsed.ts,
    })
}
