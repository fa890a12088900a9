use crate::error::HandlerError;

/// Default Slack Web API endpoint for posting messages.
pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api/chat.postMessage";

/// Notifier configuration loaded from environment variables.
#[derive(Clone)]
pub struct NotifierConfig {
    /// Slack channel id (or name) that receives failure reports
    pub channel_id: String,

    /// Slack bot token used as the `token` form field
    pub access_token: String,

    /// Endpoint for `chat.postMessage` (default: Slack's public API)
    pub slack_api_url: String,
}

impl NotifierConfig {
    /// Build a validated configuration. Both values must be non-empty.
    pub fn new(
        channel_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, HandlerError> {
        let channel_id = channel_id.into();
        let access_token = access_token.into();

        if channel_id.trim().is_empty() {
            return Err(HandlerError::Config(
                "SLACK_CHANNEL must not be empty".to_string(),
            ));
        }
        if access_token.trim().is_empty() {
            return Err(HandlerError::Config(
                "SLACK_ACCESS_TOKEN must not be empty".to_string(),
            ));
        }

        Ok(Self {
            channel_id,
            access_token,
            slack_api_url: DEFAULT_SLACK_API_URL.to_string(),
        })
    }

    /// Override the Slack endpoint.
    pub fn with_slack_api_url(mut self, url: impl Into<String>) -> Self {
        self.slack_api_url = url.into();
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, HandlerError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, HandlerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_token = lookup("SLACK_ACCESS_TOKEN").ok_or_else(|| {
            HandlerError::Config("SLACK_ACCESS_TOKEN environment variable is required".to_string())
        })?;
        let channel_id = lookup("SLACK_CHANNEL").ok_or_else(|| {
            HandlerError::Config("SLACK_CHANNEL environment variable is required".to_string())
        })?;

        let config = Self::new(channel_id, access_token)?;
        Ok(match lookup("SLACK_API_URL").filter(|url| !url.is_empty()) {
            Some(url) => config.with_slack_api_url(url),
            None => config,
        })
    }
}

impl std::fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierConfig")
            .field("channel_id", &self.channel_id)
            .field("access_token", &"<redacted>")
            .field("slack_api_url", &self.slack_api_url)
            .finish()
    }
}
