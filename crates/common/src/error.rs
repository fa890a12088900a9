use thiserror::Error;

/// Failures that abort processing of a task state change event.
///
/// None of these are retried locally; they propagate to the hosting runtime,
/// which records the invocation as failed.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The task definition could not be resolved.
    #[error("Metadata fetch error: {0}")]
    MetadataFetch(String),

    /// The event's containers disagree with the task definition.
    #[error("Container match error: {0}")]
    ContainerMatch(String),

    /// The chat service could not be reached or rejected the message.
    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
