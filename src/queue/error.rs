//! Queue Error Types

/// Error type produced by sink callbacks handed to the drain operations.
///
/// Sinks are external collaborators, so their failures are carried as boxed
/// errors and surfaced through [`QueueError::SinkFailed`].
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue is already being drained by the '{owner}' thread")]
    ConsumerBusy { owner: String },

    #[error("wait for queue data was interrupted")]
    Interrupted,

    #[error("sink callback failed")]
    SinkFailed {
        #[source]
        source: SinkError,
    },

    #[error("queue operation failed: {message}")]
    OperationFailed { message: String },
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
