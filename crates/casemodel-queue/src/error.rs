use casemodel_core::RunnerError;
use thiserror::Error;

/// Errors raised by the event queue
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The queue no longer accepts messages
    #[error("Event queue {0} is stopped")]
    Stopped(String),

    /// The worker thread or its runtime could not be started
    #[error("Failed to start worker for event queue {queue}: {reason}")]
    WorkerSpawn {
        /// Queue name
        queue: String,
        /// Underlying error
        reason: String,
    },

    /// The worker thread panicked
    #[error("Worker of event queue {0} panicked")]
    WorkerPanicked(String),
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

impl From<QueueError> for RunnerError {
    fn from(error: QueueError) -> Self {
        RunnerError::Delivery(error.to_string())
    }
}
