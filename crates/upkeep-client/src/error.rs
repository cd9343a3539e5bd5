/*
[INPUT]:  Adapter errors and local guard failures
[OUTPUT]: Error taxonomy surfaced by core operations
[POS]:    Error handling layer - what callers branch on
[UPDATE]: When a new failure needs distinct handling by the UI
*/

use thiserror::Error;
use upkeep_adapter::UpkeepError;

/// Failure of an external collaborator (fetch, submit, complete).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// Transport failure, caller may retry
    #[error("network error: {message}")]
    Network { message: String },

    #[error("request timed out")]
    Timeout,

    /// Token missing or expired, operator must sign in again
    #[error("authentication required")]
    AuthRequired,

    /// Server understood the request and refused it
    #[error("request rejected (code {code}): {message}")]
    Rejected { code: u16, message: String },

    /// Server payload could not be interpreted
    #[error("malformed server data: {0}")]
    MalformedData(String),
}

impl ServiceError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Network { .. } | ServiceError::Timeout => true,
            ServiceError::Rejected { code, .. } => *code >= 500 || *code == 429,
            ServiceError::AuthRequired | ServiceError::MalformedData(_) => false,
        }
    }
}

impl From<UpkeepError> for ServiceError {
    fn from(err: UpkeepError) -> Self {
        if err.is_auth_error() {
            return ServiceError::AuthRequired;
        }
        if err.is_timeout() {
            return ServiceError::Timeout;
        }
        match err {
            UpkeepError::Api { code, message } => ServiceError::Rejected { code, message },
            UpkeepError::RateLimit { .. } => ServiceError::Rejected {
                code: 429,
                message: format!(
                    "too many requests, retry in {}s",
                    err.retry_delay().unwrap_or(1)
                ),
            },
            UpkeepError::Serialization(inner) => ServiceError::MalformedData(inner.to_string()),
            UpkeepError::InvalidResponse(message) => ServiceError::MalformedData(message),
            other => ServiceError::Network {
                message: other.to_string(),
            },
        }
    }
}

/// Input rejected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("description must not be empty")]
    EmptyDescription,

    #[error("classification is not on the details step")]
    NotAtDetails,

    #[error("no subsystem selected")]
    MissingSubsystem,

    #[error("no function selected")]
    MissingFunction,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("report submission failed: {0}")]
    Service(#[from] ServiceError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompletionError {
    /// Task is already completed locally, no request was sent
    #[error("task {task_id} is already completed")]
    AlreadyCompleted { task_id: String },

    #[error("task {task_id} has a completion in flight")]
    InProgress { task_id: String },

    #[error("task {task_id} is not on the current board")]
    UnknownTask { task_id: String },

    #[error("task completion failed: {0}")]
    Service(#[from] ServiceError),
}

/// Session store persistence failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
