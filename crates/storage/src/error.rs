use approvals_model::{ActivityId, ProcessId, ProcessState};

/// All errors that can be returned by an approvals collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No process with the given id.
    #[error("process not found: {process_id}")]
    ProcessNotFound { process_id: ProcessId },

    /// No activity with the given id.
    #[error("activity not found: {activity_id}")]
    ActivityNotFound { activity_id: ActivityId },

    /// The process reached APPROVED or TERMINATED before this change landed.
    #[error("process {process_id} is already {state}")]
    ProcessClosed {
        process_id: ProcessId,
        state: ProcessState,
    },

    /// The collaborator rejected its arguments (empty id, bad page, missing scope).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The legacy routing service returned a fault.
    #[error("routing service fault: {0}")]
    Routing(String),

    /// A backend-specific error (connection, serialization, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}
