use approvals_model::{ActivityId, ActivityState, ProcessId, ProcessState, ValidationError};
use approvals_storage::StorageError;
use tokio_util::sync::CancellationToken;

/// All errors returned by the approvals core.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalsError {
    /// Malformed or missing input; nothing was attempted.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A security query was handed an empty identity.
    #[error("access check failed: {0}")]
    AccessCheck(String),

    #[error("invalid request to {operation} process {process_id} in {state} state")]
    InvalidProcessState {
        process_id: ProcessId,
        state: ProcessState,
        operation: &'static str,
    },

    #[error("activity {activity_id} is in {state} state and cannot be acted upon")]
    InvalidActivityState {
        activity_id: ActivityId,
        state: ActivityState,
    },

    /// Storage accepted a terminate but the process did not end TERMINATED.
    #[error("process {process_id} was not terminated, state is {state}")]
    TerminateFailed {
        process_id: ProcessId,
        state: ProcessState,
    },

    /// Actor mismatch or missing change rights on an actor action.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The termination authorization ladder refused the caller.
    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("process not found: {process_id}")]
    ProcessNotFound { process_id: ProcessId },

    #[error("activity {activity_id} not found in process {process_id}")]
    ActivityNotFound {
        process_id: ProcessId,
        activity_id: ActivityId,
    },

    #[error("operation cancelled")]
    Cancelled,

    /// A collaborator failure, propagated unchanged.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApprovalsError {
    /// "Wrong state" rather than "not allowed".
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            ApprovalsError::InvalidProcessState { .. }
                | ApprovalsError::InvalidActivityState { .. }
                | ApprovalsError::TerminateFailed { .. }
        )
    }

    pub fn is_authorization_error(&self) -> bool {
        matches!(
            self,
            ApprovalsError::PermissionDenied(_) | ApprovalsError::AccessDenied(_)
        )
    }
}

/// Fail with `Cancelled` once the token has fired.
pub(crate) fn ensure_active(cancel: &CancellationToken) -> Result<(), ApprovalsError> {
    if cancel.is_cancelled() {
        return Err(ApprovalsError::Cancelled);
    }
    Ok(())
}
