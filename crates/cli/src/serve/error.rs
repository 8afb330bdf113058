//! Mapping of core errors onto HTTP responses.

use approvals_model::ValidationError;
use approvals_policy::ApprovalsError;
use approvals_storage::StorageError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::json_error;

/// An error leaving a handler: a status and a client-facing message.
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl ApiError {
    pub(crate) fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

fn storage_status(e: &StorageError) -> StatusCode {
    match e {
        StorageError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        StorageError::ProcessClosed { .. } => StatusCode::CONFLICT,
        StorageError::ProcessNotFound { .. } | StorageError::ActivityNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        StorageError::Routing(_) | StorageError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn approvals_status(e: &ApprovalsError) -> StatusCode {
    match e {
        ApprovalsError::Validation(_) | ApprovalsError::AccessCheck(_) => StatusCode::BAD_REQUEST,
        ApprovalsError::ProcessNotFound { .. } | ApprovalsError::ActivityNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        ApprovalsError::PermissionDenied(_) | ApprovalsError::AccessDenied(_) => {
            StatusCode::FORBIDDEN
        }
        ApprovalsError::Cancelled => StatusCode::REQUEST_TIMEOUT,
        ApprovalsError::Storage(inner) => storage_status(inner),
        e if e.is_state_error() => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ApprovalsError> for ApiError {
    fn from(e: ApprovalsError) -> Self {
        Self::new(approvals_status(&e), e.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        Self::new(storage_status(&e), e.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "request failed");
        }
        json_error(self.status, &self.message).into_response()
    }
}
