use thiserror::Error;

use tenderflow_auth::AuthzError;
use tenderflow_core::DomainError;

use crate::store::StoreError;

/// Outcome category of a failed operation; each error kind maps to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Forbidden,
    BadRequest,
    Conflict,
    Internal,
}

/// Errors surfaced by [`TenderService`](super::TenderService).
///
/// Store failures that are not a not-found or a lost version race are folded
/// into `OperationFailed`; its detail is logged, never displayed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TenderServiceError {
    #[error("user '{0}' not found")]
    UserNotFound(String),

    #[error("tender not found: {0}")]
    TenderNotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid action '{0}'")]
    InvalidAction(String),

    /// The tender changed between read and write. The caller decides whether
    /// to retry after re-reading.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("operation failed")]
    OperationFailed(String),
}

pub type ServiceResult<T> = Result<T, TenderServiceError>;

impl TenderServiceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TenderServiceError::UserNotFound(_) | TenderServiceError::TenderNotFound(_) => {
                ErrorCategory::NotFound
            }
            TenderServiceError::Forbidden(_) => ErrorCategory::Forbidden,
            TenderServiceError::InvalidAction(_) | TenderServiceError::ValidationFailed(_) => {
                ErrorCategory::BadRequest
            }
            TenderServiceError::Conflict(_) => ErrorCategory::Conflict,
            TenderServiceError::OperationFailed(_) => ErrorCategory::Internal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Conflict
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            TenderServiceError::UserNotFound(_) => "user_not_found",
            TenderServiceError::TenderNotFound(_) => "tender_not_found",
            TenderServiceError::Forbidden(_) => "forbidden",
            TenderServiceError::InvalidAction(_) => "invalid_action",
            TenderServiceError::Conflict(_) => "conflict",
            TenderServiceError::ValidationFailed(_) => "validation_failed",
            TenderServiceError::OperationFailed(_) => "operation_failed",
        }
    }
}

impl From<DomainError> for TenderServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Conflict(msg) => TenderServiceError::Conflict(msg),
            DomainError::Validation(msg)
            | DomainError::InvariantViolation(msg)
            | DomainError::InvalidId(msg) => TenderServiceError::ValidationFailed(msg),
        }
    }
}

impl From<AuthzError> for TenderServiceError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::InvalidAction(action) => TenderServiceError::InvalidAction(action),
            AuthzError::Forbidden { action, reason } => {
                TenderServiceError::Forbidden(format!("{action} not permitted ({reason})"))
            }
        }
    }
}

impl From<StoreError> for TenderServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(what) => TenderServiceError::TenderNotFound(what),
            StoreError::Conflict(msg) => {
                tracing::warn!(conflict = %msg, "versioned write rejected");
                TenderServiceError::Conflict(msg)
            }
            StoreError::Unexpected(err) => {
                tracing::error!(error = ?err, "store operation failed");
                TenderServiceError::OperationFailed(format!("{err:#}"))
            }
        }
    }
}
