//! Error types shared across the back-office crates.

use thiserror::Error;

/// Top-level error type for lead workflow operations.
///
/// Every fallible operation in the core returns this; the server layer maps
/// it onto an HTTP status via [`WorkflowError::http_status`].
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl WorkflowError {
    /// Map to an HTTP status code for the server layer.
    pub fn http_status(&self) -> u16 {
        match self {
            WorkflowError::NotFound(_) => 404,
            WorkflowError::Unauthorized(_) => 401,
            WorkflowError::Forbidden(_) => 403,
            WorkflowError::Precondition(_) => 409,
            WorkflowError::InvalidInput(_) => 400,
            WorkflowError::Internal(_) => 500,
        }
    }

    /// True for errors that are safe to show verbatim to API callers.
    pub fn is_client_fault(&self) -> bool {
        !matches!(self, WorkflowError::Internal(_))
    }
}
