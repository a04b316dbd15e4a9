//! Unified error types for ThinQ Core.

use thinq_types::StoreError;
use thiserror::Error;

/// Error type for request-driven service operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    /// Document store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A required request field was missing or empty.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// A request field was present but unusable.
    #[error("Invalid {field}: {message}")]
    InvalidField { field: &'static str, message: String },

    /// The request conflicts with the entity's current state.
    #[error("{0}")]
    Conflict(String),
}

impl AppError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(StoreError::NotFound { .. }))
    }

    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField { field, message: message.into() }
    }
}

/// Result type alias for ThinQ Core operations.
pub type AppResult<T> = Result<T, AppError>;
