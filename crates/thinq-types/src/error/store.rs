//! Document store errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by a document store adapter.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum StoreError {
    /// Referenced document does not exist
    #[error("Document not found: {collection}/{id}")]
    NotFound {
        /// Collection that was searched
        collection: String,
        /// Identifier of the missing document
        id: String,
    },

    /// Backing store cannot be reached (connection, pool, subscription drop)
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Description of the failure
        message: String,
    },

    /// Stored fields could not be converted to or from the domain model
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the conversion failure
        message: String,
    },
}

impl StoreError {
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound { collection: collection.into(), id: id.into() }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into() }
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a temporary error that may resolve on retry.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
