//! Change-feed relay errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while forwarding change records to the device.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum RelayError {
    /// Device answered with a non-2xx status
    #[error("Device responded with status {status}: {body}")]
    DownstreamStatus {
        /// HTTP status code returned by the device
        status: u16,
        /// Truncated response body
        body: String,
    },

    /// Request never produced a response (connect error, timeout)
    #[error("Device transport error: {message}")]
    DownstreamTransport {
        /// Description of the transport failure
        message: String,
    },

    /// Configured device endpoint is not a usable URL
    #[error("Invalid device endpoint '{url}': {message}")]
    InvalidEndpoint {
        /// Endpoint as configured
        url: String,
        /// Parse or client construction failure
        message: String,
    },
}

impl RelayError {
    /// Downstream failures are retried by the relay; configuration errors are not.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::DownstreamStatus { .. } | Self::DownstreamTransport { .. })
    }
}
