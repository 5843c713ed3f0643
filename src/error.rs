use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during mesh operations
#[derive(Debug, Error)]
pub enum MeshError {
    // ===== Routing Errors =====
    /// Inbound payload could not be decoded as a JSON-RPC envelope
    #[error("decode error: {message}")]
    Decode {
        /// Description of the failure
        message: String,
    },

    /// No binding or handler matched an inbound message
    #[error("unroutable message from {sender}")]
    Unroutable {
        /// The peer that sent the message
        sender: String,
    },

    // ===== Fetch Errors =====
    /// Asynchronous metadata refresh failed or timed out
    #[error("metadata fetch failed for {peer}: {message}")]
    MetadataFetch {
        /// The peer the fetch was addressed to
        peer: String,
        /// Description of the failure
        message: String,
    },

    /// A streaming reference could not be resolved
    #[error("streaming resolution failed: {message}")]
    StreamingResolution {
        /// Description of the failure
        message: String,
    },

    /// Reporting a played track failed
    #[error("scrobble report failed: {message}")]
    ScrobbleReport {
        /// Description of the failure
        message: String,
    },

    // ===== Cloud Errors =====
    /// Access token rejected by the cloud service
    #[error("unauthorized access: {message}")]
    Unauthorized {
        /// Description of the failure
        message: String,
    },

    /// Cloud or remote service reported an error
    #[error("service error {code}: {message}")]
    Service {
        /// Service-defined error code
        code: i32,
        /// Description of the failure
        message: String,
    },

    // ===== RPC Errors =====
    /// A JSON-RPC error response was received for an outstanding request
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// Error message from the remote peer
        message: String,
    },

    /// Request timed out waiting for a response
    #[error("request timed out after {duration:?}")]
    Timeout {
        /// The duration waited before giving up
        duration: Duration,
    },

    // ===== Transport Errors =====
    /// Sending over the message transport failed
    #[error("transport error: {message}")]
    Transport {
        /// Description of the failure
        message: String,
        /// The underlying source of the error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ===== Internal Errors =====
    /// Invalid parameter provided
    #[error("invalid parameter: {name} - {message}")]
    InvalidParameter {
        /// The name of the parameter
        name: String,
        /// Description of the error
        message: String,
    },
}

impl MeshError {
    /// Check if this error indicates an invalid access token
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Check if this error is a timeout
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if this error is transient and safe to ignore for
    /// fire-and-forget operations (metadata refresh, scrobbling)
    #[must_use]
    pub fn is_ignorable(&self) -> bool {
        matches!(
            self,
            Self::MetadataFetch { .. } | Self::ScrobbleReport { .. } | Self::Timeout { .. }
        )
    }
}

/// Result type alias for mesh operations
pub type Result<T> = std::result::Result<T, MeshError>;
