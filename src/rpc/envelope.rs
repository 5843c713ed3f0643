use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MeshError, Result};

/// Well-known JSON-RPC 2.0 error codes
pub mod codes {
    /// The payload was not valid JSON
    pub const PARSE_ERROR: i64 = -32700;
    /// The envelope was not a valid request
    pub const INVALID_REQUEST: i64 = -32600;
    /// The requested method does not exist
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// The method parameters were invalid
    pub const INVALID_PARAMS: i64 = -32602;
    /// The handler failed internally
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// Error member of a JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcFault {
    /// Error code
    pub code: i64,

    /// Error message
    pub message: String,

    /// Additional error data, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A JSON-RPC 2.0 message: request, response or notification
///
/// The three shapes share one struct; [`RpcEnvelope::is_request`],
/// [`RpcEnvelope::is_response`] and [`RpcEnvelope::is_notification`]
/// classify a decoded envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcEnvelope {
    /// Protocol version, always `"2.0"`
    pub jsonrpc: String,

    /// Correlation id; absent for notifications
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    /// Method name; absent for responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Request or notification parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,

    /// Successful response result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error response payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcFault>,
}

impl RpcEnvelope {
    /// Build a request envelope
    #[must_use]
    pub fn request(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(Value::from(id)),
            method: Some(method.into()),
            params,
            result: None,
            error: None,
        }
    }

    /// Build a notification envelope (a request without an id)
    #[must_use]
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: Some(method.into()),
            params,
            result: None,
            error: None,
        }
    }

    /// Build a successful response for the given request id
    #[must_use]
    pub fn response(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(id),
            method: None,
            params: None,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response for the given request id
    #[must_use]
    pub fn error_response(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(id),
            method: None,
            params: None,
            result: None,
            error: Some(RpcFault {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Decode an envelope from raw payload bytes
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Decode`] when the payload is not a JSON-RPC
    /// message.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let envelope: Self = serde_json::from_slice(payload).map_err(|e| MeshError::Decode {
            message: e.to_string(),
        })?;
        if envelope.method.is_none() && envelope.result.is_none() && envelope.error.is_none() {
            return Err(MeshError::Decode {
                message: "envelope carries neither method nor result nor error".to_string(),
            });
        }
        Ok(envelope)
    }

    /// Encode the envelope into payload bytes
    #[must_use]
    pub fn encode(&self) -> Bytes {
        // Serialization of Value-based envelopes cannot fail
        Bytes::from(serde_json::to_vec(self).unwrap_or_default())
    }

    /// Whether this is a request expecting a response
    #[must_use]
    pub fn is_request(&self) -> bool {
        self.method.is_some() && self.id.is_some()
    }

    /// Whether this is a fire-and-forget notification
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.method.is_some() && self.id.is_none()
    }

    /// Whether this is a response to an earlier request
    #[must_use]
    pub fn is_response(&self) -> bool {
        self.method.is_none() && (self.result.is_some() || self.error.is_some())
    }

    /// The correlation id as a number, if it is one
    #[must_use]
    pub fn numeric_id(&self) -> Option<u64> {
        self.id.as_ref().and_then(Value::as_u64)
    }
}
