//! JSON-RPC 2.0 protocol layer
//!
//! Envelope types for requests, notifications and responses, and the
//! error object carried by failed responses.

use crate::jsonrpc::jsonrpc_utils::{JSONRPC_VERSION, error_codes};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ============================================================================
// Request Identifier
// ============================================================================

/// JSON-RPC request identifier
///
/// A message without an identifier is a notification. The absence is
/// modelled as `Option::None` on the envelope, never as a sentinel value, so
/// `0` and `""` stay ordinary request ids that always get a reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        RequestId::Number(value)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        RequestId::String(value.to_string())
    }
}

// ============================================================================
// JSON-RPC Types
// ============================================================================

fn default_version() -> String {
    JSONRPC_VERSION.to_string()
}

/// JSON-RPC 2.0 request or notification message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (always "2.0")
    #[serde(default = "default_version")]
    pub jsonrpc: String,

    /// Method name
    pub method: String,

    /// Parameters, `Null` when omitted
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,

    /// Request identifier, absent for notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

impl JsonRpcRequest {
    /// Check whether the message expects no reply
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Best-effort id recovery from a body that failed to decode as an envelope
    ///
    /// Returns `None` when the body is not JSON at all or its `id` member is
    /// missing or malformed.
    pub fn salvage_id(body: &[u8]) -> Option<RequestId> {
        let value: Value = serde_json::from_slice(body).ok()?;
        let id = value.get("id")?.clone();
        serde_json::from_value(id).ok()
    }
}

/// JSON-RPC 2.0 response message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,

    /// Request identifier (matches the request, `null` when unknown)
    pub id: Option<RequestId>,

    /// Result (present if successful)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error (present if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

// ============================================================================
// JSON-RPC Errors
// ============================================================================

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    /// Error code
    pub code: i32,

    /// Error message
    pub message: String,

    /// Optional additional data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ResponseError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured data to the error
    #[allow(dead_code)]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            error_codes::METHOD_NOT_FOUND,
            format!("method {method} not found"),
        )
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_PARAMS, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(error_codes::INTERNAL_ERROR, message)
    }
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code: {}, message: {}", self.code, self.message)?;

        if let Some(data) = &self.data {
            write!(f, ", data: {data}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ResponseError {}
