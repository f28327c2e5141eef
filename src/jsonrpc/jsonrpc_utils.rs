//! JSON-RPC 2.0 protocol utilities
//!
//! Provides constants, helper functions, and utilities for working with
//! JSON-RPC 2.0 protocol as per https://www.jsonrpc.org/specification

use crate::jsonrpc::protocol::{JsonRpcResponse, RequestId, ResponseError};
use serde_json::Value;

// ============================================================================
// JSON-RPC 2.0 Constants
// ============================================================================

/// JSON-RPC 2.0 version identifier
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 Error Codes (as per JSON-RPC specification)
/// https://www.jsonrpc.org/specification#error_object
#[allow(dead_code)]
pub mod error_codes {
    /// Parse error - Invalid JSON was received by the server.
    pub const PARSE_ERROR: i32 = -32700;

    /// Invalid Request - The JSON sent is not a valid Request object.
    pub const INVALID_REQUEST: i32 = -32600;

    /// Method not found - The method does not exist / is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;

    /// Invalid params - Invalid method parameter(s).
    pub const INVALID_PARAMS: i32 = -32602;

    /// Internal error - Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;

    /// Server error range start - Reserved for implementation-defined server-errors.
    pub const SERVER_ERROR_START: i32 = -32099;

    /// Server error range end - Reserved for implementation-defined server-errors.
    pub const SERVER_ERROR_END: i32 = -32000;

    /// Check if the given code is in the server error range (-32099 to -32000)
    pub fn is_server_error(code: i32) -> bool {
        (SERVER_ERROR_START..=SERVER_ERROR_END).contains(&code)
    }
}

// ============================================================================
// JSON-RPC Response Builders
// ============================================================================

/// Create a successful JSON-RPC response
pub fn success_response(id: Option<RequestId>, result: Value) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: JSONRPC_VERSION.to_string(),
        id,
        result: Some(result),
        error: None,
    }
}

/// Create a JSON-RPC error response
pub fn error_response(id: Option<RequestId>, error: ResponseError) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: JSONRPC_VERSION.to_string(),
        id,
        result: None,
        error: Some(error),
    }
}

/// Create a "parse error" response for a body that could not be decoded
pub fn parse_error_response(id: Option<RequestId>, reason: &str) -> JsonRpcResponse {
    error_response(id, ResponseError::new(error_codes::PARSE_ERROR, reason))
}
