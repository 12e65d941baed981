// Retrace - Recorded Trace Debugger
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! JSON-RPC protocol types and data structures.
//!
//! This module defines the envelope types exchanged between debugging clients
//! and the retrace RPC server. All types follow the JSON-RPC 2.0
//! specification.
//!
//! # Protocol Types
//!
//! - [`RpcRequest`] - Incoming JSON-RPC request with method and parameters
//! - [`RpcResponse`] - Outgoing JSON-RPC response with result or error
//! - [`RpcError`] - Structured error information following JSON-RPC error format
//! - [`RpcId`] - Request/response identifier (string or number)
//!
//! # Error Handling
//!
//! The module includes standard JSON-RPC error codes in the [`error_codes`] module
//! together with the debugger-specific codes.

use serde::{Deserialize, Serialize};

/// JSON-RPC 2.0 request structure.
///
/// Represents an incoming RPC request from a debugging client.
/// Contains the method to invoke and optional parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Method name to invoke (e.g., "retrace_step_over", "retrace_get_state")
    pub method: String,
    /// Optional named parameters as a JSON object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    /// Request identifier for matching with response
    pub id: RpcId,
}

/// JSON-RPC 2.0 response structure.
///
/// Represents an outgoing RPC response to a debugging client.
/// Contains either a successful result or an error, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Successful method result (omitted if error occurred)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error information (omitted if method succeeded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    /// Request identifier matching the original request
    pub id: RpcId,
}

impl RpcResponse {
    /// Successful response
    pub fn success(id: RpcId, result: serde_json::Value) -> Self {
        Self { jsonrpc: "2.0".to_string(), result: Some(result), error: None, id }
    }

    /// Error response
    pub fn failure(id: RpcId, error: RpcError) -> Self {
        Self { jsonrpc: "2.0".to_string(), result: None, error: Some(error), id }
    }
}

/// JSON-RPC 2.0 error structure.
///
/// Provides structured error information when RPC methods fail.
/// Follows the JSON-RPC error object specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    /// Numeric error code indicating the error type
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Optional additional error data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// JSON-RPC request/response identifier.
///
/// Can be either a string or number as per JSON-RPC 2.0 specification.
/// Used to match responses with their corresponding requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    /// Numeric identifier
    Number(u64),
    /// String identifier
    String(String),
}

/// JSON-RPC error codes for consistent error reporting.
///
/// Includes both standard JSON-RPC 2.0 error codes and retrace-specific error
/// codes for session failures.
pub mod error_codes {
    // Standard JSON-RPC 2.0 error codes

    /// Parse error - Invalid JSON was received by the server
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid request - The JSON sent is not a valid request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found - The method does not exist or is not available
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params - Invalid method parameter(s)
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error - Internal JSON-RPC error
    pub const INTERNAL_ERROR: i32 = -32603;

    // retrace-specific error codes (starting from -33000)

    /// A session was started with an empty trace
    pub const EMPTY_TRACE: i32 = -33001;
    /// A line number lies outside the source
    pub const INVALID_LINE: i32 = -33002;
    /// A trace occurrence lookup failed
    pub const INDEX_NOT_FOUND: i32 = -33003;
    /// No active session to act on
    pub const NO_SESSION: i32 = -33004;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_without_params() {
        let request: RpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "retrace_step", "id": 1}))
                .unwrap();
        assert_eq!(request.method, "retrace_step");
        assert!(request.params.is_none());
        assert_eq!(request.id, RpcId::Number(1));
    }

    #[test]
    fn test_response_omits_absent_fields() {
        let ok = serde_json::to_value(RpcResponse::success(RpcId::String("a".into()), json!(1)))
            .unwrap();
        assert_eq!(ok, json!({"jsonrpc": "2.0", "result": 1, "id": "a"}));

        let error = RpcError { code: error_codes::INVALID_LINE, message: "bad".into(), data: None };
        let err = serde_json::to_value(RpcResponse::failure(RpcId::Number(7), error)).unwrap();
        assert_eq!(err, json!({"jsonrpc": "2.0", "error": {"code": -33002, "message": "bad"}, "id": 7}));
    }
}
