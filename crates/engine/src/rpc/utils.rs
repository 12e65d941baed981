//! RPC server utilities
//!
//! This module provides helpers for building JSON-RPC error objects.

use crate::{
    rpc::types::{error_codes, RpcError},
    SessionError,
};

/// Convert error to RPC error format
pub fn to_rpc_error(code: i32, message: &str, data: Option<serde_json::Value>) -> RpcError {
    RpcError { code, message: message.to_string(), data }
}

/// Helper to create method not found error
pub fn method_not_found(method: &str) -> RpcError {
    to_rpc_error(error_codes::METHOD_NOT_FOUND, &format!("Method '{method}' not found"), None)
}

/// Helper to create invalid params error
pub fn invalid_params(message: &str) -> RpcError {
    to_rpc_error(error_codes::INVALID_PARAMS, message, None)
}

/// Map a session error onto its RPC error code
pub fn session_error(error: &SessionError) -> RpcError {
    let code = match error {
        SessionError::EmptyTrace => error_codes::EMPTY_TRACE,
        SessionError::InvalidLine { .. } => error_codes::INVALID_LINE,
        SessionError::IndexNotFound { .. } => error_codes::INDEX_NOT_FOUND,
        SessionError::InactiveSession => error_codes::NO_SESSION,
        SessionError::DepthLengthMismatch { .. } => error_codes::INVALID_PARAMS,
    };
    to_rpc_error(code, &error.to_string(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_helpers() {
        let err = invalid_params("missing field `line`");
        assert_eq!(err.code, -32602);
        assert_eq!(err.message, "missing field `line`");

        let err = method_not_found("test_method");
        assert_eq!(err.code, -32601);
        assert!(err.message.contains("test_method"));
    }

    #[test]
    fn test_session_error_codes() {
        let err = session_error(&SessionError::InvalidLine { line: 9, max: 4 });
        assert_eq!(err.code, error_codes::INVALID_LINE);
        assert!(err.message.contains('9'));

        assert_eq!(session_error(&SessionError::EmptyTrace).code, error_codes::EMPTY_TRACE);
        assert_eq!(
            session_error(&SessionError::DepthLengthMismatch { expected: 2, found: 1 }).code,
            error_codes::INVALID_PARAMS
        );
    }
}
