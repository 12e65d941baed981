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

//! RPC method handlers
//!
//! Every method is named `retrace_<command>` and takes the command's
//! arguments as named parameters, e.g. `retrace_add_breakpoint` with
//! `{"line": 4}`. Requests are decoded into a [`Command`] and applied to the
//! hosted session while holding its lock.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::debug;

use super::{
    types::{error_codes, RpcError},
    utils::{invalid_params, method_not_found, session_error, to_rpc_error},
};
use crate::{Command, Session, SessionStatus};

/// Prefix shared by all method names
pub const METHOD_PREFIX: &str = "retrace_";

/// Commands exposed over RPC, without the method prefix
pub const METHODS: &[&str] = &[
    "start",
    "step",
    "step_over",
    "step_out",
    "continue",
    "step_back",
    "add_breakpoint",
    "remove_breakpoint",
    "toggle_breakpoint",
    "clear_breakpoints",
    "run_to_line",
    "get_state",
    "get_scope_info",
];

/// Method handler for dispatching RPC calls onto one session
#[derive(Debug, Clone)]
pub struct MethodHandler {
    session: Arc<Mutex<Session>>,
}

impl MethodHandler {
    /// Create a handler serving `session`
    pub fn new(session: Arc<Mutex<Session>>) -> Self {
        Self { session }
    }

    /// The hosted session
    pub fn session(&self) -> &Arc<Mutex<Session>> {
        &self.session
    }

    /// Handle an RPC method call
    pub fn handle_method(&self, method: &str, params: Option<Value>) -> Result<Value, RpcError> {
        debug!("Handling RPC method: {}", method);

        let command = parse_command(method, params)?;
        let mut session = self.session.lock();

        if session.status() == SessionStatus::Uninitialized && needs_session(&command) {
            return Err(to_rpc_error(
                error_codes::NO_SESSION,
                "No session has been started; call retrace_start first",
                None,
            ));
        }

        command.apply(&mut session).map_err(|e| session_error(&e))
    }
}

fn needs_session(command: &Command) -> bool {
    !matches!(command, Command::Start { .. } | Command::GetState | Command::GetScopeInfo { .. })
}

/// Decode a method name and its named parameters into a [`Command`]
pub fn parse_command(method: &str, params: Option<Value>) -> Result<Command, RpcError> {
    let name = method
        .strip_prefix(METHOD_PREFIX)
        .filter(|name| METHODS.contains(name))
        .ok_or_else(|| method_not_found(method))?;

    let mut object = match params {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map,
        Some(_) => return Err(invalid_params("Parameters must be a JSON object")),
    };
    object.insert("command".to_string(), Value::String(name.to_string()));

    serde_json::from_value(Value::Object(object))
        .map_err(|e| invalid_params(&format!("Invalid parameters for '{method}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn handler() -> MethodHandler {
        MethodHandler::new(Arc::new(Mutex::new(Session::default())))
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("retrace_step", None).unwrap(), Command::Step);
        assert_eq!(
            parse_command("retrace_run_to_line", Some(json!({"line": 5}))).unwrap(),
            Command::RunToLine { line: 5 }
        );
    }

    #[test]
    fn test_unknown_methods() {
        for method in ["step", "retrace_jump", "debug.stepNext", "retrace_"] {
            let err = parse_command(method, None).unwrap_err();
            assert_eq!(err.code, error_codes::METHOD_NOT_FOUND, "{method}");
        }
    }

    #[test]
    fn test_invalid_params() {
        let err = parse_command("retrace_add_breakpoint", Some(json!([3]))).unwrap_err();
        assert_eq!(err.code, error_codes::INVALID_PARAMS);

        let err = parse_command("retrace_add_breakpoint", Some(json!({"line": "x"}))).unwrap_err();
        assert_eq!(err.code, error_codes::INVALID_PARAMS);
    }

    #[test]
    fn test_every_method_decodes() {
        let params = json!({"line": 1, "source": "x = 1", "trace": [1]});
        for name in METHODS {
            let method = format!("{METHOD_PREFIX}{name}");
            let command = parse_command(&method, Some(params.clone())).unwrap();
            assert_eq!(command.name(), *name);
        }
    }

    #[test]
    fn test_commands_require_started_session() {
        let handler = handler();
        let err = handler.handle_method("retrace_step", None).unwrap_err();
        assert_eq!(err.code, error_codes::NO_SESSION);

        let state = handler.handle_method("retrace_get_state", None).unwrap();
        assert_eq!(state["status"], "uninitialized");
    }

    #[test]
    fn test_session_errors_are_mapped() {
        let handler = handler();
        let err = handler
            .handle_method("retrace_start", Some(json!({"source": "x = 1", "trace": []})))
            .unwrap_err();
        assert_eq!(err.code, error_codes::EMPTY_TRACE);

        handler
            .handle_method("retrace_start", Some(json!({"source": "x = 1", "trace": [1]})))
            .unwrap();
        let err =
            handler.handle_method("retrace_add_breakpoint", Some(json!({"line": 2}))).unwrap_err();
        assert_eq!(err.code, error_codes::INVALID_LINE);
    }
}
