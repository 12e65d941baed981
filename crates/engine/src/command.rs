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

//! JSON command protocol for driving a session.
//!
//! Each [`Command`] is a JSON object whose `command` field selects the
//! operation, with the operation's arguments alongside:
//!
//! ```json
//! {"command": "start", "source": "x = 1\ny = 2", "trace": [1, 2], "breakpoints": [2]}
//! {"command": "step_over"}
//! {"command": "run_to_line", "line": 2}
//! ```
//!
//! Both the stdio mode of the CLI and the JSON-RPC server decode requests into
//! a [`Command`] and run it through [`Command::apply`].

use retrace_common::types::ExecutionTrace;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::{Session, SessionError, StepAction};

/// A single operation on a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Begin a new session
    Start {
        /// Program source text
        source: String,
        /// Executed line numbers
        trace: Vec<usize>,
        /// Initial breakpoint lines
        #[serde(default)]
        breakpoints: Vec<usize>,
        /// Call depth per trace entry, when the tracer recorded them
        #[serde(default, skip_serializing_if = "Option::is_none")]
        depths: Option<Vec<usize>>,
    },
    /// Advance to the next trace entry
    Step,
    /// Advance without descending into deeper calls
    StepOver,
    /// Advance until the current call returns
    StepOut,
    /// Advance to the next breakpoint
    Continue,
    /// Return to the previous visit
    StepBack,
    /// Set a breakpoint
    AddBreakpoint {
        /// Source line
        line: usize,
    },
    /// Clear a breakpoint
    RemoveBreakpoint {
        /// Source line
        line: usize,
    },
    /// Flip a breakpoint
    ToggleBreakpoint {
        /// Source line
        line: usize,
    },
    /// Clear every breakpoint
    ClearBreakpoints,
    /// Continue until a line is reached
    RunToLine {
        /// Source line
        line: usize,
    },
    /// Snapshot of the session
    GetState,
    /// Scope metadata of a source line
    GetScopeInfo {
        /// Source line
        line: usize,
    },
}

impl Command {
    /// Wire name of the command, as used in the `command` field
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Step => "step",
            Self::StepOver => "step_over",
            Self::StepOut => "step_out",
            Self::Continue => "continue",
            Self::StepBack => "step_back",
            Self::AddBreakpoint { .. } => "add_breakpoint",
            Self::RemoveBreakpoint { .. } => "remove_breakpoint",
            Self::ToggleBreakpoint { .. } => "toggle_breakpoint",
            Self::ClearBreakpoints => "clear_breakpoints",
            Self::RunToLine { .. } => "run_to_line",
            Self::GetState => "get_state",
            Self::GetScopeInfo { .. } => "get_scope_info",
        }
    }

    /// Run the command against `session` and return its JSON result.
    ///
    /// Stepping commands return a step result record, breakpoint commands
    /// return the affected flag together with the updated breakpoint list,
    /// and queries return their snapshot.
    pub fn apply(self, session: &mut Session) -> Result<Value, SessionError> {
        debug!("Applying command: {}", self.name());

        let value = match self {
            Self::Start { source, trace, breakpoints, depths } => {
                let trace = match depths {
                    Some(depths) => ExecutionTrace::with_depths(trace, depths),
                    None => ExecutionTrace::new(trace),
                };
                json!(session.start(&source, trace, &breakpoints)?)
            }
            Self::Step => json!(session.perform(StepAction::Step)),
            Self::StepOver => json!(session.perform(StepAction::StepOver)),
            Self::StepOut => json!(session.perform(StepAction::StepOut)),
            Self::Continue => json!(session.perform(StepAction::Continue)),
            Self::StepBack => json!(session.step_back()),
            Self::AddBreakpoint { line } => {
                let added = session.add_breakpoint(line)?;
                json!({ "added": added, "breakpoints": session.breakpoints() })
            }
            Self::RemoveBreakpoint { line } => {
                let removed = session.remove_breakpoint(line)?;
                json!({ "removed": removed, "breakpoints": session.breakpoints() })
            }
            Self::ToggleBreakpoint { line } => {
                let enabled = session.toggle_breakpoint(line)?;
                json!({ "enabled": enabled, "breakpoints": session.breakpoints() })
            }
            Self::ClearBreakpoints => {
                let cleared = session.clear_breakpoints();
                json!({ "cleared": cleared, "breakpoints": session.breakpoints() })
            }
            Self::RunToLine { line } => json!(session.run_to_line(line)?),
            Self::GetState => json!(session.get_state()),
            Self::GetScopeInfo { line } => json!(session.get_scope_info(line)),
        };

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Command {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn test_decode_commands() {
        assert_eq!(parse(r#"{"command": "step"}"#), Command::Step);
        assert_eq!(parse(r#"{"command": "continue"}"#), Command::Continue);
        assert_eq!(parse(r#"{"command": "run_to_line", "line": 4}"#), Command::RunToLine { line: 4 });
        assert_eq!(
            parse(r#"{"command": "start", "source": "x = 1", "trace": [1]}"#),
            Command::Start {
                source: "x = 1".to_string(),
                trace: vec![1],
                breakpoints: vec![],
                depths: None
            }
        );
    }

    #[test]
    fn test_reject_malformed_commands() {
        assert!(serde_json::from_str::<Command>(r#"{"command": "jump"}"#).is_err());
        assert!(serde_json::from_str::<Command>(r#"{"command": "add_breakpoint"}"#).is_err());
        assert!(serde_json::from_str::<Command>(r#"{"line": 3}"#).is_err());
    }

    #[test]
    fn test_name_matches_wire_tag() {
        for command in [
            Command::StepOver,
            Command::ClearBreakpoints,
            Command::GetScopeInfo { line: 1 },
            Command::ToggleBreakpoint { line: 2 },
        ] {
            let value = serde_json::to_value(&command).unwrap();
            assert_eq!(value["command"], command.name());
        }
    }

    #[test]
    fn test_apply_drives_session() {
        let mut session = Session::default();
        let start = parse(
            r#"{"command": "start", "source": "def f():\n    return 1\nx = f()\nprint(x)",
                "trace": [3, 1, 2, 3, 4]}"#,
        );

        let result = start.apply(&mut session).unwrap();
        assert_eq!(result["nextLine"], 3);

        let result = Command::StepOver.apply(&mut session).unwrap();
        assert_eq!(result["index"], 3);
        assert_eq!(result["depth"], 0);

        let result = Command::ToggleBreakpoint { line: 4 }.apply(&mut session).unwrap();
        assert_eq!(result["enabled"], true);
        assert_eq!(result["breakpoints"], json!([4]));

        let state = Command::GetState.apply(&mut session).unwrap();
        assert_eq!(state["executionHistory"], json!([3, 3]));

        let scope = Command::GetScopeInfo { line: 1 }.apply(&mut session).unwrap();
        assert_eq!(scope["scopeType"], "function");
        assert_eq!(scope["isScopeStart"], true);
    }

    #[test]
    fn test_apply_reports_contract_errors() {
        let mut session = Session::default();
        let err = Command::Start { source: String::new(), trace: vec![], breakpoints: vec![], depths: None }
            .apply(&mut session)
            .unwrap_err();
        assert_eq!(err, SessionError::EmptyTrace);

        Command::Start { source: "a = 1".into(), trace: vec![1], breakpoints: vec![], depths: None }
            .apply(&mut session)
            .unwrap();
        let err = Command::AddBreakpoint { line: 3 }.apply(&mut session).unwrap_err();
        assert_eq!(err, SessionError::InvalidLine { line: 3, max: 1 });
    }
}
