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

//! Records returned by session operations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ScopeType;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// No trace has been loaded yet
    #[default]
    Uninitialized,
    /// Stepping is possible
    Active,
    /// The end of the trace was reached
    Complete,
    /// The trace turned out to be inconsistent
    Error,
}

impl SessionStatus {
    /// Whether stepping actions are accepted
    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Active => write!(f, "active"),
            Self::Complete => write!(f, "complete"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Outcome status of a single state-changing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    /// The session is positioned on `next_line`
    Active,
    /// The action ran off the end of the trace
    Complete,
    /// The session was not active, so nothing happened
    Inactive,
    /// The trace was inconsistent and the session stopped
    Error,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Complete => write!(f, "complete"),
            Self::Inactive => write!(f, "inactive"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Result of a stepping or navigation call.
///
/// `next_line` is only set when the session is positioned on a line after the
/// call. Source text, indentation and scope type describe that line and are
/// absent when it is unset or outside the source. `depth` always describes
/// the trace entry at `index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    /// Line the session now sits on
    pub next_line: Option<usize>,
    /// What happened
    pub status: ResultStatus,
    /// Source text of `next_line`
    pub current_source_line: Option<String>,
    /// Call depth at `index`
    pub depth: Option<usize>,
    /// Indentation of `next_line`
    pub indent: Option<usize>,
    /// Scope classification of `next_line`
    pub scope_type: Option<ScopeType>,
    /// Trace index the session sits on
    pub index: usize,
}

impl StepResult {
    /// Whether the session is still positioned on a line
    pub fn is_active(&self) -> bool {
        self.status == ResultStatus::Active
    }
}

/// Snapshot of a session for display.
///
/// All collections are copies; changing them has no effect on the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Lifecycle status
    pub status: SessionStatus,
    /// Whether stepping actions are accepted
    pub is_active: bool,
    /// Current source line, once a session was started
    pub current_line: Option<usize>,
    /// Current trace index
    pub current_index: usize,
    /// Breakpoint lines in ascending order
    pub breakpoints: Vec<usize>,
    /// Visited lines, oldest first
    pub execution_history: Vec<usize>,
    /// Length of the trace
    pub total_steps: usize,
    /// Call depth at the current index
    pub current_depth: usize,
    /// Indentation of the current line
    pub current_indent: usize,
    /// Scope classification of the current line
    pub current_scope_type: ScopeType,
    /// Whether a previous visit is available to step back to
    pub can_step_back: bool,
}
