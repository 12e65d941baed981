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

//! Error types for the stepping engine and debugging sessions.

use thiserror::Error;

/// Errors that can occur while driving a debugging session.
///
/// Contract violations (`EmptyTrace`, `InvalidLine`, `DepthLengthMismatch`) are
/// returned to the caller immediately. `IndexNotFound` is raised internally and
/// degrades the session to an error status instead of escaping, and
/// `InactiveSession` is reported to callers as an `Inactive` result status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A session cannot start from a zero-length trace
    #[error("cannot start a session with an empty trace")]
    EmptyTrace,

    /// A breakpoint or run-to-line target outside the source
    #[error("invalid line number {line}: source has {max} lines")]
    InvalidLine {
        /// The rejected line number
        line: usize,
        /// Number of lines in the source
        max: usize,
    },

    /// An occurrence lookup failed, which means the trace is malformed
    #[error("line {line} does not occur in the trace at or after index {from}")]
    IndexNotFound {
        /// The line number that was searched for
        line: usize,
        /// Inclusive lower bound of the search
        from: usize,
    },

    /// A stepping action was attempted while the session is not active
    #[error("session is not active")]
    InactiveSession,

    /// Tracer-recorded depths do not line up with the trace
    #[error("recorded depths cover {found} trace entries, expected {expected}")]
    DepthLengthMismatch {
        /// Length of the trace
        expected: usize,
        /// Length of the recorded depth table
        found: usize,
    },
}
