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

//! Call depth reconstruction over a recorded trace.
//!
//! A plain line trace carries no call stack, so the depth of each trace
//! position has to be recovered after the fact. [`IndentHeuristic`] does this
//! from line-number jumps and indentation changes:
//!
//! - **Enter**: a backward jump onto a function definition pushes a frame.
//! - **Exit by unindent**: moving to a shallower indent pops every frame
//!   opened at or right of the new indent.
//! - **Exit by forward jump**: jumping forward onto a line not nested inside
//!   the innermost frame is taken as a return and pops the same way.
//!
//! This is a heuristic. Exception handling, generators and lambdas can
//! produce jumps that look like calls or returns and will be misjudged.
//! Tracers that observe real call/return events should hand their depths
//! over through [`RecordedDepths`] instead.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{ScopeMap, ScopeType, SessionError};

/// Derived metadata for one trace position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceFrame {
    /// Call nesting depth (0 = top level)
    pub depth: usize,
    /// Indentation of the executed line
    pub indent: usize,
    /// Scope classification of the executed line
    pub scope_type: ScopeType,
    /// Executed source line number
    pub line: usize,
}

/// Capability for assigning a call depth to every trace position.
pub trait DepthSource {
    /// Compute one frame per trace entry; the first frame must have depth 0
    fn frames(&self, trace: &[usize], scopes: &ScopeMap) -> Result<Vec<TraceFrame>, SessionError>;
}

/// Indentation and line-jump heuristic for traces without call events.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndentHeuristic;

/// A function scope the heuristic believes is currently executing
#[derive(Debug, Clone, Copy)]
struct CallFrame {
    line: usize,
    indent: usize,
}

impl IndentHeuristic {
    /// Pop every frame opened at or right of `indent`
    fn unwind(stack: &mut Vec<CallFrame>, indent: usize) {
        while let Some(top) = stack.last() {
            if top.indent < indent {
                break;
            }
            debug!("Leaving function defined at line {}", top.line);
            stack.pop();
        }
    }
}

impl DepthSource for IndentHeuristic {
    fn frames(&self, trace: &[usize], scopes: &ScopeMap) -> Result<Vec<TraceFrame>, SessionError> {
        let mut frames: Vec<TraceFrame> = Vec::with_capacity(trace.len());
        let mut stack: Vec<CallFrame> = Vec::new();

        for (i, &line) in trace.iter().enumerate() {
            let info = scopes.info(line);

            if let Some(prev) = i.checked_sub(1).map(|p| frames[p]) {
                let entering = line < prev.line
                    && info.is_scope_start
                    && info.scope_type == ScopeType::Function;

                if entering {
                    stack.push(CallFrame { line, indent: info.indent });
                } else if info.indent < prev.indent {
                    Self::unwind(&mut stack, info.indent);
                } else if line > prev.line
                    && stack.last().is_some_and(|top| top.indent >= info.indent)
                {
                    Self::unwind(&mut stack, info.indent);
                }
            }

            frames.push(TraceFrame {
                depth: stack.len(),
                indent: info.indent,
                scope_type: info.scope_type,
                line,
            });
        }

        Ok(frames)
    }
}

/// Depths recorded by a tracer alongside the executed lines.
///
/// The table is rebased so that the first entry sits at depth 0, since a
/// tracer may count frames from an outer harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedDepths(pub Vec<usize>);

impl DepthSource for RecordedDepths {
    fn frames(&self, trace: &[usize], scopes: &ScopeMap) -> Result<Vec<TraceFrame>, SessionError> {
        if self.0.len() != trace.len() {
            return Err(SessionError::DepthLengthMismatch {
                expected: trace.len(),
                found: self.0.len(),
            });
        }

        let base = self.0.first().copied().unwrap_or_default();
        if base != 0 {
            warn!("Recorded depths start at {}, rebasing to 0", base);
        }

        Ok(trace
            .iter()
            .zip(&self.0)
            .map(|(&line, &depth)| {
                let info = scopes.info(line);
                TraceFrame {
                    depth: depth.saturating_sub(base),
                    indent: info.indent,
                    scope_type: info.scope_type,
                    line,
                }
            })
            .collect())
    }
}
