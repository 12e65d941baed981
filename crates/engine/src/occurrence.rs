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

//! Locating a specific visit of a line inside the trace.
//!
//! Loops and recursion revisit lines, so a line number alone does not name a
//! trace position. Lookups therefore always carry a lower bound.

use crate::SessionError;

/// First index `>= from` whose entry equals `line`, if any.
pub fn find_from(trace: &[usize], line: usize, from: usize) -> Option<usize> {
    trace.get(from..)?.iter().position(|&l| l == line).map(|offset| from + offset)
}

/// Like [`find_from`], but a miss is reported as [`SessionError::IndexNotFound`].
pub fn locate(trace: &[usize], line: usize, from: usize) -> Result<usize, SessionError> {
    find_from(trace, line, from).ok_or(SessionError::IndexNotFound { line, from })
}

/// Index of the visit of `line` preceded by exactly `rank` earlier visits.
pub fn nth(trace: &[usize], line: usize, rank: usize) -> Result<usize, SessionError> {
    let mut from = 0;
    for _ in 0..rank {
        from = locate(trace, line, from)? + 1;
    }
    locate(trace, line, from)
}
