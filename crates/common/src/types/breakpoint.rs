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

use std::{fmt::Display, str::FromStr};

use eyre::{bail, eyre, Error, Result};
use serde::{Deserialize, Serialize};

/// A breakpoint location as typed by a user: a 1-based source line.
///
/// Range checks against a concrete source happen in the session; parsing only
/// rejects text that cannot name a line at all.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct BreakpointSpec {
    /// Line number in the source file (1-based).
    pub line: usize,
}

impl Display for BreakpointSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.line)
    }
}

impl FromStr for BreakpointSpec {
    type Err = Error;

    /// Parses a breakpoint from a string.
    /// Format: `[@]<line>`
    /// Examples:
    /// - `12` - Breakpoint at line 12
    /// - `@12` - Same, in the form the debugger prints it back
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            bail!("Empty breakpoint location");
        }

        let line_str = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();
        let line =
            line_str.parse::<usize>().map_err(|e| eyre!("Invalid line number '{line_str}': {e}"))?;
        if line == 0 {
            bail!("Line numbers are 1-based, got 0");
        }

        Ok(Self { line })
    }
}

impl From<BreakpointSpec> for usize {
    fn from(spec: BreakpointSpec) -> Self {
        spec.line
    }
}
