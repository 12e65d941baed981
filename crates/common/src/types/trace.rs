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

use std::{fs, ops::Deref, path::Path};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A pre-recorded execution trace: the 1-based source lines a program
/// executed, in order, with repeats for loops and recursion.
///
/// A tracer that observes real call/return events may also ship the call
/// depth of every entry; when present it replaces the indentation heuristic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TraceFile")]
pub struct ExecutionTrace {
    lines: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    depths: Option<Vec<usize>>,
}

/// Accepted on-disk shapes: a bare array, or an object with optional depths.
#[derive(Deserialize)]
#[serde(untagged)]
enum TraceFile {
    Lines(Vec<usize>),
    Recorded {
        lines: Vec<usize>,
        #[serde(default)]
        depths: Option<Vec<usize>>,
    },
}

impl From<TraceFile> for ExecutionTrace {
    fn from(file: TraceFile) -> Self {
        match file {
            TraceFile::Lines(lines) => Self { lines, depths: None },
            TraceFile::Recorded { lines, depths } => Self { lines, depths },
        }
    }
}

impl Deref for ExecutionTrace {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        &self.lines
    }
}

impl From<Vec<usize>> for ExecutionTrace {
    fn from(lines: Vec<usize>) -> Self {
        Self { lines, depths: None }
    }
}

impl ExecutionTrace {
    /// Create a trace from executed line numbers
    pub fn new(lines: Vec<usize>) -> Self {
        Self { lines, depths: None }
    }

    /// Create a trace whose call depths were recorded by the tracer
    pub fn with_depths(lines: Vec<usize>, depths: Vec<usize>) -> Self {
        Self { lines, depths: Some(depths) }
    }

    /// Parse a trace from JSON text
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).wrap_err("Failed to parse execution trace JSON")
    }

    /// Load a trace from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read trace file: {path:?}"))?;
        let trace = Self::from_json_str(&content)
            .with_context(|| format!("Invalid trace file: {path:?}"))?;
        debug!("Loaded trace with {} entries from {:?}", trace.len(), path);
        Ok(trace)
    }

    /// Executed line numbers
    pub fn lines(&self) -> &[usize] {
        &self.lines
    }

    /// Tracer-recorded call depths, if any
    pub fn depths(&self) -> Option<&[usize]> {
        self.depths.as_deref()
    }

    /// Split into line numbers and optional depths
    pub fn into_parts(self) -> (Vec<usize>, Option<Vec<usize>>) {
        (self.lines, self.depths)
    }
}
