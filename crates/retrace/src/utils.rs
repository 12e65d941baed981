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

//! Utility functions for the retrace binary

use std::{fs, path::Path};

use eyre::{Context, Result};
use retrace_common::types::{BreakpointSpec, ExecutionTrace};
use retrace_engine::{RetraceConfig, Session};
use tracing::debug;

/// Read a program source and its recorded trace from disk
pub fn load_program(source: &Path, trace: &Path) -> Result<(String, ExecutionTrace)> {
    let text = fs::read_to_string(source)
        .with_context(|| format!("Failed to read source file: {source:?}"))?;
    let trace = ExecutionTrace::load(trace)?;
    debug!("Loaded {} source lines and {} trace entries", text.lines().count(), trace.len());
    Ok((text, trace))
}

/// Load a program from disk and start a session on it
pub fn start_session(
    source: &Path,
    trace: &Path,
    breakpoints: &[BreakpointSpec],
    config: &RetraceConfig,
) -> Result<Session> {
    let (text, trace) = load_program(source, trace)?;
    let lines: Vec<usize> = breakpoints.iter().copied().map(usize::from).collect();

    let mut session = Session::new(config.engine.clone());
    session.start(&text, trace, &lines).wrap_err("Failed to start debugging session")?;
    Ok(session)
}
