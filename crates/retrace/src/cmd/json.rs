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

//! Line-delimited JSON protocol over stdio.
//!
//! Every input line holds one [`Command`]; every output line holds the reply,
//! either `{"ok": <result>}` or `{"error": "<message>"}`. Blank lines are
//! skipped. Malformed input is answered with an error and does not end the
//! stream.

use std::io::{self, BufRead, Write};

use eyre::Result;
use retrace_engine::{Command, RetraceConfig, Session};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Serve JSON commands from stdin until end of input
pub fn run_json_stdio(config: &RetraceConfig) -> Result<()> {
    let mut session = Session::new(config.engine.clone());
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve_lines(&mut session, stdin.lock(), stdout.lock())
}

/// Answer every command line of `input` on `out`
pub fn serve_lines<R: BufRead, W: Write>(
    session: &mut Session,
    input: R,
    mut out: W,
) -> Result<()> {
    let mut handled = 0usize;
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = handle_line(session, line);
        writeln!(out, "{reply}")?;
        out.flush()?;
        handled += 1;
    }

    info!("Input closed after {handled} command(s)");
    Ok(())
}

fn handle_line(session: &mut Session, line: &str) -> Value {
    let command = match serde_json::from_str::<Command>(line) {
        Ok(command) => command,
        Err(e) => {
            warn!("Rejected command line: {e}");
            return json!({ "error": format!("Invalid command: {e}") });
        }
    };

    debug!("Received command: {}", command.name());
    match command.apply(session) {
        Ok(value) => json!({ "ok": value }),
        Err(e) => json!({ "error": e.to_string() }),
    }
}
