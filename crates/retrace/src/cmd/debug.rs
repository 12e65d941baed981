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

//! Interactive terminal debugger

use std::{
    io::{self, BufRead, Write},
    path::Path,
    str::FromStr,
    sync::mpsc::{self, Receiver},
};

use eyre::{eyre, Result};
use retrace_common::types::BreakpointSpec;
use retrace_engine::{
    DebugEvent, EventKind, ResultStatus, RetraceConfig, Session, StepAction, StepResult,
};
use tracing::{debug, info};

use crate::utils::start_session;

/// Lines shown above and below the current line by `list`
const LIST_CONTEXT: usize = 5;

/// Debug a recorded trace with commands read from stdin
pub fn debug_trace(
    source: &Path,
    trace: &Path,
    breakpoints: &[BreakpointSpec],
    config: &RetraceConfig,
) -> Result<()> {
    let session = start_session(source, trace, breakpoints, config)?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut repl = Repl::new(session, stdout.lock());
    repl.run(stdin.lock())
}

/// Whether the prompt keeps reading after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Line-oriented debugger prompt over a started session
pub struct Repl<W: Write> {
    session: Session,
    events: Receiver<DebugEvent>,
    out: W,
}

impl<W: Write> Repl<W> {
    /// Wrap a started session, printing to `out`
    pub fn new(mut session: Session, out: W) -> Self {
        let (tx, events) = mpsc::channel();
        session.register_callback(move |event| {
            debug!("Session event: {} at line {} (index {})", event.kind, event.line, event.index);
            tx.send(*event).map_err(|e| eyre!("Event receiver dropped: {e}"))
        });
        Self { session, events, out }
    }

    /// Read commands until `quit` or end of input
    pub fn run<R: BufRead>(&mut self, input: R) -> Result<()> {
        writeln!(
            self.out,
            "retrace: {} source lines, {} trace entries. Type 'help' for commands.",
            self.session.source_len(),
            self.session.trace().len()
        )?;
        self.show_current()?;

        let mut lines = input.lines();
        loop {
            write!(self.out, "(retrace) ")?;
            self.out.flush()?;

            let Some(line) = lines.next() else {
                writeln!(self.out)?;
                break;
            };
            if self.execute_command(line?.trim())? == Flow::Quit {
                break;
            }
        }

        info!("Debugging session closed");
        Ok(())
    }

    fn execute_command(&mut self, command: &str) -> Result<Flow> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        let Some(&name) = parts.first() else {
            return Ok(Flow::Continue);
        };
        let arg = parts.get(1).copied();

        if let Ok(action) = StepAction::from_str(name) {
            self.step(action)?;
            return Ok(Flow::Continue);
        }

        match name {
            "back" | "b" => {
                let result = self.session.step_back();
                self.report(&result)?;
            }
            "break" | "bp" => self.with_line(arg, |repl, line| {
                let added = repl.session.add_breakpoint(line)?;
                let note = if added { "set" } else { "already set" };
                writeln!(repl.out, "Breakpoint {note} at line {line}")?;
                Ok(())
            })?,
            "delete" | "d" => self.with_line(arg, |repl, line| {
                let removed = repl.session.remove_breakpoint(line)?;
                let note = if removed { "removed" } else { "not set" };
                writeln!(repl.out, "Breakpoint {note} at line {line}")?;
                Ok(())
            })?,
            "toggle" | "t" => self.with_line(arg, |repl, line| {
                let enabled = repl.session.toggle_breakpoint(line)?;
                let note = if enabled { "set" } else { "removed" };
                writeln!(repl.out, "Breakpoint {note} at line {line}")?;
                Ok(())
            })?,
            "clear" => {
                let cleared = self.session.clear_breakpoints();
                writeln!(self.out, "Cleared {cleared} breakpoint(s)")?;
            }
            "until" | "u" => self.with_line(arg, |repl, line| {
                let result = repl.session.run_to_line(line)?;
                repl.report(&result)
            })?,
            "state" | "info" => self.show_state()?,
            "scope" => match arg {
                Some(_) => self.with_line(arg, |repl, line| repl.show_scope(line))?,
                None => match self.session.current_line() {
                    Some(line) => self.show_scope(line)?,
                    None => writeln!(self.out, "No current line")?,
                },
            },
            "history" => {
                let state = self.session.get_state();
                let visited: Vec<String> =
                    state.execution_history.iter().map(ToString::to_string).collect();
                writeln!(self.out, "History: {}", visited.join(" -> "))?;
            }
            "list" | "l" => self.list_source()?,
            "help" | "h" | "?" => self.show_help()?,
            "quit" | "q" | "exit" => return Ok(Flow::Quit),
            other => {
                writeln!(self.out, "Unknown command: {other}. Type 'help' for available commands.")?
            }
        }

        Ok(Flow::Continue)
    }

    fn step(&mut self, action: StepAction) -> Result<()> {
        let result = self.session.perform(action);
        self.report(&result)
    }

    /// Parse a line argument and run `f` with it, printing failures instead of
    /// ending the prompt
    fn with_line<F>(&mut self, arg: Option<&str>, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self, usize) -> Result<()>,
    {
        let Some(arg) = arg else {
            writeln!(self.out, "Missing line number")?;
            return Ok(());
        };

        let line = match BreakpointSpec::from_str(arg) {
            Ok(spec) => spec.line,
            Err(e) => {
                writeln!(self.out, "Error: {e}")?;
                return Ok(());
            }
        };

        if let Err(e) = f(self, line) {
            writeln!(self.out, "Error: {e}")?;
        }
        Ok(())
    }

    fn report(&mut self, result: &StepResult) -> Result<()> {
        for event in self.events.try_iter().collect::<Vec<_>>() {
            if event.kind == EventKind::Breakpoint {
                writeln!(self.out, "Breakpoint hit at line {}", event.line)?;
            }
        }

        match result.status {
            ResultStatus::Active => self.show_current()?,
            ResultStatus::Complete => writeln!(self.out, "Execution complete")?,
            ResultStatus::Inactive => {
                writeln!(self.out, "No active session (status: {})", self.session.status())?
            }
            ResultStatus::Error => {
                writeln!(self.out, "Trace does not match the source; session stopped")?
            }
        }
        Ok(())
    }

    fn show_current(&mut self) -> Result<()> {
        let state = self.session.get_state();
        let Some(line) = state.current_line else {
            return Ok(());
        };
        let text = self.session.source_line(line).unwrap_or_default();
        writeln!(
            self.out,
            "=> {line:>4} | {text}    [depth {}, step {}/{}]",
            state.current_depth,
            state.current_index + 1,
            state.total_steps
        )?;
        Ok(())
    }

    fn show_state(&mut self) -> Result<()> {
        let state = self.session.get_state();
        writeln!(self.out, "Status:      {}", state.status)?;
        match state.current_line {
            Some(line) => writeln!(self.out, "Line:        {line}")?,
            None => writeln!(self.out, "Line:        -")?,
        }
        writeln!(self.out, "Step:        {}/{}", state.current_index + 1, state.total_steps)?;
        writeln!(self.out, "Depth:       {}", state.current_depth)?;
        writeln!(self.out, "Scope:       {}", state.current_scope_type)?;
        let breakpoints: Vec<String> = state.breakpoints.iter().map(ToString::to_string).collect();
        writeln!(self.out, "Breakpoints: [{}]", breakpoints.join(", "))?;
        writeln!(self.out, "Step back:   {}", if state.can_step_back { "yes" } else { "no" })?;
        Ok(())
    }

    fn show_scope(&mut self, line: usize) -> Result<()> {
        let info = self.session.get_scope_info(line);
        writeln!(
            self.out,
            "Line {line}: {} scope, indent {}{}",
            info.scope_type,
            info.indent,
            if info.is_scope_start { ", opens a block" } else { "" }
        )?;
        Ok(())
    }

    fn list_source(&mut self) -> Result<()> {
        let total = self.session.source_len();
        let current = self.session.current_line();
        let center = current.unwrap_or(1);
        let first = center.saturating_sub(LIST_CONTEXT).max(1);
        let last = (center + LIST_CONTEXT).min(total);
        let breakpoints = self.session.breakpoints();

        for line in first..=last {
            let marker = if current == Some(line) { '>' } else { ' ' };
            let bp = if breakpoints.contains(&line) { '*' } else { ' ' };
            let text = self.session.source_line(line).unwrap_or_default();
            writeln!(self.out, "{marker}{bp}{line:>4} | {text}")?;
        }
        Ok(())
    }

    fn show_help(&mut self) -> Result<()> {
        writeln!(self.out, "Available commands:")?;
        writeln!(self.out, "  step, s            Step to the next executed line")?;
        writeln!(self.out, "  next, n            Step over calls")?;
        writeln!(self.out, "  out, o             Step out of the current call")?;
        writeln!(self.out, "  continue, c        Run to the next breakpoint")?;
        writeln!(self.out, "  back, b            Return to the previous position")?;
        writeln!(self.out, "  break, bp <line>   Set a breakpoint")?;
        writeln!(self.out, "  delete, d <line>   Remove a breakpoint")?;
        writeln!(self.out, "  toggle, t <line>   Toggle a breakpoint")?;
        writeln!(self.out, "  clear              Remove all breakpoints")?;
        writeln!(self.out, "  until, u <line>    Run until a line is reached")?;
        writeln!(self.out, "  state, info        Show the session state")?;
        writeln!(self.out, "  scope [line]       Show scope information")?;
        writeln!(self.out, "  history            Show visited lines")?;
        writeln!(self.out, "  list, l            Show source around the current line")?;
        writeln!(self.out, "  help, h            Show this help")?;
        writeln!(self.out, "  quit, q            Exit the debugger")?;
        Ok(())
    }
}
