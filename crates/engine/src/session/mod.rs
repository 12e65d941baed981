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

//! Stateful debugging session over a recorded trace.
//!
//! A [`Session`] owns the source, the trace and everything derived from them
//! (scope map and depth table), plus the mutable debugging state: the current
//! trace index, breakpoints, visit history and observers.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized --start--> Active --(end of trace)--> Complete
//!                            |
//!                            +--(inconsistent trace)--> Error
//! ```
//!
//! `start` may be called from any state and always begins afresh. Once a
//! session is `Complete` or `Error`, stepping calls report `Inactive` and
//! change nothing.
//!
//! A session is not internally synchronized. Callers sharing one across
//! threads must serialize access, e.g. behind a mutex.

mod events;
mod result;

pub use events::*;
pub use result::*;

use std::{collections::BTreeSet, collections::VecDeque, fmt};

use retrace_common::types::ExecutionTrace;
use tracing::{debug, error, info};

use crate::{
    occurrence, DepthSource, EngineConfig, IndentClassifier, IndentHeuristic, LineClassifier,
    RecordedDepths, ScopeInfo, ScopeMap, SessionError, StepAction, StepContext, StepOutcome,
    TopLevelStepOut, TraceFrame,
};

/// One position the session has stood on, named by its line and how many
/// earlier trace entries ran the same line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Visit {
    line: usize,
    occurrence: usize,
}

/// A debugging session.
pub struct Session {
    config: EngineConfig,
    classifier: Box<dyn LineClassifier + Send>,
    depth_source: Box<dyn DepthSource + Send>,

    source: Vec<String>,
    scopes: ScopeMap,
    trace: Vec<usize>,
    frames: Vec<TraceFrame>,
    depths: Vec<usize>,

    status: SessionStatus,
    index: usize,
    history: VecDeque<Visit>,
    breakpoints: BTreeSet<usize>,
    observers: Observers,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("status", &self.status)
            .field("index", &self.index)
            .field("trace_len", &self.trace.len())
            .field("source_len", &self.source.len())
            .field("breakpoints", &self.breakpoints)
            .field("history_len", &self.history.len())
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Session {
    /// Create an uninitialized session with the default analyzers
    pub fn new(config: EngineConfig) -> Self {
        let classifier = IndentClassifier::new(config.tab_width);
        Self::with_analyzers(config, Box::new(classifier), Box::new(IndentHeuristic))
    }

    /// Create an uninitialized session with custom analyzers.
    ///
    /// `depth_source` is used for traces that carry no recorded depths.
    pub fn with_analyzers(
        config: EngineConfig,
        classifier: Box<dyn LineClassifier + Send>,
        depth_source: Box<dyn DepthSource + Send>,
    ) -> Self {
        Self {
            config,
            classifier,
            depth_source,
            source: Vec::new(),
            scopes: ScopeMap::default(),
            trace: Vec::new(),
            frames: Vec::new(),
            depths: Vec::new(),
            status: SessionStatus::Uninitialized,
            index: 0,
            history: VecDeque::new(),
            breakpoints: BTreeSet::new(),
            observers: Observers::default(),
        }
    }

    /// Begin debugging `trace` against `source`.
    ///
    /// Any previous session state is discarded; observers are kept. Fails
    /// without touching the current state if the trace is empty, a
    /// breakpoint lies outside the source, or recorded depths do not match
    /// the trace length.
    pub fn start(
        &mut self,
        source: &str,
        trace: impl Into<ExecutionTrace>,
        breakpoints: &[usize],
    ) -> Result<StepResult, SessionError> {
        let trace = trace.into();
        if trace.is_empty() {
            return Err(SessionError::EmptyTrace);
        }

        let source: Vec<String> = source.lines().map(str::to_string).collect();
        for &line in breakpoints {
            check_line(line, source.len())?;
        }

        let scopes = ScopeMap::build(&source, &*self.classifier);
        let (lines, recorded) = trace.into_parts();
        let frames = match recorded {
            Some(depths) => RecordedDepths(depths).frames(&lines, &scopes)?,
            None => self.depth_source.frames(&lines, &scopes)?,
        };

        let first = lines[0];
        self.depths = frames.iter().map(|frame| frame.depth).collect();
        self.frames = frames;
        self.scopes = scopes;
        self.source = source;
        self.trace = lines;
        self.breakpoints = breakpoints.iter().copied().collect();
        self.index = 0;
        self.history = VecDeque::from([Visit { line: first, occurrence: 0 }]);
        self.status = SessionStatus::Active;

        info!(
            "Started session: {} source lines, {} trace entries, {} breakpoints, max depth {}",
            self.source.len(),
            self.trace.len(),
            self.breakpoints.len(),
            self.depths.iter().max().copied().unwrap_or_default()
        );

        self.emit(EventKind::Start, first);
        Ok(self.result(Some(first), ResultStatus::Active))
    }

    /// Run a forward stepping action.
    pub fn perform(&mut self, action: StepAction) -> StepResult {
        if let Err(e) = self.ensure_active() {
            debug!("Ignoring {action}: {e}");
            return self.result(None, ResultStatus::Inactive);
        }

        let ctx = StepContext {
            trace: &self.trace,
            depths: &self.depths,
            breakpoints: &self.breakpoints,
        };
        let outcome = ctx.resolve(action, self.index);
        debug!("{action} from index {} resolved to {:?}", self.index, outcome);

        match outcome {
            StepOutcome::Moved(target) => self.advance(action, target),
            StepOutcome::Complete => self.complete(),
            StepOutcome::TopLevel => match self.config.top_level_step_out {
                TopLevelStepOut::Stay => {
                    debug!("No enclosing call to step out of, staying at index {}", self.index);
                    let line = self.trace[self.index];
                    self.result(Some(line), ResultStatus::Active)
                }
                TopLevelStepOut::Complete => self.complete(),
            },
        }
    }

    /// Return to the previously visited position.
    ///
    /// A no-op when there is nothing to go back to.
    pub fn step_back(&mut self) -> StepResult {
        if let Err(e) = self.ensure_active() {
            debug!("Ignoring step back: {e}");
            return self.result(None, ResultStatus::Inactive);
        }

        if self.history.len() <= 1 {
            debug!("Nothing to step back to");
            let line = self.trace[self.index];
            return self.result(Some(line), ResultStatus::Active);
        }

        self.history.pop_back();
        let Some(&Visit { line, occurrence }) = self.history.back() else {
            return self.result(None, ResultStatus::Inactive);
        };

        let index = match occurrence::nth(&self.trace, line, occurrence) {
            Ok(index) => index,
            Err(e) => return self.fail(e),
        };

        debug!("Stepping back from index {} to {}", self.index, index);
        self.index = index;
        self.emit(EventKind::StepBack, line);
        self.result(Some(line), ResultStatus::Active)
    }

    /// Continue until `target` is reached, without leaving a breakpoint behind.
    pub fn run_to_line(&mut self, target: usize) -> Result<StepResult, SessionError> {
        if !self.status.is_active() {
            return Ok(self.result(None, ResultStatus::Inactive));
        }
        check_line(target, self.source.len())?;

        let temporary = self.breakpoints.insert(target);
        let result = self.perform(StepAction::Continue);
        if temporary {
            self.breakpoints.remove(&target);
        }

        Ok(result)
    }

    /// Set a breakpoint; returns whether it was newly added
    pub fn add_breakpoint(&mut self, line: usize) -> Result<bool, SessionError> {
        check_line(line, self.source.len())?;
        let added = self.breakpoints.insert(line);
        if added {
            debug!("Added breakpoint at line {}", line);
        }
        Ok(added)
    }

    /// Clear a breakpoint; returns whether it was set
    pub fn remove_breakpoint(&mut self, line: usize) -> Result<bool, SessionError> {
        check_line(line, self.source.len())?;
        let removed = self.breakpoints.remove(&line);
        if removed {
            debug!("Removed breakpoint at line {}", line);
        }
        Ok(removed)
    }

    /// Flip a breakpoint; returns whether it is set afterwards
    pub fn toggle_breakpoint(&mut self, line: usize) -> Result<bool, SessionError> {
        if self.remove_breakpoint(line)? {
            Ok(false)
        } else {
            self.add_breakpoint(line)
        }
    }

    /// Remove every breakpoint; returns how many there were
    pub fn clear_breakpoints(&mut self) -> usize {
        let count = self.breakpoints.len();
        self.breakpoints.clear();
        debug!("Cleared {} breakpoints", count);
        count
    }

    /// Snapshot of the session
    pub fn get_state(&self) -> SessionState {
        let frame = self.frames.get(self.index).copied();
        SessionState {
            status: self.status,
            is_active: self.status.is_active(),
            current_line: self.current_line(),
            current_index: self.index,
            breakpoints: self.breakpoints(),
            execution_history: self.history.iter().map(|visit| visit.line).collect(),
            total_steps: self.trace.len(),
            current_depth: frame.map(|f| f.depth).unwrap_or_default(),
            current_indent: frame.map(|f| f.indent).unwrap_or_default(),
            current_scope_type: frame.map(|f| f.scope_type).unwrap_or_default(),
            can_step_back: self.status.is_active() && self.history.len() > 1,
        }
    }

    /// Scope metadata of a source line; unknown lines get the module default
    pub fn get_scope_info(&self, line: usize) -> ScopeInfo {
        self.scopes.info(line)
    }

    /// Register an observer for session events
    pub fn register_callback<F>(&mut self, callback: F) -> ObserverId
    where
        F: FnMut(&DebugEvent) -> eyre::Result<()> + Send + 'static,
    {
        self.observers.register(Box::new(callback))
    }

    /// Unregister an observer; returns whether it was registered
    pub fn unregister_callback(&mut self, id: ObserverId) -> bool {
        self.observers.unregister(id)
    }

    /// Lifecycle status
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Current source line, once a session was started
    pub fn current_line(&self) -> Option<usize> {
        match self.status {
            SessionStatus::Uninitialized => None,
            _ => self.trace.get(self.index).copied(),
        }
    }

    /// Current trace index
    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Breakpoint lines in ascending order
    pub fn breakpoints(&self) -> Vec<usize> {
        self.breakpoints.iter().copied().collect()
    }

    /// Copy of the derived per-index frame table
    pub fn frames(&self) -> Vec<TraceFrame> {
        self.frames.clone()
    }

    /// The loaded trace
    pub fn trace(&self) -> &[usize] {
        &self.trace
    }

    /// Text of a 1-based source line
    pub fn source_line(&self, line: usize) -> Option<&str> {
        line.checked_sub(1).and_then(|i| self.source.get(i)).map(String::as_str)
    }

    /// Number of source lines
    pub fn source_len(&self) -> usize {
        self.source.len()
    }

    /// Engine configuration in effect
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.status.is_active() {
            Ok(())
        } else {
            Err(SessionError::InactiveSession)
        }
    }

    fn advance(&mut self, action: StepAction, target: usize) -> StepResult {
        let line = self.trace[target];
        let occurrence = self.trace[..target].iter().filter(|&&l| l == line).count();

        self.index = target;
        self.record_visit(Visit { line, occurrence });

        let kind = if action == StepAction::Continue && self.breakpoints.contains(&line) {
            EventKind::Breakpoint
        } else {
            EventKind::Step
        };
        self.emit(kind, line);
        self.result(Some(line), ResultStatus::Active)
    }

    fn record_visit(&mut self, visit: Visit) {
        self.history.push_back(visit);
        let limit = self.config.max_history;
        if limit > 0 {
            while self.history.len() > limit {
                self.history.pop_front();
            }
        }
    }

    fn complete(&mut self) -> StepResult {
        self.status = SessionStatus::Complete;
        let line = self.trace[self.index];
        info!("Session complete at line {} (index {})", line, self.index);
        self.emit(EventKind::Complete, line);
        self.result(None, ResultStatus::Complete)
    }

    fn fail(&mut self, e: SessionError) -> StepResult {
        error!("Session stopped at index {}: {}", self.index, e);
        self.status = SessionStatus::Error;
        self.result(None, ResultStatus::Error)
    }

    fn emit(&mut self, kind: EventKind, line: usize) {
        let event = DebugEvent { kind, line, index: self.index };
        self.observers.notify(&event);
    }

    fn result(&self, next_line: Option<usize>, status: ResultStatus) -> StepResult {
        let text = next_line.and_then(|line| self.source_line(line));
        let info = next_line.filter(|_| text.is_some()).map(|line| self.scopes.info(line));

        StepResult {
            next_line,
            status,
            current_source_line: text.map(str::to_string),
            depth: self.frames.get(self.index).map(|frame| frame.depth),
            indent: info.map(|info| info.indent),
            scope_type: info.map(|info| info.scope_type),
            index: self.index,
        }
    }
}

fn check_line(line: usize, max: usize) -> Result<(), SessionError> {
    if (1..=max).contains(&line) {
        Ok(())
    } else {
        Err(SessionError::InvalidLine { line, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScopeType;
    use std::sync::{Arc, Mutex};

    const CALL_SOURCE: &str = "def f():\n    return 1\nx = f()\nprint(x)\n";

    fn started(trace: Vec<usize>) -> Session {
        let mut session = Session::default();
        session.start(CALL_SOURCE, trace, &[]).unwrap();
        session
    }

    #[test]
    fn test_start_positions_on_first_entry() {
        let mut session = Session::default();
        let result = session.start(CALL_SOURCE, vec![3, 1, 2, 3, 4], &[]).unwrap();

        assert_eq!(result.next_line, Some(3));
        assert_eq!(result.index, 0);
        assert_eq!(result.depth, Some(0));
        assert_eq!(result.current_source_line.as_deref(), Some("x = f()"));
        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(session.get_state().execution_history, vec![3]);
    }

    #[test]
    fn test_start_rejects_empty_trace_and_bad_breakpoints() {
        let mut session = Session::default();
        assert_eq!(session.start(CALL_SOURCE, Vec::new(), &[]), Err(SessionError::EmptyTrace));
        assert_eq!(
            session.start(CALL_SOURCE, vec![1], &[9]),
            Err(SessionError::InvalidLine { line: 9, max: 4 })
        );
        assert_eq!(session.status(), SessionStatus::Uninitialized);
        assert_eq!(session.current_line(), None);
    }

    #[test]
    fn test_recorded_depths_replace_heuristic() {
        let mut session = Session::default();
        let trace = ExecutionTrace::with_depths(vec![3, 1, 2, 3, 4], vec![1, 1, 1, 1, 1]);
        session.start(CALL_SOURCE, trace, &[]).unwrap();

        // Flat depths make step over behave like step
        let result = session.perform(StepAction::StepOver);
        assert_eq!(result.index, 1);
        assert!(session.frames().iter().all(|frame| frame.depth == 0));
    }

    #[test]
    fn test_step_result_describes_landing_line() {
        let mut session = started(vec![3, 1, 2, 3, 4]);
        let result = session.perform(StepAction::Step);

        assert_eq!(result.next_line, Some(1));
        assert_eq!(result.status, ResultStatus::Active);
        assert_eq!(result.current_source_line.as_deref(), Some("def f():"));
        assert_eq!(result.depth, Some(1));
        assert_eq!(result.indent, Some(0));
        assert_eq!(result.scope_type, Some(ScopeType::Function));
    }

    #[test]
    fn test_lines_outside_source_have_no_text() {
        let mut session = Session::default();
        session.start("x = 1", vec![1, 7], &[]).unwrap();
        let result = session.perform(StepAction::Step);

        assert_eq!(result.next_line, Some(7));
        assert_eq!(result.current_source_line, None);
        assert_eq!(result.indent, None);
        assert_eq!(result.scope_type, None);
        assert_eq!(result.depth, Some(0));
    }

    #[test]
    fn test_step_out_at_top_level_stays() {
        let mut session = started(vec![3, 1, 2, 3, 4]);
        let result = session.perform(StepAction::StepOut);

        assert_eq!(result.status, ResultStatus::Active);
        assert_eq!(result.next_line, Some(3));
        assert_eq!(result.index, 0);
        assert_eq!(session.get_state().execution_history, vec![3]);
    }

    #[test]
    fn test_step_out_at_top_level_can_complete() {
        let config =
            EngineConfig { top_level_step_out: TopLevelStepOut::Complete, ..Default::default() };
        let mut session = Session::new(config);
        session.start(CALL_SOURCE, vec![3, 1, 2, 3, 4], &[]).unwrap();

        let result = session.perform(StepAction::StepOut);
        assert_eq!(result.status, ResultStatus::Complete);
        assert_eq!(session.status(), SessionStatus::Complete);
    }

    #[test]
    fn test_step_over_recursive_call_lands_after_it() {
        let source = "def f(n):\n    if n:\n        f(n - 1)\n    return n\nf(1)\n";
        // f(1) -> f(0) -> return -> return
        let trace = vec![5, 1, 2, 3, 1, 2, 4, 4, 5];
        let mut session = Session::default();
        session.start(source, trace, &[]).unwrap();
        session.perform(StepAction::Step);
        session.perform(StepAction::Step);
        session.perform(StepAction::Step);
        assert_eq!(session.current_index(), 3);
        let depth_at_call = session.get_state().current_depth;

        let result = session.perform(StepAction::StepOver);
        assert!(result.index > 3);
        assert!(result.depth.unwrap() <= depth_at_call);
        assert!(session.frames()[4..result.index].iter().all(|f| f.depth > depth_at_call));
    }

    #[test]
    fn test_bounded_history() {
        let config = EngineConfig { max_history: 2, ..Default::default() };
        let mut session = Session::new(config);
        session.start(CALL_SOURCE, vec![3, 1, 2, 3, 4], &[]).unwrap();

        for _ in 0..3 {
            session.perform(StepAction::Step);
        }
        assert_eq!(session.get_state().execution_history, vec![2, 3]);

        assert_eq!(session.step_back().index, 2);
        let result = session.step_back();
        assert_eq!(result.index, 2);
        assert!(!session.get_state().can_step_back);
    }

    #[test]
    fn test_events_carry_index() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut session = Session::default();
        let sink = events.clone();
        session.register_callback(move |event| {
            sink.lock().unwrap().push(*event);
            Ok(())
        });

        session.start(CALL_SOURCE, vec![3, 1, 2, 3, 4], &[]).unwrap();
        session.perform(StepAction::StepOver);
        session.step_back();

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                DebugEvent { kind: EventKind::Start, line: 3, index: 0 },
                DebugEvent { kind: EventKind::Step, line: 3, index: 3 },
                DebugEvent { kind: EventKind::StepBack, line: 3, index: 0 },
            ]
        );
    }

    #[test]
    fn test_restart_keeps_observers_and_resets_state() {
        let starts = Arc::new(Mutex::new(0));
        let mut session = started(vec![3, 1, 2, 3, 4]);
        let counter = starts.clone();
        session.register_callback(move |event| {
            if event.kind == EventKind::Start {
                *counter.lock().unwrap() += 1;
            }
            Ok(())
        });

        session.perform(StepAction::Step);
        session.perform(StepAction::Continue);
        assert_eq!(session.status(), SessionStatus::Complete);

        session.start(CALL_SOURCE, vec![3, 4], &[4]).unwrap();
        assert_eq!(*starts.lock().unwrap(), 1);
        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(session.breakpoints(), vec![4]);
        assert_eq!(session.get_state().execution_history, vec![3]);
    }

    #[test]
    fn test_step_back_restores_occurrence_of_repeated_line() {
        let mut session = Session::default();
        session.start("for i in range(3):\n    x = i\nprint(x)", vec![1, 2, 1, 2, 1, 3], &[]).unwrap();
        for _ in 0..3 {
            session.perform(StepAction::Step);
        }
        let visits: Vec<_> = session.history.iter().map(|v| (v.line, v.occurrence)).collect();
        assert_eq!(visits, vec![(1, 0), (2, 0), (1, 1), (2, 1)]);

        let result = session.step_back();
        assert_eq!(result.index, 2);
        assert_eq!(result.next_line, Some(1));
    }

    #[test]
    fn test_step_back_with_inconsistent_history_degrades_to_error() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let mut session = Session::default();
        session.start(CALL_SOURCE, vec![3, 1, 2, 3, 4], &[]).unwrap();
        session.perform(StepAction::Step);
        session.perform(StepAction::Step);

        // Line 1 runs only once, so a third visit of it cannot be found
        session.history[1].occurrence = 2;
        let seen = errors.clone();
        session.register_callback(move |event| {
            seen.lock().unwrap().push(event.kind);
            Ok(())
        });

        let result = session.step_back();
        assert_eq!(result.status, ResultStatus::Error);
        assert_eq!(result.next_line, None);
        assert_eq!(session.status(), SessionStatus::Error);
        assert!(errors.lock().unwrap().is_empty());

        // Still inspectable, but no longer steppable
        let state = session.get_state();
        assert_eq!(state.status, SessionStatus::Error);
        assert!(!state.is_active);
        assert_eq!(state.current_index, 2);
        assert_eq!(session.perform(StepAction::Step).status, ResultStatus::Inactive);
    }

    #[test]
    fn test_check_line_bounds() {
        assert!(check_line(1, 4).is_ok());
        assert!(check_line(4, 4).is_ok());
        assert_eq!(check_line(0, 4), Err(SessionError::InvalidLine { line: 0, max: 4 }));
        assert_eq!(check_line(5, 4), Err(SessionError::InvalidLine { line: 5, max: 4 }));
    }
}
