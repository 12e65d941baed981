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

//! Stateless stepping algorithms over a recorded trace.
//!
//! Every function here takes the current trace index and answers where the
//! action lands. Results are always strictly after the starting index; the
//! trace is never modified.

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A forward stepping action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    /// Advance to the next trace entry
    Step,
    /// Advance without descending into deeper calls
    StepOver,
    /// Advance until the current call returns
    StepOut,
    /// Advance to the next breakpoint
    Continue,
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step => write!(f, "step"),
            Self::StepOver => write!(f, "step_over"),
            Self::StepOut => write!(f, "step_out"),
            Self::Continue => write!(f, "continue"),
        }
    }
}

impl FromStr for StepAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "step" | "s" | "step_into" => Ok(Self::Step),
            "step_over" | "next" | "n" | "over" => Ok(Self::StepOver),
            "step_out" | "out" | "o" | "finish" => Ok(Self::StepOut),
            "continue" | "c" | "cont" => Ok(Self::Continue),
            other => Err(format!("Unknown step action: {other}")),
        }
    }
}

/// Where a stepping action lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The action stops at this trace index
    Moved(usize),
    /// No later trace index satisfies the action
    Complete,
    /// Step-out was requested with no enclosing call
    TopLevel,
}

/// Borrowed view of everything the stepping algorithms read.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    /// Executed line numbers
    pub trace: &'a [usize],
    /// Call depth per trace index, same length as `trace`
    pub depths: &'a [usize],
    /// Active breakpoint lines
    pub breakpoints: &'a BTreeSet<usize>,
}

impl StepContext<'_> {
    /// Run `action` from trace index `index`
    pub fn resolve(&self, action: StepAction, index: usize) -> StepOutcome {
        match action {
            StepAction::Step => step(self.trace, index),
            StepAction::StepOver => step_over(self.depths, index),
            StepAction::StepOut => step_out(self.depths, index),
            StepAction::Continue => continue_to(self.trace, index, self.breakpoints),
        }
    }
}

/// The next trace entry.
pub fn step(trace: &[usize], index: usize) -> StepOutcome {
    let next = index + 1;
    if next < trace.len() {
        StepOutcome::Moved(next)
    } else {
        StepOutcome::Complete
    }
}

/// The first later entry that is no deeper than the current one.
///
/// When the next entry is not a call this is the same as [`step`].
pub fn step_over(depths: &[usize], index: usize) -> StepOutcome {
    let Some(&current) = depths.get(index) else {
        return StepOutcome::Complete;
    };
    first_after(depths, index, |depth| depth <= current)
}

/// The first later entry that is shallower than the current one.
///
/// At depth 0 there is no enclosing call and [`StepOutcome::TopLevel`] is
/// returned, leaving the policy to the caller.
pub fn step_out(depths: &[usize], index: usize) -> StepOutcome {
    match depths.get(index) {
        None => StepOutcome::Complete,
        Some(0) => StepOutcome::TopLevel,
        Some(&current) => first_after(depths, index, |depth| depth < current),
    }
}

/// The first later entry whose line carries a breakpoint.
pub fn continue_to(trace: &[usize], index: usize, breakpoints: &BTreeSet<usize>) -> StepOutcome {
    if breakpoints.is_empty() {
        return StepOutcome::Complete;
    }
    first_after(trace, index, |line| breakpoints.contains(&line))
}

fn first_after(values: &[usize], index: usize, pred: impl Fn(usize) -> bool) -> StepOutcome {
    values
        .iter()
        .enumerate()
        .skip(index + 1)
        .find(|&(_, &v)| pred(v))
        .map_or(StepOutcome::Complete, |(j, _)| StepOutcome::Moved(j))
}
