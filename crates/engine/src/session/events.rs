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

//! Session events and the observers that receive them.
//!
//! Observers run synchronously on the thread driving the session. Each one is
//! isolated from the others and from the session: an observer that returns an
//! error or panics is logged and skipped, and the session carries on.

use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// What happened to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A session was started
    Start,
    /// A forward action moved the position
    Step,
    /// A continue stopped on a breakpoint
    Breakpoint,
    /// The position moved back to the previous visit
    StepBack,
    /// The session ran off the end of the trace
    Complete,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Step => write!(f, "step"),
            Self::Breakpoint => write!(f, "breakpoint"),
            Self::StepBack => write!(f, "step_back"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// Payload delivered to every observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugEvent {
    /// Kind of event
    pub kind: EventKind,
    /// Source line the session is positioned on after the event
    pub line: usize,
    /// Trace index the session is positioned on after the event
    pub index: usize,
}

/// Observer callback signature
pub type Observer = Box<dyn FnMut(&DebugEvent) -> eyre::Result<()> + Send>;

/// Handle returned on registration, used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObserverId(u64);

/// Ordered set of observers
#[derive(Default)]
pub struct Observers {
    next_id: u64,
    entries: Vec<(ObserverId, Observer)>,
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers").field("count", &self.entries.len()).finish()
    }
}

impl Observers {
    /// Add an observer; it is called after all previously registered ones
    pub fn register(&mut self, observer: Observer) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, observer));
        id
    }

    /// Remove an observer, returning whether it was registered
    pub fn unregister(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Number of registered observers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no observer is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deliver `event` to every observer in registration order
    pub fn notify(&mut self, event: &DebugEvent) {
        for (id, observer) in &mut self.entries {
            match panic::catch_unwind(AssertUnwindSafe(|| observer(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Observer {:?} failed on {} at line {}: {e:?}", id, event.kind, event.line)
                }
                Err(payload) => warn!(
                    "Observer {:?} panicked on {} at line {}: {}",
                    id,
                    event.kind,
                    event.line,
                    panic_message(payload.as_ref())
                ),
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn event(kind: EventKind, line: usize) -> DebugEvent {
        DebugEvent { kind, line, index: 0 }
    }

    #[test]
    fn test_observers_run_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut observers = Observers::default();

        for tag in ["first", "second"] {
            let seen = seen.clone();
            observers.register(Box::new(move |e| {
                seen.lock().unwrap().push(format!("{tag}:{}", e.kind));
                Ok(())
            }));
        }

        observers.notify(&event(EventKind::Start, 1));
        assert_eq!(*seen.lock().unwrap(), vec!["first:start", "second:start"]);
    }

    #[test]
    fn test_failing_observers_do_not_stop_others() {
        let count = Arc::new(Mutex::new(0));
        let mut observers = Observers::default();

        observers.register(Box::new(|_| Err(eyre::eyre!("observer error"))));
        observers.register(Box::new(|_| panic!("observer panic")));
        let counter = count.clone();
        observers.register(Box::new(move |_| {
            *counter.lock().unwrap() += 1;
            Ok(())
        }));

        observers.notify(&event(EventKind::Step, 2));
        observers.notify(&event(EventKind::Step, 3));
        assert_eq!(*count.lock().unwrap(), 2);
    }

    #[test]
    fn test_unregister() {
        let mut observers = Observers::default();
        let a = observers.register(Box::new(|_| Ok(())));
        let b = observers.register(Box::new(|_| Ok(())));
        assert_ne!(a, b);
        assert_eq!(observers.len(), 2);

        assert!(observers.unregister(a));
        assert!(!observers.unregister(a));
        assert_eq!(observers.len(), 1);
    }

    #[test]
    fn test_event_kind_names() {
        assert_eq!(EventKind::StepBack.to_string(), "step_back");
        assert_eq!(serde_json::to_string(&EventKind::Breakpoint).unwrap(), "\"breakpoint\"");
    }
}
