// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tick gate shared between the playback scheduler and the event loop.

use proboj_observer_replay::TickSource;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Single-threaded tick source. The scheduler opens and closes the gate;
/// the event loop reads it to decide whether a playback interval should run.
#[derive(Debug, Clone, Default)]
pub struct TickGate {
    period: Rc<Cell<Option<Duration>>>,
}

impl TickGate {
    /// Create a closed gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Period requested by the scheduler while playing
    pub fn period(&self) -> Option<Duration> {
        self.period.get()
    }
}

impl TickSource for TickGate {
    fn start(&mut self, period: Duration) {
        self.period.set(Some(period));
    }

    fn cancel(&mut self) {
        self.period.set(None);
    }

    fn is_running(&self) -> bool {
        self.period.get().is_some()
    }
}
