use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Handle to a repeating timer. Stays valid after cancellation; a cancelled
/// handle simply never fires again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(pub u64);

#[derive(Debug, Clone)]
struct Repeating {
    handle: TimerHandle,
    period: Duration,
    elapsed: Duration,
}

/// Repeating timers driven by frame deltas, each firing every `period`.
#[derive(Debug, Clone, Default)]
pub struct TimerSet {
    timers: Vec<Repeating>,
    next_handle: u64,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a timer that first fires one full `period` from now. Periods
    /// shorter than a millisecond are raised to one millisecond.
    pub fn start(&mut self, period: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        let period = period.max(Duration::from_millis(1));
        self.timers.push(Repeating {
            handle,
            period,
            elapsed: Duration::ZERO,
        });
        debug!(handle = handle.0, period_ms = period.as_millis() as u64, "timer started");
        handle
    }

    /// Returns `false` if the handle was not active.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.handle != handle);
        let removed = self.timers.len() != before;
        if removed {
            debug!(handle = handle.0, "timer cancelled");
        }
        removed
    }

    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.timers.iter().any(|t| t.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Advance every timer by `dt`. Returns one entry per firing, in start
    /// order; a timer fires several times when `dt` spans several periods.
    pub fn advance(&mut self, dt: Duration) -> Vec<TimerHandle> {
        let mut fired = Vec::new();
        for timer in &mut self.timers {
            timer.elapsed += dt;
            while timer.elapsed >= timer.period {
                timer.elapsed -= timer.period;
                fired.push(timer.handle);
            }
        }
        fired
    }
}
