//! Device statistics counters

use serde::Serialize;
use std::fmt;
use std::sync::Mutex;

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    updates: u64,
    alerts: u64,
    errors: u64,
    last_error: i32,
}

/// Monotonic event counters shared between the producer and readers.
///
/// Guarded by their own short-held lock, separate from the sample
/// buffer's, so stats readers never contend with the push/pop path.
#[derive(Debug, Default)]
pub struct Stats {
    counters: Mutex<Counters>,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Samples generated
    pub updates: u64,
    /// Threshold-crossing alerts raised
    pub alerts: u64,
    /// Errors recorded
    pub errors: u64,
    /// errno-style code of the most recent error, 0 when none
    pub last_error: i32,
}

impl Stats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one generated sample
    pub fn record_update(&self) {
        self.counters.lock().expect("stats lock poisoned").updates += 1;
    }

    /// Count one threshold-crossing alert
    pub fn record_alert(&self) {
        self.counters.lock().expect("stats lock poisoned").alerts += 1;
    }

    /// Count one error and remember its code
    pub fn record_error(&self, code: i32) {
        let mut c = self.counters.lock().expect("stats lock poisoned");
        c.errors += 1;
        c.last_error = code;
    }

    /// Consistent snapshot of all four counters
    pub fn snapshot(&self) -> StatsSnapshot {
        let c = self.counters.lock().expect("stats lock poisoned");
        StatsSnapshot {
            updates: c.updates,
            alerts: c.alerts,
            errors: c.errors,
            last_error: c.last_error,
        }
    }
}

impl fmt::Display for StatsSnapshot {
    /// The attribute-surface line format:
    /// `updates=<u> alerts=<u> errors=<u> last_error=<i>`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "updates={} alerts={} errors={} last_error={}",
            self.updates, self.alerts, self.errors, self.last_error
        )
    }
}
