//! Processing time and timers.
//!
//! All times are absolute milliseconds since the Unix epoch ([`EventTime`]).
//! The driver reads "now" through a [`Clock`] so that window cycles can be
//! driven deterministically with a [`ManualClock`].

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

mod timer_service;

pub use timer_service::*;

/// Milliseconds since the Unix epoch.
pub type EventTime = i64;

/// Source of the current processing time.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now_millis(&self) -> EventTime;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> EventTime {
        current_processing_time_ms()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: EventTime) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start)),
        }
    }

    pub fn set(&self, now: EventTime) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move the clock forward by `by`, returning the new time.
    pub fn advance(&self, by: Duration) -> EventTime {
        self.now.fetch_add(duration_millis(by), Ordering::SeqCst) + duration_millis(by)
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> EventTime {
        self.now.load(Ordering::SeqCst)
    }
}

/// Current wall-clock time in milliseconds.
pub fn current_processing_time_ms() -> EventTime {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as EventTime)
        .unwrap_or(0)
}

/// Absolute time `add` from now, in milliseconds.
pub fn time_millis(add: Duration) -> EventTime {
    current_processing_time_ms().saturating_add(duration_millis(add))
}

pub(crate) fn duration_millis(duration: Duration) -> EventTime {
    EventTime::try_from(duration.as_millis()).unwrap_or(EventTime::MAX)
}

#[cfg(test)]
#[path = "tests/time_tests.rs"]
mod tests;
