//! Test utilities shared by unit and integration tests.
//!
//! Compiled for `cfg(test)` and when the `test-support` feature is enabled.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

/// A clock pinned to a start instant that moves only in whole seconds.
///
/// Sessions record second-resolution latencies, so tests advance the clock
/// by the same unit they assert on.
#[derive(Debug)]
pub struct MutableClock {
    start: DateTime<Utc>,
    elapsed_seconds: AtomicI64,
}

impl MutableClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            start,
            elapsed_seconds: AtomicI64::new(0),
        }
    }

    pub fn advance_seconds(&self, seconds: i64) {
        self.elapsed_seconds.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.start + TimeDelta::seconds(self.elapsed_seconds.load(Ordering::SeqCst))
    }
}
