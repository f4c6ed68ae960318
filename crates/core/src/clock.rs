//! Strictly increasing millisecond timestamps.
//!
//! Search history entries are keyed by `(user, timestamp)`. Inserts issued
//! back-to-back inside the same millisecond would otherwise collide, so
//! the history store draws its timestamps from a [`MonotonicClock`].

use std::sync::Mutex;

use chrono::{Duration, Utc};

use crate::types::{truncate_to_millis, Timestamp};

/// Hands out millisecond timestamps that never repeat or go backwards
/// within one process.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: Mutex<Option<Timestamp>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next timestamp, based on the wall clock.
    pub fn now(&self) -> Timestamp {
        self.next_after(Utc::now())
    }

    /// The next timestamp given `wall` as the current wall-clock reading.
    ///
    /// Returns `wall` truncated to milliseconds, or one millisecond past the
    /// previously issued value when the wall clock has not advanced.
    pub fn next_after(&self, wall: Timestamp) -> Timestamp {
        let wall = truncate_to_millis(wall);
        let mut last = self.last.lock().unwrap_or_else(|p| p.into_inner());
        let next = match *last {
            Some(prev) if wall <= prev => prev + Duration::milliseconds(1),
            _ => wall,
        };
        *last = Some(next);
        next
    }
}
