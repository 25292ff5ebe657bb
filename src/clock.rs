//! Time source for audit timestamps.
//!
//! Stores never read the wall clock directly; they ask a [`Clock`], so tests
//! can pin and advance time.

use chrono::{DateTime, Duration, DurationRound, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type SharedClock = Arc<dyn Clock>;

/// Reads the system clock, truncated to the millisecond precision the
/// store persists.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        truncate_to_millis(Utc::now())
    }
}

/// Drop sub-millisecond digits, the precision the store persists.
pub fn truncate_to_millis(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .duration_trunc(Duration::milliseconds(1))
        .unwrap_or(instant)
}

/// A manually driven clock. Every call to `now` returns the same instant
/// until [`FixedClock::advance`] or [`FixedClock::set`] moves it.
#[derive(Debug, Clone)]
pub struct FixedClock {
    instant: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        FixedClock {
            instant: Arc::new(Mutex::new(instant)),
        }
    }

    fn instant(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.instant.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn advance(&self, by: Duration) {
        *self.instant() += by;
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.instant() = instant;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant()
    }
}
