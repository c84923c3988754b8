//! Time sources for model timestamps.
//!
//! Models never read the wall clock directly. The storage accessor hands
//! its [`Clock`] to [`Model::setup_timestamps`](crate::models::Model::setup_timestamps),
//! so tests can pin time with a [`MockClock`] instead of relying on global state.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// A source of the current time as Unix seconds.
pub trait Clock: Send + Sync {
    /// Current time in seconds since the Unix epoch.
    fn now_unix(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        Utc::now().timestamp()
    }
}

const NOT_FROZEN: i64 = i64::MIN;

/// A clock that can be frozen at a fixed instant and released again.
///
/// Clones share state: freezing one freezes all of them.
#[derive(Debug, Clone)]
pub struct MockClock {
    frozen_at: Arc<AtomicI64>,
}

impl MockClock {
    /// Creates a clock that follows real time until frozen.
    pub fn new() -> Self {
        Self {
            frozen_at: Arc::new(AtomicI64::new(NOT_FROZEN)),
        }
    }

    /// Creates a clock already frozen at `at`.
    pub fn frozen(at: DateTime<Utc>) -> Self {
        let clock = Self::new();
        clock.freeze(at);
        clock
    }

    /// Pins the clock to `at` until [`unfreeze`](Self::unfreeze) is called.
    pub fn freeze(&self, at: DateTime<Utc>) {
        self.frozen_at.store(at.timestamp(), Ordering::SeqCst);
    }

    /// Resumes real time.
    pub fn unfreeze(&self) {
        self.frozen_at.store(NOT_FROZEN, Ordering::SeqCst);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen_at.load(Ordering::SeqCst) != NOT_FROZEN
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now_unix(&self) -> i64 {
        match self.frozen_at.load(Ordering::SeqCst) {
            NOT_FROZEN => Utc::now().timestamp(),
            frozen => frozen,
        }
    }
}
