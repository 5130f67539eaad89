// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wall-clock abstraction.
//!
//! Every "now" in the scheduler goes through a [`Clock`] so tests can pin
//! and advance time without sleeping.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Source of the current wall-clock time in epoch milliseconds.
pub trait Clock: Send + Sync + fmt::Debug {
    fn epoch_ms(&self) -> i64;
}

/// Shared handle passed to checkers, the trigger manager and the loaders.
pub type SharedClock = Arc<dyn Clock>;

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// 2026-01-01T00:00:00Z
const FAKE_CLOCK_START_MS: i64 = 1_767_225_600_000;

/// Manually driven clock for tests.
///
/// Clones share the same underlying time.
#[derive(Debug, Clone)]
pub struct FakeClock {
    now_ms: Arc<Mutex<i64>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::at(FAKE_CLOCK_START_MS)
    }
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock pinned at the given epoch milliseconds.
    pub fn at(epoch_ms: i64) -> Self {
        Self {
            now_ms: Arc::new(Mutex::new(epoch_ms)),
        }
    }

    pub fn set(&self, epoch_ms: i64) {
        *self.now_ms.lock() = epoch_ms;
    }

    pub fn advance(&self, by: Duration) {
        *self.now_ms.lock() += by.as_millis() as i64;
    }

    /// Shared handle to this clock.
    pub fn shared(&self) -> SharedClock {
        Arc::new(self.clone())
    }
}

impl Clock for FakeClock {
    fn epoch_ms(&self) -> i64 {
        *self.now_ms.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
