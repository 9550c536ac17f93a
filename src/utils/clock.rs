//! Monotonic clock
//!
//! Every deadline in the session (login, idle, data-connect, store quiet
//! interval) is compared against `Clock::now_millis`. `pause` is the
//! cooperative yield used while waiting on the data endpoint.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub trait Clock: Send {
    /// Milliseconds elapsed on a monotonic time base
    fn now_millis(&self) -> u64;

    /// Give up the processor briefly while waiting on an external event
    fn pause(&self);
}

/// Wall clock backed by `Instant`
pub struct SystemClock {
    origin: Instant,
    pause: Duration,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            pause: Duration::from_millis(1),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn pause(&self) {
        std::thread::sleep(self.pause);
    }
}

/// Deterministic clock. Time only moves through `advance` or `pause`.
///
/// Clones share the same time base, so a test can keep a handle while the
/// server owns another.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
    step: u64,
}

impl ManualClock {
    /// `step` is the number of milliseconds each `pause` advances time by.
    pub fn new(step: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(0)),
            step,
        }
    }

    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn pause(&self) {
        self.advance(self.step);
    }
}
