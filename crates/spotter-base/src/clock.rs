use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use std::time::Instant;

/// Monotonic millisecond time source.
///
/// Every dwell, debounce and countdown decision reads time through this
/// trait so tests can drive elapsed time without sleeping.
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed origin.
    fn now_ms(&self) -> u64;
}

/// Wall-clock-independent time measured from the moment of construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// A manually advanced clock.
///
/// Clones share the same counter, so a test can hold one handle and advance
/// time while the code under test reads through another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    value: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            value: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Move time forward. Returns the new time.
    pub fn advance(&self, ms: u64) -> u64 {
        self.value.fetch_add(ms, Ordering::Relaxed) + ms
    }

    pub fn set(&self, ms: u64) {
        self.value.store(ms, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}
