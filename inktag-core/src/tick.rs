//! Wake tick counter
//!
//! The tick source is the only writer; everything else reads a snapshot.
//! A lock-free atomic is enough since the value is a single word.

use portable_atomic::{AtomicU32, Ordering};

/// Monotonic tick counter shared between the tick source and the main loop
pub struct TickCounter {
    ticks: AtomicU32,
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TickCounter {
    /// Create a counter at zero (usable in a `static`)
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
        }
    }

    /// Advance by one tick, returning the new value
    ///
    /// Only the tick source may call this.
    pub fn increment(&self) -> u32 {
        self.ticks.fetch_add(1, Ordering::Release).wrapping_add(1)
    }

    /// Current tick value
    pub fn now(&self) -> u32 {
        self.ticks.load(Ordering::Acquire)
    }
}
