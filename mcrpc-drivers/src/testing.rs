//! Host test doubles shared by the adapter tests

use core::cell::Cell;

use mcrpc_hal::{Clock, DelayUs};

/// Clock that moves forward one millisecond every time it is read
///
/// Deadlines expire after a bounded number of polls without any real
/// waiting.
pub struct TickClock {
    now: Cell<u64>,
}

impl TickClock {
    pub fn new() -> Self {
        Self { now: Cell::new(0) }
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }
}

impl Clock for TickClock {
    fn now_ms(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + 1);
        now
    }
}

/// Delay that only adds up what was asked of it
#[derive(Default)]
pub struct CountingDelay {
    pub total_us: u64,
}

impl DelayUs for CountingDelay {
    fn delay_us(&mut self, us: u32) {
        self.total_us += us as u64;
    }
}
