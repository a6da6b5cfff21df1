//! embassy-time backed clock and delay

use embassy_time::{block_for, Duration, Instant};
use mcrpc_hal::{Clock, DelayUs};

/// Milliseconds since boot from the embassy time driver
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}

/// Busy-wait delay on the embassy time driver
///
/// Resolution is one driver tick; pick a tick rate of at least 1 MHz for
/// bit-banged serial above 9600 baud.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyDelay;

impl DelayUs for EmbassyDelay {
    fn delay_us(&mut self, us: u32) {
        block_for(Duration::from_micros(us as u64));
    }
}
