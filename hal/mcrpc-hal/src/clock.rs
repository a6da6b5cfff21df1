//! Time abstractions
//!
//! Transport adapters turn a relative timeout into an absolute [`Deadline`]
//! on a monotonic [`Clock`], then poll their bus until the deadline passes.

/// Monotonic millisecond clock
///
/// The value must never go backwards. Wrapping is not handled: a `u64`
/// millisecond counter outlives the hardware.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed epoch (usually boot)
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Busy-wait delay with microsecond resolution
///
/// Used for bit timing on software serial links, where yielding to a
/// scheduler would destroy the waveform.
pub trait DelayUs {
    /// Spin for at least `us` microseconds
    fn delay_us(&mut self, us: u32);
}

/// An absolute point in time after which an operation gives up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Deadline {
    at_ms: u64,
}

impl Deadline {
    /// Deadline `timeout_ms` from now on `clock`
    pub fn after<C: Clock + ?Sized>(clock: &C, timeout_ms: u32) -> Self {
        Self {
            at_ms: clock.now_ms().saturating_add(timeout_ms as u64),
        }
    }

    /// Check whether the deadline has passed
    ///
    /// A zero timeout yields a deadline that is already expired, so a
    /// poll loop still gets exactly one attempt before giving up.
    pub fn expired<C: Clock + ?Sized>(&self, clock: &C) -> bool {
        clock.now_ms() >= self.at_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct FakeClock(Cell<u64>);

    impl Clock for FakeClock {
        fn now_ms(&self) -> u64 {
            self.0.get()
        }
    }

    #[test]
    fn test_deadline_expiry() {
        let clock = FakeClock(Cell::new(1_000));
        let deadline = Deadline::after(&clock, 50);

        assert!(!deadline.expired(&clock));

        clock.0.set(1_049);
        assert!(!deadline.expired(&clock));

        clock.0.set(1_050);
        assert!(deadline.expired(&clock));
    }

    #[test]
    fn test_zero_timeout_is_already_expired() {
        let clock = FakeClock(Cell::new(7));
        assert!(Deadline::after(&clock, 0).expired(&clock));
    }

    #[test]
    fn test_deadline_saturates() {
        let clock = FakeClock(Cell::new(u64::MAX - 1));
        let deadline = Deadline::after(&clock, 10);
        assert!(!deadline.expired(&clock));
    }
}
