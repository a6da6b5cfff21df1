//! GPIO pin abstractions
//!
//! Only what a bit-banged serial line or a chip-select/data-ready signal
//! needs: drive a level, sample a level.

/// Digital output pin
pub trait OutputPin {
    /// Drive the pin high (logic 1, serial idle/mark)
    fn set_high(&mut self);

    /// Drive the pin low (logic 0, serial start bit/space)
    fn set_low(&mut self);

    /// Drive the pin to a specific level
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }
}

/// Digital input pin
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&mut self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&mut self) -> bool {
        !self.is_high()
    }
}

/// Input that always reads high
///
/// Stands in for an optional data-ready line that a board does not wire:
/// the peer is then treated as permanently ready.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysHigh;

impl InputPin for AlwaysHigh {
    fn is_high(&mut self) -> bool {
        true
    }
}
