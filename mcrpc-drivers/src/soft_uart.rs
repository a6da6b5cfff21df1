//! Bit-banged serial port (8N1)
//!
//! For boards without a spare UART. Timing comes from busy-wait delays, so
//! the receiver must be polled often enough to catch the falling edge of a
//! start bit; at 9600 baud that is roughly every 50 µs.
//!
//! ```text
//! idle ─┐     ┌──┐  ┌──      ──┐  ┌────── idle
//!       │start│b0│b1│  ...     │b7│stop
//!       └─────┘  └──┘          └──┘
//! ```

use mcrpc_hal::uart::UartConfig;
use mcrpc_hal::{DelayUs, InputPin, OutputPin, UartRx, UartTx};

/// Receive failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SoftSerialError {
    /// Stop bit was not high
    Framing,
}

/// Serial port on two GPIO pins
pub struct SoftSerial<TX, RX, D> {
    tx: TX,
    rx: RX,
    delay: D,
    bit_us: u32,
}

impl<TX: OutputPin, RX: InputPin, D: DelayUs> SoftSerial<TX, RX, D> {
    /// Create the port and drive TX to idle
    pub fn new(mut tx: TX, rx: RX, delay: D, config: UartConfig) -> Self {
        tx.set_high();
        Self {
            tx,
            rx,
            delay,
            bit_us: config.bit_time_us(),
        }
    }

    /// Duration of one bit in microseconds
    pub fn bit_time_us(&self) -> u32 {
        self.bit_us
    }

    pub fn release(self) -> (TX, RX, D) {
        (self.tx, self.rx, self.delay)
    }

    fn send_byte(&mut self, byte: u8) {
        self.tx.set_low();
        self.delay.delay_us(self.bit_us);
        for bit in 0..8 {
            self.tx.set_state(byte & (1 << bit) != 0);
            self.delay.delay_us(self.bit_us);
        }
        self.tx.set_high();
        self.delay.delay_us(self.bit_us);
    }
}

impl<TX: OutputPin, RX: InputPin, D: DelayUs> UartTx for SoftSerial<TX, RX, D> {
    type Error = SoftSerialError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), SoftSerialError> {
        for &byte in data {
            self.send_byte(byte);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SoftSerialError> {
        Ok(())
    }
}

impl<TX: OutputPin, RX: InputPin, D: DelayUs> UartRx for SoftSerial<TX, RX, D> {
    type Error = SoftSerialError;

    fn try_read_byte(&mut self) -> Result<Option<u8>, SoftSerialError> {
        if self.rx.is_high() {
            return Ok(None);
        }

        // Sample in the middle of each bit
        self.delay.delay_us(self.bit_us / 2);
        if self.rx.is_high() {
            // Glitch, not a start bit
            return Ok(None);
        }

        let mut byte = 0u8;
        for bit in 0..8 {
            self.delay.delay_us(self.bit_us);
            if self.rx.is_high() {
                byte |= 1 << bit;
            }
        }

        self.delay.delay_us(self.bit_us);
        if self.rx.is_low() {
            return Err(SoftSerialError::Framing);
        }
        Ok(Some(byte))
    }
}
