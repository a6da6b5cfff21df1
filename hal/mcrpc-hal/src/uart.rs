//! UART serial communication abstractions
//!
//! Transmit is blocking (a UART always drains at line rate). Receive is
//! polled one byte at a time so the caller can enforce its own deadline.

/// UART transmitter
pub trait UartTx {
    /// Error type for transmit operations
    type Error;

    /// Write data to the UART
    ///
    /// Blocks until all data has been written or an error occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// UART receiver
pub trait UartRx {
    /// Error type for receive operations
    type Error;

    /// Take one received byte if one is waiting
    ///
    /// Returns `Ok(None)` immediately when nothing has arrived.
    fn try_read_byte(&mut self) -> Result<Option<u8>, Self::Error>;
}

/// Combined UART interface
///
/// For UARTs that provide both TX and RX on a single peripheral.
pub trait Uart: UartTx + UartRx {}

// Blanket implementation
impl<T: UartTx + UartRx> Uart for T {}

/// UART configuration
///
/// mcrpc links always run 8N1; only the rate is configurable.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self { baudrate: 115_200 }
    }
}

impl UartConfig {
    /// Duration of one bit on the line, rounded to whole microseconds
    pub fn bit_time_us(&self) -> u32 {
        let baud = self.baudrate.max(1);
        (1_000_000 + baud / 2) / baud
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_time() {
        assert_eq!(UartConfig { baudrate: 9_600 }.bit_time_us(), 104);
        assert_eq!(UartConfig { baudrate: 115_200 }.bit_time_us(), 9);
        assert_eq!(UartConfig { baudrate: 1_000_000 }.bit_time_us(), 1);
    }

    #[test]
    fn test_bit_time_zero_baud_does_not_divide_by_zero() {
        assert_eq!(UartConfig { baudrate: 0 }.bit_time_us(), 1_000_000);
    }
}
