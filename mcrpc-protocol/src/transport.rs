//! Byte transport capability
//!
//! The only thing the protocol needs from the physical link. Adapters for
//! I2C, UART, software serial and SPI live in `mcrpc-drivers`.

use crate::error::TransportError;

/// Timed byte transport
///
/// Both operations move exactly `buf.len()` bytes or fail. A read that
/// times out consumes nothing: bytes that did arrive stay queued for the
/// next read, so a frame reception can pick up where it stopped.
pub trait Transport {
    /// Fill `buf` completely within `timeout_ms`
    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<(), TransportError>;

    /// Send all of `data` within `timeout_ms`
    fn write(&mut self, data: &[u8], timeout_ms: u32) -> Result<(), TransportError>;

    /// Monotonic time in milliseconds
    ///
    /// Lets the codec hold a whole frame to one deadline.
    fn now_ms(&self) -> u64;

    /// Drop any bytes already received but not yet read
    ///
    /// Called before a new exchange so leftovers from an aborted one cannot
    /// be mistaken for its first frame. Buses without receive buffering
    /// have nothing to drop.
    fn discard_input(&mut self) {}
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<(), TransportError> {
        (**self).read(buf, timeout_ms)
    }

    fn write(&mut self, data: &[u8], timeout_ms: u32) -> Result<(), TransportError> {
        (**self).write(data, timeout_ms)
    }

    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn discard_input(&mut self) {
        (**self).discard_input()
    }
}

/// Time left until `deadline_ms`, as a read/write budget
pub fn remaining<T: Transport + ?Sized>(transport: &T, deadline_ms: u64) -> u32 {
    let left = deadline_ms.saturating_sub(transport.now_ms());
    left.min(u32::MAX as u64) as u32
}

/// Deadline `timeout_ms` from now on the transport's clock
pub fn deadline_after<T: Transport + ?Sized>(transport: &T, timeout_ms: u32) -> u64 {
    transport.now_ms().saturating_add(timeout_ms as u64)
}
