//! Serial transport
//!
//! Works over anything that implements the HAL's [`UartTx`] and
//! [`UartRx`], hardware peripheral or [`SoftSerial`](crate::soft_uart::SoftSerial).
//! Writes block until the bytes are out; reads poll the receiver byte by
//! byte against the deadline.

use heapless::Deque;
use mcrpc_hal::{Clock, Deadline, UartRx, UartTx};
use mcrpc_protocol::{Transport, TransportError, MAX_FRAME_SIZE};

/// Bytes dropped per `discard_input` call at most
const DISCARD_LIMIT: usize = 1024;

/// Point-to-point serial link, either role
///
/// Bytes collected by a read that times out are held in a stash of `N`
/// bytes and handed out first by the next read.
pub struct UartTransport<U, C, const N: usize = MAX_FRAME_SIZE> {
    uart: U,
    clock: C,
    pending: Deque<u8, N>,
}

impl<U, C> UartTransport<U, C>
where
    U: UartTx + UartRx,
    C: Clock,
{
    pub fn new(uart: U, clock: C) -> Self {
        Self::with_stash(uart, clock)
    }
}

impl<U, C, const N: usize> UartTransport<U, C, N>
where
    U: UartTx + UartRx,
    C: Clock,
{
    /// Serial link whose stash holds `N` bytes
    ///
    /// `N` must cover the longest single read, i.e. the largest payload
    /// the node receives.
    pub fn with_stash(uart: U, clock: C) -> Self {
        Self {
            uart,
            clock,
            pending: Deque::new(),
        }
    }

    /// Give back the UART and clock
    pub fn release(self) -> (U, C) {
        (self.uart, self.clock)
    }

    fn next_byte(&mut self) -> Result<Option<u8>, TransportError> {
        if let Some(byte) = self.pending.pop_front() {
            return Ok(Some(byte));
        }
        self.uart.try_read_byte().map_err(|_| TransportError::Bus)
    }

    /// Put a partial read back in front of the stash
    fn stash(&mut self, bytes: &[u8]) {
        if bytes.len() > self.pending.capacity() - self.pending.len() {
            return;
        }
        for &byte in bytes.iter().rev() {
            let _ = self.pending.push_front(byte);
        }
    }
}

impl<U, C, const N: usize> Transport for UartTransport<U, C, N>
where
    U: UartTx + UartRx,
    C: Clock,
{
    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<(), TransportError> {
        let deadline = Deadline::after(&self.clock, timeout_ms);
        let mut filled = 0;
        while filled < buf.len() {
            match self.next_byte()? {
                Some(byte) => {
                    buf[filled] = byte;
                    filled += 1;
                }
                None if deadline.expired(&self.clock) => {
                    self.stash(&buf[..filled]);
                    return Err(TransportError::Timeout);
                }
                None => {}
            }
        }
        Ok(())
    }

    fn write(&mut self, data: &[u8], _timeout_ms: u32) -> Result<(), TransportError> {
        self.uart
            .write_blocking(data)
            .and_then(|()| self.uart.flush())
            .map_err(|_| TransportError::Bus)
    }

    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn discard_input(&mut self) {
        self.pending.clear();
        for _ in 0..DISCARD_LIMIT {
            match self.uart.try_read_byte() {
                Ok(Some(_)) => {}
                _ => break,
            }
        }
    }
}
