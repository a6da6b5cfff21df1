//! In-memory link for host tests
//!
//! [`duplex`] returns two connected [`Endpoint`]s. Bytes written on one
//! side queue up for the other. Reads block on a condition variable until
//! enough bytes arrive or the timeout passes, so a master and a slave can
//! run on separate threads exactly as they would on two chips.
//!
//! Fault injection (bit flips, failing writes) exercises the error paths.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};
use std::vec::Vec;

use crate::error::TransportError;
use crate::transport::Transport;

#[derive(Default)]
struct Pipe {
    bytes: Mutex<VecDeque<u8>>,
    ready: Condvar,
}

impl Pipe {
    fn push(&self, data: &[u8]) {
        if let Ok(mut bytes) = self.bytes.lock() {
            bytes.extend(data.iter().copied());
            self.ready.notify_all();
        }
    }

    fn len(&self) -> usize {
        self.bytes.lock().map(|b| b.len()).unwrap_or(0)
    }

    fn clear(&self) {
        if let Ok(mut bytes) = self.bytes.lock() {
            bytes.clear();
        }
    }
}

/// One end of an in-memory link
pub struct Endpoint {
    rx: Arc<Pipe>,
    tx: Arc<Pipe>,
    segments: Vec<usize>,
    written: usize,
    write_fault: Option<TransportError>,
    corrupt: Option<(usize, u8)>,
    epoch: Instant,
}

/// Create two connected endpoints
pub fn duplex() -> (Endpoint, Endpoint) {
    let a_to_b = Arc::new(Pipe::default());
    let b_to_a = Arc::new(Pipe::default());

    let a = Endpoint::new(b_to_a.clone(), a_to_b.clone());
    let b = Endpoint::new(a_to_b, b_to_a);
    (a, b)
}

impl Endpoint {
    fn new(rx: Arc<Pipe>, tx: Arc<Pipe>) -> Self {
        Self {
            rx,
            tx,
            segments: Vec::new(),
            written: 0,
            write_fault: None,
            corrupt: None,
            epoch: Instant::now(),
        }
    }

    /// Bytes waiting to be read on this endpoint
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Queue raw bytes as if the peer had sent them
    pub fn inject(&self, bytes: &[u8]) {
        self.rx.push(bytes);
    }

    /// Sizes of every write issued so far, in order
    pub fn segments_written(&self) -> Vec<usize> {
        self.segments.clone()
    }

    /// Make every subsequent write fail with `error`
    pub fn fail_writes(&mut self, error: TransportError) {
        self.write_fault = Some(error);
    }

    /// XOR `mask` into the outgoing byte `offset` bytes from now
    pub fn corrupt_outgoing(&mut self, offset: usize, mask: u8) {
        self.corrupt = Some((self.written + offset, mask));
    }
}

impl Transport for Endpoint {
    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<(), TransportError> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms as u64);
        let mut bytes = self.rx.bytes.lock().map_err(|_| TransportError::Bus)?;

        loop {
            let wanted = buf.len();
            if bytes.len() >= wanted {
                for (slot, byte) in buf.iter_mut().zip(bytes.drain(..wanted)) {
                    *slot = byte;
                }
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(TransportError::Timeout);
            }
            let (guard, _) = self
                .rx
                .ready
                .wait_timeout(bytes, deadline - now)
                .map_err(|_| TransportError::Bus)?;
            bytes = guard;
        }
    }

    fn write(&mut self, data: &[u8], _timeout_ms: u32) -> Result<(), TransportError> {
        if let Some(error) = self.write_fault {
            return Err(error);
        }

        let mut out = data.to_vec();
        if let Some((at, mask)) = self.corrupt {
            if at >= self.written && at < self.written + out.len() {
                out[at - self.written] ^= mask;
                self.corrupt = None;
            }
        }

        self.segments.push(data.len());
        self.written += data.len();
        self.tx.push(&out);
        Ok(())
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn discard_input(&mut self) {
        self.rx.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_cross_the_link() {
        let (mut a, mut b) = duplex();
        a.write(&[1, 2, 3], 0).unwrap();
        assert_eq!(b.pending(), 3);
        assert_eq!(a.pending(), 0);

        let mut buf = [0u8; 2];
        b.read(&mut buf, 0).unwrap();
        assert_eq!(buf, [1, 2]);
        assert_eq!(b.pending(), 1);
    }

    #[test]
    fn test_short_read_times_out_without_consuming() {
        let (mut a, mut b) = duplex();
        a.write(&[7], 0).unwrap();

        let mut buf = [0u8; 2];
        assert_eq!(b.read(&mut buf, 5), Err(TransportError::Timeout));
        assert_eq!(b.pending(), 1);
    }

    #[test]
    fn test_read_waits_for_other_thread() {
        let (mut a, mut b) = duplex();
        let writer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            a.write(&[0xAA, 0xBB], 0).unwrap();
        });

        let mut buf = [0u8; 2];
        b.read(&mut buf, 1_000).unwrap();
        assert_eq!(buf, [0xAA, 0xBB]);
        writer.join().unwrap();
    }

    #[test]
    fn test_corrupt_outgoing_flips_one_byte() {
        let (mut a, mut b) = duplex();
        a.write(&[0x00, 0x00], 0).unwrap();
        a.corrupt_outgoing(3, 0x01);
        a.write(&[0x00, 0x00], 0).unwrap();
        a.write(&[0x00, 0x00], 0).unwrap();

        let mut buf = [0u8; 6];
        b.read(&mut buf, 0).unwrap();
        assert_eq!(buf, [0, 0, 0, 0, 0, 0x01]);
    }

    #[test]
    fn test_discard_input() {
        let (mut a, mut b) = duplex();
        a.write(&[1, 2, 3], 0).unwrap();
        b.discard_input();
        assert_eq!(b.pending(), 0);
    }
}
