//! I2C transports
//!
//! The master addresses the slave and moves bytes in chunks of at most
//! [`I2C_CHUNK`], the usual size of a peripheral's transfer buffer. The
//! slave cannot push data: every segment it writes waits for the master
//! to clock a read. Since both ends move frames in the same segments and
//! chunk them the same way, each master read meets one slave response of
//! exactly the size it asked for.

use heapless::Deque;
use mcrpc_hal::{Clock, Deadline, I2cBus, I2cTarget, TargetEvent};
use mcrpc_protocol::{Transport, TransportError, MAX_FRAME_SIZE};

/// Default 7-bit address of the slave
pub const DEFAULT_ADDRESS: u8 = 0x12;

/// Largest single I2C transfer
pub const I2C_CHUNK: usize = 32;

/// Controller side of an I2C link
///
/// Chunks completed by a read that times out are kept and handed out
/// first by the next read.
pub struct I2cMaster<B, C> {
    bus: B,
    clock: C,
    address: u8,
    pending: Deque<u8, MAX_FRAME_SIZE>,
}

impl<B: I2cBus, C: Clock> I2cMaster<B, C> {
    /// Talk to a slave at [`DEFAULT_ADDRESS`]
    pub fn new(bus: B, clock: C) -> Self {
        Self::with_address(bus, clock, DEFAULT_ADDRESS)
    }

    pub fn with_address(bus: B, clock: C, address: u8) -> Self {
        Self {
            bus,
            clock,
            address,
            pending: Deque::new(),
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Give back the bus and clock
    pub fn release(self) -> (B, C) {
        (self.bus, self.clock)
    }

    /// Put the completed chunks of a partial read back in front
    fn stash(&mut self, bytes: &[u8]) {
        if bytes.len() > self.pending.capacity() - self.pending.len() {
            return;
        }
        for &byte in bytes.iter().rev() {
            let _ = self.pending.push_front(byte);
        }
    }
}

impl<B: I2cBus, C: Clock> Transport for I2cMaster<B, C> {
    /// Any failed transfer counts as a NACK from a slave that is not ready
    /// yet and is retried until the deadline.
    fn write(&mut self, data: &[u8], timeout_ms: u32) -> Result<(), TransportError> {
        let deadline = Deadline::after(&self.clock, timeout_ms);
        for chunk in data.chunks(I2C_CHUNK) {
            while self.bus.write(self.address, chunk).is_err() {
                if deadline.expired(&self.clock) {
                    return Err(TransportError::Timeout);
                }
            }
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<(), TransportError> {
        let deadline = Deadline::after(&self.clock, timeout_ms);
        let mut filled = 0;
        while filled < buf.len() {
            match self.pending.pop_front() {
                Some(byte) => {
                    buf[filled] = byte;
                    filled += 1;
                }
                None => break,
            }
        }

        while filled < buf.len() {
            let end = (filled + I2C_CHUNK).min(buf.len());
            while self.bus.read(self.address, &mut buf[filled..end]).is_err() {
                if deadline.expired(&self.clock) {
                    self.stash(&buf[..filled]);
                    return Err(TransportError::Timeout);
                }
            }
            filled = end;
        }
        Ok(())
    }

    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn discard_input(&mut self) {
        self.pending.clear();
    }
}

/// Target side of an I2C link
///
/// Bytes the controller writes are queued until a read asks for them;
/// `N` bounds that queue. Bytes that do not fit are dropped and surface
/// as a checksum failure further up.
pub struct I2cSlave<T, C, const N: usize = MAX_FRAME_SIZE> {
    target: T,
    clock: C,
    rx: Deque<u8, N>,
    scratch: [u8; I2C_CHUNK],
}

impl<T: I2cTarget, C: Clock, const N: usize> I2cSlave<T, C, N> {
    pub fn new(target: T, clock: C) -> Self {
        Self {
            target,
            clock,
            rx: Deque::new(),
            scratch: [0; I2C_CHUNK],
        }
    }

    /// Bytes received but not yet read
    pub fn buffered(&self) -> usize {
        self.rx.len()
    }

    /// Give back the target and clock
    pub fn release(self) -> (T, C) {
        (self.target, self.clock)
    }

    /// Take one event off the target, queueing written bytes
    fn service(&mut self) -> Result<Option<TargetEvent>, TransportError> {
        let event = self
            .target
            .poll(&mut self.scratch)
            .map_err(|_| TransportError::Bus)?;

        if let Some(TargetEvent::Written(n)) = event {
            for &byte in &self.scratch[..n.min(I2C_CHUNK)] {
                if self.rx.push_back(byte).is_err() {
                    break;
                }
            }
        }
        Ok(event)
    }

    /// Turn away a read request we have nothing for
    fn decline(&mut self) -> Result<(), TransportError> {
        self.target.respond(&[]).map_err(|_| TransportError::Bus)
    }
}

impl<T: I2cTarget, C: Clock, const N: usize> Transport for I2cSlave<T, C, N> {
    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<(), TransportError> {
        let deadline = Deadline::after(&self.clock, timeout_ms);
        loop {
            if self.rx.len() >= buf.len() {
                let rx = &mut self.rx;
                for (slot, byte) in buf.iter_mut().zip(core::iter::from_fn(|| rx.pop_front())) {
                    *slot = byte;
                }
                return Ok(());
            }

            match self.service()? {
                Some(TargetEvent::Written(_)) => continue,
                Some(TargetEvent::ReadRequested) => self.decline()?,
                None => {}
            }
            if deadline.expired(&self.clock) {
                return Err(TransportError::Timeout);
            }
        }
    }

    fn write(&mut self, data: &[u8], timeout_ms: u32) -> Result<(), TransportError> {
        let deadline = Deadline::after(&self.clock, timeout_ms);
        for chunk in data.chunks(I2C_CHUNK) {
            loop {
                match self.service()? {
                    Some(TargetEvent::ReadRequested) => {
                        self.target.respond(chunk).map_err(|_| TransportError::Bus)?;
                        break;
                    }
                    Some(TargetEvent::Written(_)) => continue,
                    None => {
                        if deadline.expired(&self.clock) {
                            return Err(TransportError::Timeout);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn discard_input(&mut self) {
        self.rx.clear();
        while let Ok(Some(event)) = self.target.poll(&mut self.scratch) {
            if event == TargetEvent::ReadRequested {
                let _ = self.decline();
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TickClock;
    use heapless::Vec;

    #[derive(Default)]
    struct MockBus {
        chunks: Vec<usize, 16>,
        written: Vec<u8, 256>,
        to_read: Deque<u8, 256>,
        nacks: usize,
        address: u8,
    }

    impl I2cBus for MockBus {
        type Error = ();

        fn write(&mut self, address: u8, data: &[u8]) -> Result<(), ()> {
            if self.nacks > 0 {
                self.nacks -= 1;
                return Err(());
            }
            self.address = address;
            self.chunks.push(data.len()).ok();
            self.written.extend_from_slice(data).ok();
            Ok(())
        }

        fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), ()> {
            if self.nacks > 0 {
                self.nacks -= 1;
                return Err(());
            }
            self.address = address;
            self.chunks.push(buf.len()).ok();
            for slot in buf.iter_mut() {
                *slot = self.to_read.pop_front().ok_or(())?;
            }
            Ok(())
        }
    }

    enum Script {
        Write(Vec<u8, I2C_CHUNK>),
        Read,
    }

    #[derive(Default)]
    struct MockTarget {
        script: Deque<Script, 16>,
        responses: Vec<Vec<u8, I2C_CHUNK>, 16>,
    }

    impl MockTarget {
        fn written(mut self, data: &[u8]) -> Self {
            let bytes = Vec::from_slice(data).unwrap();
            self.script.push_back(Script::Write(bytes)).ok().unwrap();
            self
        }

        fn read(mut self) -> Self {
            self.script.push_back(Script::Read).ok().unwrap();
            self
        }
    }

    impl I2cTarget for MockTarget {
        type Error = ();

        fn poll(&mut self, buf: &mut [u8]) -> Result<Option<TargetEvent>, ()> {
            Ok(match self.script.pop_front() {
                Some(Script::Write(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Some(TargetEvent::Written(bytes.len()))
                }
                Some(Script::Read) => Some(TargetEvent::ReadRequested),
                None => None,
            })
        }

        fn respond(&mut self, data: &[u8]) -> Result<(), ()> {
            self.responses.push(Vec::from_slice(data).unwrap()).ok().unwrap();
            Ok(())
        }
    }

    #[test]
    fn test_master_write_in_chunks() {
        let mut master = I2cMaster::new(MockBus::default(), TickClock::new());
        let data = [0x5A; 70];

        master.write(&data, 10).unwrap();

        let (bus, _) = master.release();
        assert_eq!(&bus.chunks[..], &[32, 32, 6]);
        assert_eq!(&bus.written[..], &data[..]);
        assert_eq!(bus.address, DEFAULT_ADDRESS);
    }

    #[test]
    fn test_master_retries_nack() {
        let bus = MockBus {
            nacks: 3,
            ..Default::default()
        };
        let mut master = I2cMaster::with_address(bus, TickClock::new(), 0x30);

        master.write(&[1, 2], 10).unwrap();

        let (bus, _) = master.release();
        assert_eq!(&bus.written[..], &[1, 2]);
        assert_eq!(bus.address, 0x30);
    }

    #[test]
    fn test_master_gives_up_at_deadline() {
        let bus = MockBus {
            nacks: usize::MAX,
            ..Default::default()
        };
        let mut master = I2cMaster::new(bus, TickClock::new());

        assert_eq!(master.write(&[1], 5), Err(TransportError::Timeout));
        let (_, clock) = master.release();
        assert!(clock.now() <= 10);
    }

    #[test]
    fn test_master_read_in_chunks() {
        let mut bus = MockBus::default();
        for i in 0..40u8 {
            bus.to_read.push_back(i).unwrap();
        }
        let mut master = I2cMaster::new(bus, TickClock::new());

        let mut buf = [0u8; 40];
        master.read(&mut buf, 10).unwrap();

        assert_eq!(buf[39], 39);
        let (bus, _) = master.release();
        assert_eq!(&bus.chunks[..], &[32, 8]);
    }

    #[test]
    fn test_master_read_timeout_keeps_chunks() {
        let mut bus = MockBus::default();
        for i in 0..32u8 {
            bus.to_read.push_back(i).unwrap();
        }
        let mut master = I2cMaster::new(bus, TickClock::new());

        let mut buf = [0u8; 40];
        assert_eq!(master.read(&mut buf, 5), Err(TransportError::Timeout));

        for i in 32..40u8 {
            master.bus.to_read.push_back(i).unwrap();
        }
        let mut buf = [0u8; 40];
        master.read(&mut buf, 5).unwrap();
        assert_eq!(buf[0], 0);
        assert_eq!(buf[31], 31);
        assert_eq!(buf[39], 39);
    }

    #[test]
    fn test_master_discard_input_drops_kept_chunks() {
        let mut bus = MockBus::default();
        for i in 0..32u8 {
            bus.to_read.push_back(i).unwrap();
        }
        let mut master = I2cMaster::new(bus, TickClock::new());

        let mut buf = [0u8; 40];
        assert_eq!(master.read(&mut buf, 5), Err(TransportError::Timeout));
        master.discard_input();

        let mut buf = [0u8; 1];
        assert_eq!(master.read(&mut buf, 5), Err(TransportError::Timeout));
    }

    #[test]
    fn test_slave_read_accumulates_writes() {
        let target = MockTarget::default().written(&[1, 2, 3]).written(&[4, 5]);
        let mut slave: I2cSlave<_, _> = I2cSlave::new(target, TickClock::new());

        let mut buf = [0u8; 4];
        slave.read(&mut buf, 10).unwrap();

        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(slave.buffered(), 1);
    }

    #[test]
    fn test_slave_read_timeout_keeps_queue() {
        let target = MockTarget::default().written(&[1, 2]);
        let mut slave: I2cSlave<_, _> = I2cSlave::new(target, TickClock::new());

        let mut buf = [0u8; 4];
        assert_eq!(slave.read(&mut buf, 3), Err(TransportError::Timeout));
        assert_eq!(slave.buffered(), 2);
    }

    #[test]
    fn test_slave_read_declines_early_read_request() {
        let target = MockTarget::default().read().written(&[9]);
        let mut slave: I2cSlave<_, _> = I2cSlave::new(target, TickClock::new());

        let mut buf = [0u8; 1];
        slave.read(&mut buf, 10).unwrap();

        let (target, _) = slave.release();
        assert_eq!(target.responses.len(), 1);
        assert!(target.responses[0].is_empty());
    }

    #[test]
    fn test_slave_write_answers_read_requests() {
        let target = MockTarget::default().written(&[7]).read().read();
        let mut slave: I2cSlave<_, _> = I2cSlave::new(target, TickClock::new());

        let data = [0xC3; 40];
        slave.write(&data, 10).unwrap();

        assert_eq!(slave.buffered(), 1);
        let (target, _) = slave.release();
        assert_eq!(target.responses.len(), 2);
        assert_eq!(target.responses[0].len(), 32);
        assert_eq!(target.responses[1].len(), 8);
    }

    #[test]
    fn test_slave_write_times_out_without_reader() {
        let mut slave: I2cSlave<_, _> = I2cSlave::new(MockTarget::default(), TickClock::new());
        assert_eq!(slave.write(&[1], 3), Err(TransportError::Timeout));
    }

    #[test]
    fn test_slave_discard_input() {
        let target = MockTarget::default().written(&[1, 2]).written(&[3]);
        let mut slave: I2cSlave<_, _> = I2cSlave::new(target, TickClock::new());

        let mut buf = [0u8; 1];
        slave.read(&mut buf, 10).unwrap();
        slave.discard_input();

        assert_eq!(slave.buffered(), 0);
        assert_eq!(slave.read(&mut buf, 2), Err(TransportError::Timeout));
    }
}
