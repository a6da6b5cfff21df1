//! SPI transports
//!
//! Each transport segment is one chip-select framed transaction. The
//! master owns the clock, so it cannot tell whether the slave has a reply
//! queued; boards that wire a data-ready line let the master wait on it
//! before clocking a read.

use mcrpc_hal::gpio::AlwaysHigh;
use mcrpc_hal::spi::SpiConfig;
use mcrpc_hal::{Clock, Deadline, InputPin, OutputPin, SpiBus, SpiTarget};
use mcrpc_protocol::{Transport, TransportError};

/// Bytes exchanged per target transfer when sending
const SPI_CHUNK: usize = 32;

/// Controller side of an SPI link
///
/// `CS` is active low. `R` is the optional data-ready input, high when the
/// slave has bytes to send.
pub struct SpiMaster<B, CS, C, R = AlwaysHigh> {
    bus: B,
    cs: CS,
    clock: C,
    ready: R,
}

impl<B: SpiBus, CS: OutputPin, C: Clock> SpiMaster<B, CS, C> {
    /// Master without a data-ready line
    pub fn new(bus: B, cs: CS, clock: C) -> Self {
        Self::with_ready(bus, cs, clock, AlwaysHigh)
    }
}

impl<B: SpiBus, CS: OutputPin, C: Clock, R: InputPin> SpiMaster<B, CS, C, R> {
    /// Master that waits for `ready` before reading
    pub fn with_ready(bus: B, mut cs: CS, clock: C, ready: R) -> Self {
        cs.set_high();
        Self {
            bus,
            cs,
            clock,
            ready,
        }
    }

    /// Give back the bus, chip select, clock and data-ready pin
    pub fn release(self) -> (B, CS, C, R) {
        (self.bus, self.cs, self.clock, self.ready)
    }

    fn wait_ready(&mut self, deadline: Deadline) -> Result<(), TransportError> {
        while self.ready.is_low() {
            if deadline.expired(&self.clock) {
                return Err(TransportError::Timeout);
            }
        }
        Ok(())
    }
}

impl<B: SpiBus, CS: OutputPin, C: Clock, R: InputPin> Transport for SpiMaster<B, CS, C, R> {
    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<(), TransportError> {
        let deadline = Deadline::after(&self.clock, timeout_ms);
        self.wait_ready(deadline)?;

        self.cs.set_low();
        let result = self.bus.read(buf);
        self.cs.set_high();
        result.map_err(|_| TransportError::Bus)
    }

    fn write(&mut self, data: &[u8], _timeout_ms: u32) -> Result<(), TransportError> {
        self.cs.set_low();
        let result = self.bus.write(data);
        self.cs.set_high();
        result.map_err(|_| TransportError::Bus)
    }

    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}

/// Target side of an SPI link
pub struct SpiSlave<S, C> {
    target: S,
    clock: C,
    filler: u8,
}

impl<S: SpiTarget, C: Clock> SpiSlave<S, C> {
    pub fn new(target: S, clock: C, config: &SpiConfig) -> Self {
        Self {
            target,
            clock,
            filler: config.filler,
        }
    }

    /// Give back the target and clock
    pub fn release(self) -> (S, C) {
        (self.target, self.clock)
    }

    fn wait_selected(&mut self, deadline: Deadline) -> Result<(), TransportError> {
        while !self.target.is_selected() {
            if deadline.expired(&self.clock) {
                return Err(TransportError::Timeout);
            }
        }
        Ok(())
    }
}

impl<S: SpiTarget, C: Clock> Transport for SpiSlave<S, C> {
    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<(), TransportError> {
        let deadline = Deadline::after(&self.clock, timeout_ms);
        self.wait_selected(deadline)?;

        buf.fill(self.filler);
        self.target
            .transfer_in_place(buf)
            .map_err(|_| TransportError::Bus)
    }

    fn write(&mut self, data: &[u8], timeout_ms: u32) -> Result<(), TransportError> {
        let deadline = Deadline::after(&self.clock, timeout_ms);
        self.wait_selected(deadline)?;

        let mut scratch = [0u8; SPI_CHUNK];
        for chunk in data.chunks(SPI_CHUNK) {
            let out = &mut scratch[..chunk.len()];
            out.copy_from_slice(chunk);
            self.target
                .transfer_in_place(out)
                .map_err(|_| TransportError::Bus)?;
        }
        Ok(())
    }

    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}
