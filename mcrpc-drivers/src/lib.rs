//! Transport adapters
//!
//! This crate implements [`mcrpc_protocol::Transport`] on top of the bus
//! traits in `mcrpc-hal`:
//!
//! - I2C master and slave (chunked, default slave address `0x12`)
//! - Hardware serial
//! - Bit-banged serial on two GPIO pins
//! - SPI master (with optional data-ready line) and slave
//! - `embassy-time` clock and delay (`embassy` feature)

#![no_std]
#![deny(unsafe_code)]

#[cfg(feature = "embassy")]
pub mod clock;
pub mod i2c;
pub mod soft_uart;
pub mod spi;
pub mod uart;

#[cfg(test)]
mod testing;

#[cfg(feature = "embassy")]
pub use clock::{EmbassyClock, EmbassyDelay};
pub use i2c::{I2cMaster, I2cSlave, DEFAULT_ADDRESS, I2C_CHUNK};
pub use soft_uart::{SoftSerial, SoftSerialError};
pub use spi::{SpiMaster, SpiSlave};
pub use uart::UartTransport;
