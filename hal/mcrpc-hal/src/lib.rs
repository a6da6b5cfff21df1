//! mcrpc Hardware Abstraction Layer
//!
//! This crate defines the small bus and time traits that the transport
//! adapters in `mcrpc-drivers` are written against. A chip HAL implements
//! these (or wraps its `embedded-hal` / `embedded-io` drivers with the
//! adapters in [`bridge`]) and gets every mcrpc transport for free.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  mcrpc-core (master / slave engines)    │
//! └─────────────────────────────────────────┘
//!                     │  Transport
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  mcrpc-drivers (I2C/UART/SPI adapters)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  mcrpc-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!            chip-specific HAL
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O for bit-banged links
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial communication
//! - [`i2c::I2cBus`], [`i2c::I2cTarget`] - I2C controller and target roles
//! - [`spi::SpiBus`], [`spi::SpiTarget`] - SPI controller and target roles
//! - [`clock::Clock`], [`clock::DelayUs`] - Deadlines and bit timing

#![no_std]
#![deny(unsafe_code)]

pub mod bridge;
pub mod clock;
pub mod gpio;
pub mod i2c;
pub mod spi;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use clock::{Clock, Deadline, DelayUs};
pub use gpio::{InputPin, OutputPin};
pub use i2c::{I2cBus, I2cTarget, TargetEvent};
pub use spi::{SpiBus, SpiTarget};
pub use uart::{UartRx, UartTx};
