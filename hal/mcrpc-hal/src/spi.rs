//! SPI bus abstractions
//!
//! The controller drives the clock; the target can only move bytes while
//! the controller holds it selected.

/// SPI bus controller (master)
pub trait SpiBus {
    /// Error type for SPI operations
    type Error;

    /// Write data, discarding whatever is clocked in
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Read data (clocks out filler bytes)
    fn read(&mut self, buf: &mut [u8]) -> Result<(), Self::Error>;
}

/// SPI bus target (slave)
pub trait SpiTarget {
    /// Error type for SPI operations
    type Error;

    /// Check whether the controller currently asserts our chip select
    fn is_selected(&mut self) -> bool;

    /// Exchange bytes with the controller in place
    ///
    /// The contents of `data` are shifted out while the incoming bytes
    /// overwrite them. Only valid while selected.
    fn transfer_in_place(&mut self, data: &mut [u8]) -> Result<(), Self::Error>;
}

/// SPI settings an mcrpc link depends on
///
/// Clock rate and mode belong to the bus setup, which the board does
/// before handing the bus over.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiConfig {
    /// Byte shifted out during reads
    pub filler: u8,
}
