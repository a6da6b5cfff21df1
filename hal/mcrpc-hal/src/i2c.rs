//! I2C bus abstractions
//!
//! The controller side ([`I2cBus`]) issues addressed transfers. The target
//! side ([`I2cTarget`]) is event driven: the peripheral reports what the
//! controller did and the service loop reacts.

/// I2C bus controller (master)
pub trait I2cBus {
    /// Error type for I2C operations
    type Error;

    /// Write data to a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Read data from a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `buf` - Buffer to read into
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error>;
}

/// What the controller did to us since the last poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TargetEvent {
    /// Controller wrote this many bytes into the poll buffer
    Written(usize),
    /// Controller is clocking a read and waits for [`I2cTarget::respond`]
    ReadRequested,
}

/// I2C bus target (slave)
///
/// Implementations typically sit on top of a receive/request interrupt that
/// latches one event at a time. `poll` must not block.
pub trait I2cTarget {
    /// Error type for I2C operations
    type Error;

    /// Fetch the next pending event, if any
    ///
    /// On [`TargetEvent::Written`], the received bytes have been copied into
    /// the front of `buf`. Bytes that do not fit are dropped by the
    /// implementation.
    fn poll(&mut self, buf: &mut [u8]) -> Result<Option<TargetEvent>, Self::Error>;

    /// Answer an outstanding read request with `data`
    fn respond(&mut self, data: &[u8]) -> Result<(), Self::Error>;
}
