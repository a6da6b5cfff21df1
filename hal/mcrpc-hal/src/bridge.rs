//! Adapters from the `embedded-hal` and `embedded-io` ecosystems
//!
//! Chip HALs almost always implement the `embedded-hal` 1.0 traits already.
//! Wrapping a driver in one of these newtypes makes it usable by the
//! mcrpc transport adapters without writing any glue.
//!
//! ```ignore
//! let bus = EhI2c(embassy_rp::i2c::I2c::new_blocking(p.I2C0, scl, sda, cfg));
//! let link = I2cMaster::new(bus, clock);
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital;
use embedded_hal::i2c::I2c;
use embedded_io::{ErrorType, Read, ReadReady, Write};

use crate::clock::DelayUs;
use crate::gpio::{InputPin, OutputPin};
use crate::i2c::I2cBus;
use crate::spi::SpiBus;
use crate::uart::{UartRx, UartTx};

/// `embedded_hal::i2c::I2c` as an [`I2cBus`]
#[derive(Debug)]
pub struct EhI2c<T>(pub T);

impl<T: I2c> I2cBus for EhI2c<T> {
    type Error = T::Error;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.0.write(address, data)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.0.read(address, buf)
    }
}

/// `embedded_hal::spi::SpiBus` as an [`SpiBus`]
#[derive(Debug)]
pub struct EhSpi<T>(pub T);

impl<T: embedded_hal::spi::SpiBus> SpiBus for EhSpi<T> {
    type Error = T::Error;

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.0.write(data)?;
        self.0.flush()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.0.read(buf)?;
        self.0.flush()
    }
}

/// `embedded_hal::digital::OutputPin` as an [`OutputPin`]
///
/// GPIO writes on every mainstream HAL are infallible; errors are dropped.
#[derive(Debug)]
pub struct EhOutput<T>(pub T);

impl<T: digital::OutputPin> OutputPin for EhOutput<T> {
    fn set_high(&mut self) {
        let _ = self.0.set_high();
    }

    fn set_low(&mut self) {
        let _ = self.0.set_low();
    }
}

/// `embedded_hal::digital::InputPin` as an [`InputPin`]
///
/// A failed read reports high, the idle level of a serial line.
#[derive(Debug)]
pub struct EhInput<T>(pub T);

impl<T: digital::InputPin> InputPin for EhInput<T> {
    fn is_high(&mut self) -> bool {
        self.0.is_high().unwrap_or(true)
    }
}

/// `embedded_hal::delay::DelayNs` as a [`DelayUs`]
#[derive(Debug)]
pub struct EhDelay<T>(pub T);

impl<T: DelayNs> DelayUs for EhDelay<T> {
    fn delay_us(&mut self, us: u32) {
        self.0.delay_us(us);
    }
}

/// `embedded_io` serial port as a [`UartTx`] + [`UartRx`]
///
/// `ReadReady` keeps receive non-blocking: a byte is only read once the
/// driver reports one waiting.
#[derive(Debug)]
pub struct IoUart<T>(pub T);

impl<T: Write> UartTx for IoUart<T> {
    type Error = <T as ErrorType>::Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.0.write_all(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.flush()
    }
}

impl<T: Read + ReadReady> UartRx for IoUart<T> {
    type Error = <T as ErrorType>::Error;

    fn try_read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        if !self.0.read_ready()? {
            return Ok(None);
        }
        let mut byte = [0u8; 1];
        match self.0.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }
}
