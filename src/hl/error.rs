use core::fmt;

use embedded_hal::{blocking::spi, digital::v2::OutputPin};

use crate::ll;

/// An error that can occur when interacting with the MAX30009
pub enum Error<SPI, CS>
where
    SPI: spi::Transfer<u8>,
    CS: OutputPin,
{
    /// Error occurred while using the SPI bus
    Spi(ll::Error<SPI, CS>),

    /// No divider configuration can produce the requested drive frequency
    NoClockSolution,

    /// The requested drive frequency is outside the chip's supported range
    DriveFrequencyOutOfRange,
}

impl<SPI, CS> From<ll::Error<SPI, CS>> for Error<SPI, CS>
where
    SPI: spi::Transfer<u8>,
    CS: OutputPin,
{
    fn from(error: ll::Error<SPI, CS>) -> Self {
        Error::Spi(error)
    }
}

// We can't derive `Debug` with `#[derive(Debug)]`, as that will only work if
// all type parameters implement it, which we don't know.
impl<SPI, CS> fmt::Debug for Error<SPI, CS>
where
    SPI: spi::Transfer<u8>,
    <SPI as spi::Transfer<u8>>::Error: fmt::Debug,
    CS: OutputPin,
    <CS as OutputPin>::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Spi(error) => write!(f, "Spi({:?})", error),
            Error::NoClockSolution => write!(f, "NoClockSolution"),
            Error::DriveFrequencyOutOfRange => write!(f, "DriveFrequencyOutOfRange"),
        }
    }
}
