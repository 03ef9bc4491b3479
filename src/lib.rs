//! Driver crate for the MAX30009 bioimpedance analog front-end
//!
//! The MAX30009 measures bioimpedance by driving a programmable sinusoidal
//! stimulus through a pair of electrodes and synchronously demodulating the
//! response into in-phase and quadrature channels. This crate talks to the
//! chip over SPI and is built on top of [embedded-hal], so it works on any
//! platform with an implementation of its blocking SPI and GPIO traits.
//!
//! The main components of this crate are:
//!
//! - [`MAX30009`]: The high-level driver. Owns the decoded view of the chip's
//!   clock tree, measurement path and input multiplexer, solves the clock
//!   dividers for a requested drive frequency, drains and converts the sample
//!   queue, and runs the vector calibration procedure.
//! - [`ll::MAX30009`]: The low-level register interface. Verified register
//!   transactions with typed field access and host-side shadows of every
//!   register.
//! - [`configs`]: The vocabulary of chip configuration: stimulus amplitudes,
//!   filters, gains, electrode assignments and the like.
//!
//! [embedded-hal]: https://crates.io/crates/embedded-hal
//!
//! # Example
//!
//! ```no_run
//! # fn example<SPI, CS>(spi: SPI, chip_select: CS)
//! # -> Result<(), max30009::Error<SPI, CS>>
//! # where
//! #     SPI: embedded_hal::blocking::spi::Transfer<u8>,
//! #     CS: embedded_hal::digital::v2::OutputPin,
//! # {
//! use max30009::{configs::CurrentAmplitude, MAX30009};
//!
//! let mut bioz = MAX30009::new(spi, chip_select);
//!
//! // 1 kHz stimulus, aiming for 100 samples per second. Frequencies are in
//! // tenths of hertz.
//! bioz.set_drive_frequency(10_000, 1_000)?;
//! bioz.set_constant_current_mode(CurrentAmplitude::Amp64uA)?;
//! bioz.set_i_channel(true)?;
//! bioz.set_q_channel(true)?;
//! bioz.set_pll_enable(true)?;
//!
//! let (i, q) = bioz.read_sample_pair()?;
//! # let _ = (i, q);
//! # Ok(())
//! # }
//! ```

#![no_std]

pub mod clock;
pub mod configs;
pub mod fifo;
pub mod hl;
pub mod ll;

pub use crate::hl::{
    BiozState, CalibSource, CalibState, CalibratedImpedance, CalibrationRecord, Error,
    FifoAverage, MuxState, Status, SystemClocks, MAX30009,
};
