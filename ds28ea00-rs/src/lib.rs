#![deny(missing_docs)]
//! # DS28EA00
//!
//! Transaction engine for the DS28EA00 1-Wire digital thermometer with sequence detect
//! and PIO. Four device operations are provided, each run as one locked transaction on a
//! shared [`onewire_bus::Bus`]:
//!
//! - [`scratchpad::read`]: read and CRC-check the 9-byte scratchpad,
//! - [`thermal::measure`]: convert, wait, and read back the temperature,
//! - [`actuator::write`]: set the PIO output latches,
//! - [`actuator::read_status`]: read the PIO status byte.
//!
//! [`Ds28ea00`] bundles a slave with its conversion settings and exposes the same four
//! operations as methods.

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use onewire_bus::{OneWire, OneWireResult, Slave};

pub mod actuator;
mod commands;
pub mod scratchpad;
#[cfg(any(test, feature = "sim"))]
#[cfg_attr(docsrs, doc(cfg(feature = "sim")))]
pub mod sim;
pub mod thermal;

pub use actuator::{ActuatorFrame, PIO_WRITE_ACK, PioStatus};
pub use commands::Command;
pub use scratchpad::{CrcVerdict, Scratchpad};
pub use thermal::{Measurement, Temperature};

/// Conversion wait used unless configured otherwise: worst case at 12-bit resolution.
pub const DEFAULT_CONVERSION_LATENCY: Duration = Duration::from_millis(750);

/// A DS28EA00 on a shared bus, with its conversion settings.
#[derive(Debug)]
pub struct Ds28ea00<'a, T> {
    slave: Slave<'a, T>,
    latency: Duration,
    crc: bool,
}

impl<T> Clone for Ds28ea00<'_, T> {
    fn clone(&self) -> Self {
        Self {
            slave: self.slave,
            latency: self.latency,
            crc: self.crc,
        }
    }
}

impl<'a, T> Ds28ea00<'a, T> {
    /// 1-Wire family code of the DS28EA00.
    #[inline]
    pub const fn family() -> u8 {
        0x42
    }

    /// Driver for `slave` with a 750 ms conversion wait and CRC-checked conversion reads.
    pub fn new(slave: Slave<'a, T>) -> Self {
        Self {
            slave,
            latency: DEFAULT_CONVERSION_LATENCY,
            crc: true,
        }
    }

    /// Sets the conversion wait to the worst case for `resolution`.
    ///
    /// This only changes how long [`Ds28ea00::measure`] waits; the resolution configured
    /// in the device is not touched.
    pub fn with_resolution(mut self, resolution: ReadoutResolution) -> Self {
        self.latency = resolution.conversion_time();
        self
    }

    /// Sets the conversion wait.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Whether [`Ds28ea00::measure`] reads and checks the scratchpad CRC byte.
    pub fn with_crc(mut self, crc: bool) -> Self {
        self.crc = crc;
        self
    }

    /// The slave this driver talks to.
    pub fn slave(&self) -> &Slave<'a, T> {
        &self.slave
    }

    /// Configured conversion wait.
    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// Whether conversion reads check the CRC.
    pub fn crc(&self) -> bool {
        self.crc
    }
}

impl<T: OneWire> Ds28ea00<'_, T> {
    /// See [`scratchpad::read`].
    pub fn read_scratchpad(&self) -> OneWireResult<Scratchpad, T::BusError> {
        scratchpad::read(&self.slave)
    }

    /// Runs a conversion with the configured wait and CRC setting. See [`thermal::measure`].
    pub fn measure<D: DelayNs>(&self, delay: &mut D) -> OneWireResult<Measurement, T::BusError> {
        thermal::measure(&self.slave, self.latency, self.crc, delay)
    }

    /// See [`actuator::write`].
    pub fn write_pio(&self, value: u8) -> OneWireResult<u8, T::BusError> {
        actuator::write(&self.slave, value)
    }

    /// See [`actuator::read_status`].
    pub fn read_pio_status(&self) -> OneWireResult<u8, T::BusError> {
        actuator::read_status(&self.slave)
    }
}

/// Temperature resolution, as stored in the configuration register.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ReadoutResolution {
    /// 9 bits, 0.5 degree steps.
    Resolution9bit = 0x1f,
    /// 10 bits, 0.25 degree steps.
    Resolution10bit = 0x3f,
    /// 11 bits, 0.125 degree steps.
    Resolution11bit = 0x5f,
    /// 12 bits, 0.0625 degree steps.
    #[default]
    Resolution12bit = 0x7f,
}

impl ReadoutResolution {
    /// Maximum conversion time at this resolution.
    pub fn conversion_time(&self) -> Duration {
        use ReadoutResolution::*;
        Duration::from_micros(match self {
            Resolution9bit => 93750,
            Resolution10bit => 187500,
            Resolution11bit => 375000,
            Resolution12bit => 750000,
        })
    }

    /// Resolution in bits.
    pub fn bits(&self) -> u8 {
        use ReadoutResolution::*;
        match self {
            Resolution9bit => 9,
            Resolution10bit => 10,
            Resolution11bit => 11,
            Resolution12bit => 12,
        }
    }
}

impl TryFrom<u8> for ReadoutResolution {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use ReadoutResolution::*;
        match value {
            0x1f => Ok(Resolution9bit),
            0x3f => Ok(Resolution10bit),
            0x5f => Ok(Resolution11bit),
            0x7f => Ok(Resolution12bit),
            _ => Err("Invalid readout resolution"),
        }
    }
}
