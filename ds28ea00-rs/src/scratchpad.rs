//! Scratchpad read with CRC verdict.

use core::fmt;

use log::{debug, warn};
use onewire_bus::{OneWire, OneWireCrc, OneWireResult, Slave};

use crate::Command;

/// Outcome of the CRC check on a scratchpad read.
///
/// A mismatch is not an error: the bytes are still handed back, tagged [`CrcVerdict::Invalid`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CrcVerdict {
    /// The check byte matches the payload.
    Valid,
    /// The check byte does not match the payload.
    Invalid,
    /// Only the payload was read; there was no check byte to compare.
    NotChecked,
}

impl CrcVerdict {
    /// `Some(true)`/`Some(false)` for a checked read, `None` when no check was made.
    pub fn checked(self) -> Option<bool> {
        match self {
            CrcVerdict::Valid => Some(true),
            CrcVerdict::Invalid => Some(false),
            CrcVerdict::NotChecked => None,
        }
    }
}

/// Scratchpad contents as read from the device, in wire order.
///
/// | Byte | Content |
/// |------|---------|
/// | 0 | Temperature LSB |
/// | 1 | Temperature MSB |
/// | 2 | T<sub>H</sub> alarm / user byte 1 |
/// | 3 | T<sub>L</sub> alarm / user byte 2 |
/// | 4 | Configuration register |
/// | 5-7 | Reserved |
/// | 8 | CRC-8 of bytes 0-7, if it was read |
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Scratchpad {
    payload: [u8; 8],
    check: Option<u8>,
}

impl Scratchpad {
    /// Scratchpad of 8 payload bytes and the device-supplied check byte.
    pub fn new(payload: [u8; 8], check: u8) -> Self {
        Self {
            payload,
            check: Some(check),
        }
    }

    /// Scratchpad read without its check byte.
    pub fn unchecked(payload: [u8; 8]) -> Self {
        Self {
            payload,
            check: None,
        }
    }

    pub(crate) fn from_bytes(bytes: [u8; 9]) -> Self {
        let mut payload = [0; 8];
        payload.copy_from_slice(&bytes[..8]);
        Self::new(payload, bytes[8])
    }

    /// Bytes 0 through 7.
    pub fn payload(&self) -> &[u8; 8] {
        &self.payload
    }

    /// Byte 8 as sent by the device, if it was read.
    pub fn check_byte(&self) -> Option<u8> {
        self.check
    }

    /// CRC-8 computed locally over the payload.
    pub fn computed_crc(&self) -> u8 {
        OneWireCrc::compute(&self.payload)
    }

    /// Result of comparing [`Scratchpad::check_byte`] against [`Scratchpad::computed_crc`].
    pub fn verdict(&self) -> CrcVerdict {
        match self.check {
            None => CrcVerdict::NotChecked,
            Some(check) if OneWireCrc::validate(&self.payload, check) => CrcVerdict::Valid,
            Some(_) => CrcVerdict::Invalid,
        }
    }

    /// Shorthand for `verdict() == CrcVerdict::Valid`.
    pub fn is_valid(&self) -> bool {
        self.verdict() == CrcVerdict::Valid
    }

    /// Temperature register, LSB then MSB.
    pub fn temperature_bytes(&self) -> [u8; 2] {
        [self.payload[0], self.payload[1]]
    }

    /// Configuration register (byte 4).
    pub fn configuration(&self) -> u8 {
        self.payload[4]
    }
}

impl fmt::Display for Scratchpad {
    /// Space separated lowercase hex, `--` for a missing check byte.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.payload.iter() {
            write!(f, "{b:02x} ")?;
        }
        match self.check {
            Some(b) => write!(f, "{b:02x}"),
            None => f.write_str("--"),
        }
    }
}

/// Reads and checks the scratchpad of `slave`.
///
/// One transaction: select, Read Scratchpad, 9 bytes back. All 9 bytes are returned
/// whatever the CRC says; see [`Scratchpad::verdict`].
pub fn read<T: OneWire>(slave: &Slave<'_, T>) -> OneWireResult<Scratchpad, T::BusError> {
    let mut buf = [0u8; 9];
    slave.run(|txn| {
        txn.write(&[Command::ReadScratchpad.op_code()])?;
        txn.read(&mut buf)
    })?;
    let scratchpad = Scratchpad::from_bytes(buf);
    if scratchpad.is_valid() {
        debug!("{}: scratchpad {}", slave.name(), scratchpad);
    } else {
        warn!(
            "{}: scratchpad crc mismatch, computed {:02x}: {}",
            slave.name(),
            scratchpad.computed_crc(),
            scratchpad
        );
    }
    Ok(scratchpad)
}
