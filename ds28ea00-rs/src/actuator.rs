//! PIO Access Write and PIO Access Read.

use log::{debug, warn};
use onewire_bus::{OneWire, OneWireResult, Slave};

use crate::Command;

/// Confirmation byte the device sends after a PIO Access Write it accepted.
pub const PIO_WRITE_ACK: u8 = 0xaa;

/// Outbound PIO Access Write frame: command, latch state, complement of the latch state.
///
/// The check byte is derived here and nowhere else.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ActuatorFrame([u8; 3]);

impl ActuatorFrame {
    /// Frame writing `value` to the PIO output latches.
    pub const fn new(value: u8) -> Self {
        Self([Command::PioAccessWrite.op_code(), value, !value])
    }

    /// Latch state carried by the frame.
    pub const fn value(&self) -> u8 {
        self.0[1]
    }

    /// Complement of [`ActuatorFrame::value`], sent after it.
    pub const fn check_byte(&self) -> u8 {
        self.0[2]
    }

    /// The frame in wire order.
    pub const fn as_bytes(&self) -> &[u8; 3] {
        &self.0
    }
}

/// PIO status byte as returned by PIO Access Read.
///
/// The low nibble holds pin and latch state of both channels; the high nibble repeats it
/// complemented.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PioStatus(pub u8);

impl PioStatus {
    /// Logic level sensed on PIO A.
    pub fn pio_a_pin(&self) -> bool {
        self.0 & 0x01 != 0
    }

    /// Output latch state of PIO A. `false` means the output transistor is on.
    pub fn pio_a_latch(&self) -> bool {
        self.0 & 0x02 != 0
    }

    /// Logic level sensed on PIO B.
    pub fn pio_b_pin(&self) -> bool {
        self.0 & 0x04 != 0
    }

    /// Output latch state of PIO B. `false` means the output transistor is on.
    pub fn pio_b_latch(&self) -> bool {
        self.0 & 0x08 != 0
    }

    /// Whether the high nibble is the complement of the low nibble.
    pub fn is_consistent(&self) -> bool {
        (self.0 >> 4) == (!self.0 & 0x0f)
    }
}

impl From<u8> for PioStatus {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

/// Writes `requested` to the PIO latches of `slave` and returns the confirmation byte.
///
/// One transaction: select, the three [`ActuatorFrame`] bytes, one byte back. The
/// confirmation is not compared against anything here; the caller decides what a
/// byte other than [`PIO_WRITE_ACK`] means.
pub fn write<T: OneWire>(slave: &Slave<'_, T>, requested: u8) -> OneWireResult<u8, T::BusError> {
    let frame = ActuatorFrame::new(requested);
    let mut confirm = [0u8; 1];
    slave.run(|txn| {
        txn.write(frame.as_bytes())?;
        txn.read(&mut confirm)
    })?;
    if confirm[0] != PIO_WRITE_ACK {
        warn!(
            "{}: pio write {:02x} confirmed with {:02x}",
            slave.name(),
            requested,
            confirm[0]
        );
    } else {
        debug!("{}: pio write {:02x}", slave.name(), requested);
    }
    Ok(confirm[0])
}

/// Reads the PIO status byte of `slave`.
///
/// Select, PIO Access Read, one byte back, then one more reset/select before the bus is
/// released. A failure of that final select fails the read.
pub fn read_status<T: OneWire>(slave: &Slave<'_, T>) -> OneWireResult<u8, T::BusError> {
    let status = slave.run(|txn| {
        txn.write(&[Command::PioAccessRead.op_code()])?;
        let mut status = [0u8; 1];
        txn.read(&mut status)?;
        txn.reselect()?;
        Ok(status[0])
    })?;
    debug!("{}: pio status {:02x}", slave.name(), status);
    Ok(status)
}
