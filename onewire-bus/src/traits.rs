use crate::{OneWireError, OneWireResult, consts::ONEWIRE_MATCH_ROM_CMD};

/// Status of the 1-Wire bus after a reset pulse.
pub trait OneWireStatus {
    /// Whether a presence pulse was detected after the reset.
    fn presence(&self) -> bool;

    /// Whether the line was found shorted during the presence-detect cycle.
    fn shortcircuit(&self) -> bool {
        false
    }
}

impl OneWireStatus for bool {
    fn presence(&self) -> bool {
        *self
    }
}

/// Trait for 1-Wire bus masters.
///
/// Implementors provide the reset pulse and byte transfers. The block transfers and the
/// reset-and-select sequence have default implementations built on those; bus masters with
/// native block commands may override them.
pub trait OneWire {
    /// The status type returned by the reset operation.
    /// This type must implement the [OneWireStatus] trait.
    type Status: OneWireStatus;
    /// The error type returned by the operations of this trait.
    /// This type is used to indicate errors in the underlying hardware or communication.
    type BusError;

    /// Resets the 1-Wire bus and returns the status of the bus.
    ///
    /// # Errors
    /// This method returns an error if the reset operation fails.
    fn reset(&mut self) -> OneWireResult<Self::Status, Self::BusError>;

    /// Writes a byte to the 1-Wire bus.
    ///
    /// # Errors
    /// This method returns an error if the write operation fails.
    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError>;

    /// Reads a byte from the 1-Wire bus.
    ///
    /// # Errors
    /// This method returns an error if the read operation fails.
    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError>;

    /// Resets the bus and addresses the slave with ROM code `rom` (Match ROM).
    ///
    /// The ROM is sent least significant byte first, family code leading.
    ///
    /// # Errors
    /// [`OneWireError::NoDevicePresent`] if no presence pulse follows the reset,
    /// [`OneWireError::ShortCircuit`] if the line is shorted.
    fn reset_select(&mut self, rom: u64) -> OneWireResult<(), Self::BusError> {
        let status = self.reset()?;
        if status.shortcircuit() {
            return Err(OneWireError::ShortCircuit);
        }
        if !status.presence() {
            return Err(OneWireError::NoDevicePresent);
        }
        self.write_byte(ONEWIRE_MATCH_ROM_CMD)?;
        self.write_block(&rom.to_le_bytes())
    }

    /// Writes `data` to the bus in order.
    fn write_block(&mut self, data: &[u8]) -> OneWireResult<(), Self::BusError> {
        for &b in data.iter() {
            self.write_byte(b)?;
        }
        Ok(())
    }

    /// Fills `buf` with bytes read from the bus, in the order received.
    fn read_block(&mut self, buf: &mut [u8]) -> OneWireResult<(), Self::BusError> {
        for b in buf.iter_mut() {
            *b = self.read_byte()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Byte-level master that records the wire and replays queued reads.
    #[derive(Default)]
    struct Wire {
        present: bool,
        written: Vec<u8>,
        resets: usize,
        reads: VecDeque<u8>,
    }

    impl OneWire for Wire {
        type Status = bool;
        type BusError = ();

        fn reset(&mut self) -> OneWireResult<bool, ()> {
            self.resets += 1;
            Ok(self.present)
        }

        fn write_byte(&mut self, byte: u8) -> OneWireResult<(), ()> {
            self.written.push(byte);
            Ok(())
        }

        fn read_byte(&mut self) -> OneWireResult<u8, ()> {
            self.reads.pop_front().ok_or(OneWireError::Other(()))
        }
    }

    #[test]
    fn reset_select_sends_match_rom() {
        let mut wire = Wire {
            present: true,
            ..Default::default()
        };
        wire.reset_select(0x1122_3344_5566_7742).unwrap();
        assert_eq!(wire.resets, 1);
        assert_eq!(
            wire.written,
            [0x55, 0x42, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11]
        );
    }

    #[test]
    fn reset_select_without_presence() {
        let mut wire = Wire::default();
        assert!(matches!(
            wire.reset_select(0x42),
            Err(OneWireError::NoDevicePresent)
        ));
        assert!(wire.written.is_empty());
    }

    struct Shorted;

    impl OneWireStatus for Shorted {
        fn presence(&self) -> bool {
            true
        }

        fn shortcircuit(&self) -> bool {
            true
        }
    }

    struct ShortedWire;

    impl OneWire for ShortedWire {
        type Status = Shorted;
        type BusError = ();

        fn reset(&mut self) -> OneWireResult<Shorted, ()> {
            Ok(Shorted)
        }

        fn write_byte(&mut self, _: u8) -> OneWireResult<(), ()> {
            panic!("nothing may be sent on a shorted line")
        }

        fn read_byte(&mut self) -> OneWireResult<u8, ()> {
            Ok(0)
        }
    }

    #[test]
    fn reset_select_on_short() {
        assert!(matches!(
            ShortedWire.reset_select(0x42),
            Err(OneWireError::ShortCircuit)
        ));
    }

    #[test]
    fn blocks_keep_wire_order() {
        let mut wire = Wire {
            present: true,
            reads: VecDeque::from([1, 2, 3]),
            ..Default::default()
        };
        wire.write_block(&[0xbe, 0x44]).unwrap();
        let mut buf = [0; 3];
        wire.read_block(&mut buf).unwrap();
        assert_eq!(wire.written, [0xbe, 0x44]);
        assert_eq!(buf, [1, 2, 3]);
        assert!(matches!(
            wire.read_block(&mut buf),
            Err(OneWireError::Other(()))
        ));
    }
}
