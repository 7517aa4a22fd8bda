/// DS28EA00 function commands used by this driver.
///
/// Each is sent as the first byte after the slave has been selected.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read the 9-byte scratchpad, CRC last.
    ReadScratchpad = 0xbe,
    /// Start a temperature conversion. The result lands in scratchpad bytes 0 and 1.
    ConvertTemperature = 0x44,
    /// PIO Access Write, followed by the new latch state and its complement.
    PioAccessWrite = 0xa5,
    /// PIO Access Read, answered with the PIO status byte.
    PioAccessRead = 0xf5,
}

impl Command {
    /// Opcode on the wire.
    #[inline]
    pub const fn op_code(self) -> u8 {
        self as u8
    }
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> u8 {
        cmd.op_code()
    }
}

impl TryFrom<u8> for Command {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use Command::*;
        match value {
            0xbe => Ok(ReadScratchpad),
            0x44 => Ok(ConvertTemperature),
            0xa5 => Ok(PioAccessWrite),
            0xf5 => Ok(PioAccessRead),
            other => Err(other),
        }
    }
}
