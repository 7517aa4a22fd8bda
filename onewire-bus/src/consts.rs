//! ROM command constants for 1-Wire communication.

/// Command to match a specific ROM address in 1-Wire communication.
///
/// Followed by the 64-bit ROM code, least significant byte first. Only the slave
/// whose ROM matches responds to the subsequent function command.
pub const ONEWIRE_MATCH_ROM_CMD: u8 = 0x55;

/// Command to skip ROM addressing in 1-Wire communication.
///
/// Addresses every slave on the bus at once. Reads after this command return
/// garbage on a bus with more than one device.
pub const ONEWIRE_SKIP_ROM_CMD: u8 = 0xcc;
