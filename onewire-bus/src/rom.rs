//! Helpers for 64-bit ROM codes.
//!
//! | Bit | Description |
//! |-----|-------------|
//! | 0-7 | Family code (e.g., 0x42 for DS28EA00) |
//! | 8-55 | 48-bit serial number |
//! | 56-63 | CRC-8 of bits 0-55 |
//!
//! ROM codes are held as `u64` whose little-endian bytes are the order sent on the wire.

use crate::OneWireCrc;

/// Builds a ROM code from a family code and a 48-bit serial, appending the CRC.
///
/// Bits of `serial` above bit 47 are ignored.
pub fn from_parts(family: u8, serial: u64) -> u64 {
    let raw = (family as u64) | ((serial & 0xffff_ffff_ffff) << 8);
    let crc = OneWireCrc::compute(&raw.to_le_bytes()[..7]);
    raw | ((crc as u64) << 56)
}

/// Family code of `rom`.
pub fn family(rom: u64) -> u8 {
    rom as u8
}

/// 48-bit serial number of `rom`.
pub fn serial(rom: u64) -> u64 {
    (rom >> 8) & 0xffff_ffff_ffff
}

/// Whether the CRC byte of `rom` matches its first seven bytes.
pub fn is_valid(rom: u64) -> bool {
    OneWireCrc::validate_sequence(&rom.to_le_bytes())
}

/// Renders `rom` in the `ff-ssssssssssss` form used for slave names.
pub fn name(rom: u64) -> String {
    format!("{:02x}-{:012x}", family(rom), serial(rom))
}

/// Parses a ROM code.
///
/// Accepts the `ff-ssssssssssss` slave name form, for which the CRC byte is computed,
/// or 16 hex digits of the full code as printed by `{:016x}`.
pub fn parse(s: &str) -> Option<u64> {
    let s = s.trim();
    if let Some((family, serial)) = s.split_once('-') {
        if family.len() != 2 || serial.is_empty() || serial.len() > 12 {
            return None;
        }
        let family = u8::from_str_radix(family, 16).ok()?;
        let serial = u64::from_str_radix(serial, 16).ok()?;
        Some(from_parts(family, serial))
    } else if s.len() == 16 {
        u64::from_str_radix(s, 16).ok()
    } else {
        None
    }
}
