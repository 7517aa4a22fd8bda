#[derive(Debug, Default, Clone, Copy)]
/// Calculate CRC-8 used in 1-Wire communications.
///
/// Dallas/Maxim CRC-8, polynomial `x^8 + x^5 + x^4 + 1` (`0x8c` reflected), seed 0.
/// With the `crc-table` feature (default) each byte is folded in through a 256-entry
/// lookup table, otherwise bit by bit. Both give the same result.
pub struct OneWireCrc(u8);

impl OneWireCrc {
    /// Get the current CRC value
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Update the CRC with the incoming byte.
    pub fn update(&mut self, byte: u8) {
        #[cfg(feature = "crc-table")]
        {
            self.0 = table_step(self.0, byte);
        }
        #[cfg(not(feature = "crc-table"))]
        {
            self.0 = bitwise_step(self.0, byte);
        }
    }

    /// Compute the CRC of `bytes`, starting from seed 0.
    pub fn compute(bytes: &[u8]) -> u8 {
        let mut crc = OneWireCrc(0);
        for &byte in bytes.iter() {
            crc.update(byte);
        }
        crc.0
    }

    /// Check `bytes` against a separately transmitted check byte.
    pub fn validate(bytes: &[u8], check: u8) -> bool {
        Self::compute(bytes) == check
    }

    /// Validate a sequence of bytes where the last byte is the 1-Wire CRC of
    /// the previous bytes.
    pub fn validate_sequence(sequence: &[u8]) -> bool {
        // running the CRC over its own check byte leaves zero
        !sequence.is_empty() && Self::compute(sequence) == 0
    }
}

#[cfg_attr(all(feature = "crc-table", not(test)), allow(dead_code))]
pub(crate) fn bitwise_step(crc: u8, byte: u8) -> u8 {
    let mut crc = crc ^ byte;
    for _ in 0..8 {
        if crc & 0x1 == 0x1 {
            crc = (crc >> 1) ^ 0x8c;
        } else {
            crc >>= 1;
        }
    }
    crc
}

#[cfg_attr(not(any(test, feature = "crc-table")), allow(dead_code))]
pub(crate) fn table_step(crc: u8, byte: u8) -> u8 {
    CRC_TABLE[(crc ^ byte) as usize]
}

const CRC_TABLE: [u8; 256] = build_table();

const fn build_table() -> [u8; 256] {
    let mut table = [0; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x1 == 0x1 {
                (crc >> 1) ^ 0x8c
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}
