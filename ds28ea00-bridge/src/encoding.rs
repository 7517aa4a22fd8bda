/// Mapping from the first byte of a `pio_value` write to the latch byte sent to the device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PioEncoding {
    /// Latch byte is `base ^ byte`.
    Xor {
        /// Value XORed with the input byte.
        base: u8,
    },
    /// ASCII `'0'` selects `preset`; any other byte is XORed into `base`.
    PresetOnZero {
        /// Value XORed with any byte other than `'0'`.
        base: u8,
        /// Latch byte sent for `'0'`.
        preset: u8,
    },
}

impl Default for PioEncoding {
    fn default() -> Self {
        PioEncoding::PresetOnZero {
            base: 0xff,
            preset: 0xff,
        }
    }
}

impl PioEncoding {
    /// Latch byte for input `byte`.
    pub const fn encode(&self, byte: u8) -> u8 {
        match *self {
            PioEncoding::Xor { base } => base ^ byte,
            PioEncoding::PresetOnZero { preset, .. } if byte == b'0' => preset,
            PioEncoding::PresetOnZero { base, .. } => base ^ byte,
        }
    }
}
