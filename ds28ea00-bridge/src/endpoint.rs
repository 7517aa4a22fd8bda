use core::fmt;
use core::str::FromStr;

use crate::BridgeError;

/// Attribute endpoints a DS28EA00 exposes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `scratchpad`: the 9 raw scratchpad bytes and the CRC verdict.
    Scratchpad,
    /// `therm`: runs a conversion and reports the temperature.
    Therm,
    /// `pio_value`: PIO status on read, PIO latches on write.
    PioValue,
}

impl Endpoint {
    /// Every endpoint, in listing order.
    pub const ALL: [Endpoint; 3] = [Endpoint::Scratchpad, Endpoint::Therm, Endpoint::PioValue];

    /// Attribute name.
    pub const fn name(&self) -> &'static str {
        match self {
            Endpoint::Scratchpad => "scratchpad",
            Endpoint::Therm => "therm",
            Endpoint::PioValue => "pio_value",
        }
    }

    /// Whether the endpoint accepts writes.
    pub const fn writable(&self) -> bool {
        matches!(self, Endpoint::PioValue)
    }

    /// `"r"` or `"rw"`.
    pub const fn mode(&self) -> &'static str {
        if self.writable() { "rw" } else { "r" }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Endpoint {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Endpoint::ALL
            .into_iter()
            .find(|e| e.name() == s)
            .ok_or_else(|| BridgeError::UnknownEndpoint(s.to_owned()))
    }
}

/// Read/write access to named attributes of an attached device.
///
/// Reads of an absent device come back as an empty string; writes to one fail with
/// [`BridgeError::DeviceAbsent`].
pub trait Attributes {
    /// Renders `endpoint` as text.
    fn read(&self, endpoint: Endpoint) -> Result<String, BridgeError>;

    /// Writes `data` to `endpoint`, returning the number of bytes consumed.
    fn write(&self, endpoint: Endpoint, data: &[u8]) -> Result<usize, BridgeError>;
}
