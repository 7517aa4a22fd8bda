#![deny(missing_docs)]
//! # DS28EA00 bridge
//!
//! Text endpoints for DS28EA00 slaves, in the style of device attribute files:
//!
//! | Endpoint | Mode | Content |
//! |----------|------|---------|
//! | `scratchpad` | r | `b0 .. b8 : crc=cc YES` |
//! | `therm` | r | the scratchpad line, then `b0 .. b8 t=<int>.<sixteenths>` |
//! | `pio_value` | rw | `status=<HEX>` on read; first written byte sets the latches |
//!
//! [`FamilyRegistry`] holds one [`ProtocolBridge`] per attached slave of a bus, and
//! [`Attributes`] is how callers reach the endpoints.

mod bridge;
mod encoding;
mod endpoint;
mod error;
pub mod format;
mod registry;

pub use bridge::{BridgeConfig, PioWrite, ProtocolBridge};
pub use encoding::PioEncoding;
pub use endpoint::{Attributes, Endpoint};
pub use error::BridgeError;
pub use registry::FamilyRegistry;
