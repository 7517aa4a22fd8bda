use core::fmt::Debug;

use onewire_bus::OneWireError;
use thiserror::Error;

use crate::Endpoint;

/// Errors surfaced by the bridge and the registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// A write endpoint received no payload. Nothing was sent on the bus.
    #[error("empty payload")]
    InvalidInput,
    /// The slave did not answer its select.
    #[error("no device present")]
    DeviceAbsent,
    /// The endpoint cannot be written.
    #[error("endpoint {0} is read-only")]
    ReadOnly(Endpoint),
    /// No endpoint by that name.
    #[error("unknown endpoint {0:?}")]
    UnknownEndpoint(String),
    /// The ROM code belongs to another device family.
    #[error("family {0:02x} is not handled by this driver")]
    WrongFamily(u8),
    /// The CRC byte of the ROM code does not match.
    #[error("ROM code {0:016x} fails its CRC check")]
    InvalidRom(u64),
    /// The slave is already attached.
    #[error("{0} is already attached")]
    AlreadyAttached(String),
    /// The slave is not attached.
    #[error("{0} is not attached")]
    NotAttached(String),
    /// Any other bus failure.
    #[error("bus error: {0}")]
    Bus(String),
}

impl<E: Debug> From<OneWireError<E>> for BridgeError {
    fn from(e: OneWireError<E>) -> Self {
        match e {
            OneWireError::NoDevicePresent => BridgeError::DeviceAbsent,
            other => BridgeError::Bus(other.to_string()),
        }
    }
}
