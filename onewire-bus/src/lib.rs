#![deny(missing_docs)]
//! # onewire-bus
//! Shared 1-Wire bus plumbing for slave device drivers.
//!
//! The [OneWire] trait describes the bus-master primitives a driver needs: reset,
//! byte and block transfers, and a reset-and-select sequence addressing one slave by ROM code.
//! A [Bus] owns a bus master behind a lock, and every multi-step exchange with a slave runs
//! as a [Transaction] that holds that lock from the initial select until it returns.
//!
//! The crate also provides the Dallas/Maxim CRC-8 in [OneWireCrc], used to validate ROM codes
//! and device memory reads, and helpers for 64-bit ROM codes in [rom].

mod bus;
mod consts;
mod crc;
mod error;
#[cfg(any(test, feature = "mock"))]
#[cfg_attr(docsrs, doc(cfg(feature = "mock")))]
pub mod mock;
pub mod rom;
mod traits;

pub use bus::{Bus, Slave, Transaction};
pub use consts::{ONEWIRE_MATCH_ROM_CMD, ONEWIRE_SKIP_ROM_CMD};
pub use crc::OneWireCrc;
pub use error::OneWireError;
pub use traits::{OneWire, OneWireStatus};

/// Result of 1-Wire operations.
pub type OneWireResult<T, E> = Result<T, OneWireError<E>>;
