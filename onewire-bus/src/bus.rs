use core::fmt;

use log::{debug, trace};
use parking_lot::Mutex;

use crate::{OneWire, OneWireResult, rom};

/// A shared 1-Wire bus.
///
/// Owns the bus master behind a single lock. The wire is one physical medium, so the lock
/// is bus-wide: at most one [`Transaction`] is in flight at any time, whichever slave it
/// addresses.
pub struct Bus<T> {
    master: Mutex<T>,
}

impl<T> Bus<T> {
    /// Wraps a bus master.
    pub fn new(master: T) -> Self {
        Self {
            master: Mutex::new(master),
        }
    }

    /// Releases the bus master.
    pub fn into_inner(self) -> T {
        self.master.into_inner()
    }

    /// A handle to the slave with ROM code `rom` on this bus.
    ///
    /// No bus traffic is generated; presence is only checked when a transaction starts.
    pub fn slave(&self, rom: u64) -> Slave<'_, T> {
        Slave { rom, bus: self }
    }
}

impl<T: OneWire> Bus<T> {
    /// Runs `body` as one transaction with the slave `rom`.
    ///
    /// The bus lock is taken first and held until this function returns, on every path:
    /// normal completion, an error returned from `body`, or a panic unwinding out of it.
    /// The slave is reset and selected before `body` runs; if it does not answer, `body` is
    /// not invoked and [`OneWireError::NoDevicePresent`](crate::OneWireError::NoDevicePresent)
    /// is returned.
    pub fn transact<R, F>(&self, rom: u64, body: F) -> OneWireResult<R, T::BusError>
    where
        F: FnOnce(&mut Transaction<'_, T>) -> OneWireResult<R, T::BusError>,
    {
        let mut master = self.master.lock();
        trace!("{}: bus acquired", rom::name(rom));
        if let Err(e) = master.reset_select(rom) {
            debug!("{}: select failed: {}", rom::name(rom), describe(&e));
            return Err(e);
        }
        let mut txn = Transaction {
            master: &mut *master,
            rom,
        };
        let res = body(&mut txn);
        trace!("{}: bus released", rom::name(rom));
        res
    }
}

impl<T> fmt::Debug for Bus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("locked", &self.master.is_locked())
            .finish()
    }
}

/// A slave device on a [`Bus`].
///
/// Borrows the bus it sits on; the owner of the bus decides when slaves come and go.
pub struct Slave<'a, T> {
    rom: u64,
    bus: &'a Bus<T>,
}

impl<'a, T> Slave<'a, T> {
    /// ROM code of this slave.
    pub fn rom(&self) -> u64 {
        self.rom
    }

    /// Family code of this slave.
    pub fn family(&self) -> u8 {
        rom::family(self.rom)
    }

    /// Name of this slave in `ff-ssssssssssss` form.
    pub fn name(&self) -> String {
        rom::name(self.rom)
    }

    /// The bus this slave is attached to.
    pub fn bus(&self) -> &'a Bus<T> {
        self.bus
    }
}

impl<T: OneWire> Slave<'_, T> {
    /// Runs `body` as one transaction with this slave. See [`Bus::transact`].
    pub fn run<R, F>(&self, body: F) -> OneWireResult<R, T::BusError>
    where
        F: FnOnce(&mut Transaction<'_, T>) -> OneWireResult<R, T::BusError>,
    {
        self.bus.transact(self.rom, body)
    }
}

impl<T> Clone for Slave<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Slave<'_, T> {}

impl<T> fmt::Debug for Slave<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Slave").field(&rom::name(self.rom)).finish()
    }
}

/// An exchange with a selected slave, holding the bus lock.
///
/// Handed to the body of [`Bus::transact`] once the slave has answered the select.
pub struct Transaction<'a, T> {
    master: &'a mut T,
    rom: u64,
}

impl<T: OneWire> Transaction<'_, T> {
    /// ROM code of the selected slave.
    pub fn rom(&self) -> u64 {
        self.rom
    }

    /// Resets the bus and selects the slave again without releasing the lock.
    ///
    /// A failure here must abort the whole operation; callers propagate it with `?` and
    /// drop whatever they read before.
    pub fn reselect(&mut self) -> OneWireResult<(), T::BusError> {
        trace!("{}: reselect", rom::name(self.rom));
        self.master.reset_select(self.rom).inspect_err(|e| {
            debug!("{}: reselect failed: {}", rom::name(self.rom), describe(e));
        })
    }

    /// Writes `data` to the selected slave.
    pub fn write(&mut self, data: &[u8]) -> OneWireResult<(), T::BusError> {
        trace!("{}: write {:02x?}", rom::name(self.rom), data);
        self.master.write_block(data)
    }

    /// Reads `buf.len()` bytes from the selected slave.
    pub fn read(&mut self, buf: &mut [u8]) -> OneWireResult<(), T::BusError> {
        self.master.read_block(buf)?;
        trace!("{}: read {:02x?}", rom::name(self.rom), buf);
        Ok(())
    }
}

fn describe<E>(e: &crate::OneWireError<E>) -> &'static str {
    use crate::OneWireError::*;
    match e {
        Other(_) => "bus master error",
        NoDevicePresent => "no device present",
        ShortCircuit => "short circuit",
    }
}
