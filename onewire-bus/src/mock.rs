//! Recording bus master for testing slave drivers without hardware.
//!
//! [`MockOneWire`] implements [`OneWire`] at the block level. Every reset/select, write and
//! read is appended to a [`Journal`] shared with the test, tagged with the calling thread.
//! Replies are produced by per-command responders: when a write block starts with a
//! registered command byte, the responder's output is queued for the following reads.
//! Reads with nothing queued return `0xff`, like an idle line.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use crate::{OneWire, OneWireError, OneWireResult};

/// One bus operation seen by [`MockOneWire`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Reset pulse without addressing.
    Reset,
    /// Reset followed by Match ROM for `rom`.
    ResetSelect {
        /// Addressed ROM code.
        rom: u64,
        /// Whether a device answered.
        present: bool,
    },
    /// Bytes written.
    Write(Vec<u8>),
    /// Bytes read.
    Read(Vec<u8>),
}

/// An [`Event`] with the thread that caused it.
#[derive(Debug, Clone)]
pub struct Record {
    /// Calling thread.
    pub thread: ThreadId,
    /// What happened on the wire.
    pub event: Event,
}

/// Shared, append-only log of bus operations.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Record>>>);

impl Journal {
    fn push(&self, event: Event) {
        self.0.lock().push(Record {
            thread: thread::current().id(),
            event,
        });
    }

    /// All records so far, oldest first.
    pub fn records(&self) -> Vec<Record> {
        self.0.lock().clone()
    }

    /// All events so far, oldest first.
    pub fn events(&self) -> Vec<Event> {
        self.0.lock().iter().map(|r| r.event.clone()).collect()
    }

    /// Number of reset/select operations so far.
    pub fn selects(&self) -> usize {
        self.0
            .lock()
            .iter()
            .filter(|r| matches!(r.event, Event::ResetSelect { .. }))
            .count()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Error injected by [`MockOneWire::fail_reads`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

type Responder = Box<dyn FnMut(&[u8]) -> Vec<u8> + Send>;

/// A scripted, recording bus master.
pub struct MockOneWire {
    devices: HashSet<u64>,
    selects_left: Option<usize>,
    selected: bool,
    fail_reads: bool,
    responders: HashMap<u8, Responder>,
    pending: VecDeque<u8>,
    journal: Journal,
}

impl Default for MockOneWire {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOneWire {
    /// An empty bus: no device answers.
    pub fn new() -> Self {
        Self {
            devices: HashSet::new(),
            selects_left: None,
            selected: false,
            fail_reads: false,
            responders: HashMap::new(),
            pending: VecDeque::new(),
            journal: Journal::default(),
        }
    }

    /// Adds a device that answers selects for `rom`.
    pub fn with_device(mut self, rom: u64) -> Self {
        self.devices.insert(rom);
        self
    }

    /// Lets only the first `n` selects succeed; every later one finds no device.
    pub fn fail_selects_after(mut self, n: usize) -> Self {
        self.selects_left = Some(n);
        self
    }

    /// Makes every read fail with [`MockError`].
    pub fn fail_reads(mut self, fail: bool) -> Self {
        self.fail_reads = fail;
        self
    }

    /// Registers `responder` for write blocks starting with `cmd`.
    ///
    /// The responder receives the whole written block and returns the bytes the device
    /// sends back.
    pub fn respond<F>(mut self, cmd: u8, responder: F) -> Self
    where
        F: FnMut(&[u8]) -> Vec<u8> + Send + 'static,
    {
        self.responders.insert(cmd, Box::new(responder));
        self
    }

    /// Handle to the journal of this bus master.
    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }
}

impl OneWire for MockOneWire {
    type Status = bool;
    type BusError = MockError;

    fn reset(&mut self) -> OneWireResult<bool, MockError> {
        thread::yield_now();
        self.journal.push(Event::Reset);
        self.selected = false;
        self.pending.clear();
        Ok(!self.devices.is_empty())
    }

    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), MockError> {
        self.write_block(&[byte])
    }

    fn read_byte(&mut self) -> OneWireResult<u8, MockError> {
        let mut buf = [0; 1];
        self.read_block(&mut buf)?;
        Ok(buf[0])
    }

    fn reset_select(&mut self, rom: u64) -> OneWireResult<(), MockError> {
        thread::yield_now();
        let budget = match self.selects_left.as_mut() {
            Some(0) => false,
            Some(n) => {
                *n -= 1;
                true
            }
            None => true,
        };
        let present = budget && self.devices.contains(&rom);
        self.journal.push(Event::ResetSelect { rom, present });
        self.pending.clear();
        self.selected = present;
        if present {
            Ok(())
        } else {
            Err(OneWireError::NoDevicePresent)
        }
    }

    fn write_block(&mut self, data: &[u8]) -> OneWireResult<(), MockError> {
        thread::yield_now();
        self.journal.push(Event::Write(data.to_vec()));
        if self.selected {
            if let Some(responder) = data.first().and_then(|cmd| self.responders.get_mut(cmd)) {
                let reply = responder(data);
                self.pending.extend(reply);
            }
        }
        Ok(())
    }

    fn read_block(&mut self, buf: &mut [u8]) -> OneWireResult<(), MockError> {
        thread::yield_now();
        if self.fail_reads {
            return Err(OneWireError::Other(MockError));
        }
        for b in buf.iter_mut() {
            *b = self.pending.pop_front().unwrap_or(0xff);
        }
        self.journal.push(Event::Read(buf.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_reset_reports_any_device() {
        let mut empty = MockOneWire::new();
        assert!(!empty.reset().unwrap());

        let mut mock = MockOneWire::new()
            .with_device(0x42)
            .respond(0xf5, |_| vec![0x0f]);
        let journal = mock.journal();
        assert!(mock.reset().unwrap());
        // not selected: responders stay quiet
        mock.write_byte(0xf5).unwrap();
        assert_eq!(mock.read_byte().unwrap(), 0xff);
        assert_eq!(
            journal.events(),
            [
                Event::Reset,
                Event::Write(vec![0xf5]),
                Event::Read(vec![0xff]),
            ]
        );
    }

    #[test]
    fn select_budget() {
        let mut mock = MockOneWire::new().with_device(0x42).fail_selects_after(1);
        assert!(mock.reset_select(0x42).is_ok());
        assert!(mock.reset_select(0x42).unwrap_err().is_device_absent());
        assert_eq!(mock.journal().selects(), 2);
    }
}
