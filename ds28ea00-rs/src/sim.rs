//! Byte-level DS28EA00 simulator.
//!
//! [`SimulatedDs28ea00`] plays both the bus master and a single DS28EA00 on the wire. It
//! implements [`OneWire`] with only the byte primitives, so the default Match ROM and block
//! transfers of the trait are what drive it. Supported: Match ROM and Skip ROM, Convert T,
//! Read Scratchpad, PIO Access Write and PIO Access Read.

use core::convert::Infallible;
use std::collections::VecDeque;

use fixed::types::U12F4;
use log::trace;
use onewire_bus::{
    ONEWIRE_MATCH_ROM_CMD, ONEWIRE_SKIP_ROM_CMD, OneWire, OneWireCrc, OneWireResult,
};

use crate::{Command, actuator::PIO_WRITE_ACK};

/// Temperature register after power-up: 85 degrees.
const POWER_ON_TEMPERATURE: u16 = 0x0550;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum State {
    /// Waiting for a ROM command after reset.
    RomCommand,
    /// Receiving the ROM code of a Match ROM.
    MatchRom { received: usize, matched: bool },
    /// Selected, waiting for a function command.
    Function,
    /// Inside PIO Access Write, latch byte received if `Some`.
    PioWrite(Option<u8>),
    /// Sending queued bytes; further writes are ignored until reset.
    Responding,
    /// Not addressed, or finished; silent until reset.
    Idle,
}

/// A simulated DS28EA00 alone on its own bus.
#[derive(Debug, Clone)]
pub struct SimulatedDs28ea00 {
    rom: u64,
    present: bool,
    corrupt_crc: bool,
    ambient: U12F4,
    register: u16,
    alarm_high: u8,
    alarm_low: u8,
    config: u8,
    latch: u8,
    conversions: usize,
    state: State,
    outgoing: VecDeque<u8>,
}

impl SimulatedDs28ea00 {
    /// A powered-up device with ROM code `rom`, 12-bit resolution and both PIOs off.
    pub fn new(rom: u64) -> Self {
        Self {
            rom,
            present: true,
            corrupt_crc: false,
            ambient: U12F4::from_num(21),
            register: POWER_ON_TEMPERATURE,
            alarm_high: 0x55,
            alarm_low: 0x00,
            config: 0x7f,
            latch: 0xff,
            conversions: 0,
            state: State::Idle,
            outgoing: VecDeque::new(),
        }
    }

    /// Temperature the next conversion will report.
    ///
    /// Values above 127.9375 do not fit the temperature register and are truncated.
    pub fn with_temperature(mut self, temperature: U12F4) -> Self {
        self.ambient = temperature;
        self
    }

    /// Whether the device answers reset pulses.
    pub fn with_present(mut self, present: bool) -> Self {
        self.present = present;
        self
    }

    /// Whether the scratchpad CRC byte is sent damaged.
    pub fn with_corrupt_crc(mut self, corrupt: bool) -> Self {
        self.corrupt_crc = corrupt;
        self
    }

    /// ROM code of the device.
    pub fn rom(&self) -> u64 {
        self.rom
    }

    /// Number of temperature conversions run so far.
    pub fn conversions(&self) -> usize {
        self.conversions
    }

    /// Current PIO output latch byte; bit 0 is PIO A, bit 1 is PIO B.
    pub fn latch(&self) -> u8 {
        self.latch
    }

    fn scratchpad(&self) -> [u8; 9] {
        let [lsb, msb] = self.register.to_le_bytes();
        let payload = [
            lsb,
            msb,
            self.alarm_high,
            self.alarm_low,
            self.config,
            0xff,
            0x0c,
            0x10,
        ];
        let mut crc = OneWireCrc::compute(&payload);
        if self.corrupt_crc {
            crc ^= 0x5a;
        }
        let mut out = [0; 9];
        out[..8].copy_from_slice(&payload);
        out[8] = crc;
        out
    }

    fn pio_status(&self) -> u8 {
        let a = self.latch & 0x01;
        let b = (self.latch >> 1) & 0x01;
        // with nothing attached the pins follow the latches
        let low = a | (a << 1) | (b << 2) | (b << 3);
        low | ((!low & 0x0f) << 4)
    }

    fn function(&mut self, byte: u8) -> State {
        match Command::try_from(byte) {
            Ok(Command::ReadScratchpad) => {
                let scratchpad = self.scratchpad();
                self.outgoing.extend(scratchpad);
                State::Responding
            }
            Ok(Command::ConvertTemperature) => {
                self.register = self.ambient.to_bits() & 0x07ff;
                self.conversions += 1;
                trace!("sim: converted {}", self.ambient);
                State::Idle
            }
            Ok(Command::PioAccessWrite) => State::PioWrite(None),
            Ok(Command::PioAccessRead) => {
                let status = self.pio_status();
                self.outgoing.push_back(status);
                State::Responding
            }
            Err(other) => {
                trace!("sim: unsupported function {other:02x}");
                State::Idle
            }
        }
    }
}

impl OneWire for SimulatedDs28ea00 {
    type Status = bool;
    type BusError = Infallible;

    fn reset(&mut self) -> OneWireResult<bool, Infallible> {
        self.outgoing.clear();
        self.state = if self.present {
            State::RomCommand
        } else {
            State::Idle
        };
        Ok(self.present)
    }

    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Infallible> {
        let state = self.state;
        self.state = match state {
            State::RomCommand if byte == ONEWIRE_MATCH_ROM_CMD => State::MatchRom {
                received: 0,
                matched: true,
            },
            State::RomCommand if byte == ONEWIRE_SKIP_ROM_CMD => State::Function,
            State::RomCommand => State::Idle,
            State::MatchRom { received, matched } => {
                let matched = matched && self.rom.to_le_bytes()[received] == byte;
                match (received + 1, matched) {
                    (8, true) => State::Function,
                    (8, false) => State::Idle,
                    (received, matched) => State::MatchRom { received, matched },
                }
            }
            State::Function => self.function(byte),
            State::PioWrite(None) => State::PioWrite(Some(byte)),
            State::PioWrite(Some(value)) => {
                if byte == !value {
                    self.latch = value | 0xfc;
                    let status = self.pio_status();
                    self.outgoing.extend([PIO_WRITE_ACK, status]);
                    State::Responding
                } else {
                    trace!("sim: pio write {value:02x} with bad complement {byte:02x}");
                    State::Idle
                }
            }
            State::Responding | State::Idle => state,
        };
        Ok(())
    }

    fn read_byte(&mut self) -> OneWireResult<u8, Infallible> {
        Ok(self.outgoing.pop_front().unwrap_or(0xff))
    }
}
