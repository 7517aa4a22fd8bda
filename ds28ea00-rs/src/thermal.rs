//! Temperature conversion and decoding.

use core::fmt;
use core::time::Duration;

use embedded_hal::delay::DelayNs;
use fixed::types::U12F4;
use log::{debug, trace, warn};
use onewire_bus::{OneWire, OneWireResult, Slave};

use crate::{Command, CrcVerdict, Scratchpad};

/// Temperature decoded from the scratchpad.
///
/// Built from 7 integer bits (bits 0-2 of byte 1, high nibble of byte 0) and 4 fractional
/// bits (low nibble of byte 0), in sixteenths of a degree Celsius. The sign bits of byte 1
/// are not looked at, so only readings from 0 to 127.9375 come out right.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Temperature(U12F4);

impl Temperature {
    /// Decodes the temperature register.
    pub fn from_scratchpad(lsb: u8, msb: u8) -> Self {
        let bits = (((msb & 0x07) as u16) << 8) | lsb as u16;
        Self(U12F4::from_bits(bits))
    }

    /// Whole degrees: `((msb & 0x07) << 4) | (lsb >> 4)`.
    pub fn integer_part(&self) -> u8 {
        (self.0.to_bits() >> 4) as u8
    }

    /// Fraction of a degree in sixteenths: `lsb & 0x0f`.
    pub fn fraction_sixteenths(&self) -> u8 {
        (self.0.to_bits() & 0x0f) as u8
    }

    /// The value as a fixed-point number.
    pub fn to_fixed(self) -> U12F4 {
        self.0
    }
}

impl From<Temperature> for U12F4 {
    fn from(t: Temperature) -> Self {
        t.0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A completed conversion: the decoded temperature and the scratchpad it came from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Measurement {
    /// Decoded temperature.
    pub temperature: Temperature,
    /// Raw scratchpad, 8 or 9 bytes depending on whether the CRC was read.
    pub scratchpad: Scratchpad,
}

impl Measurement {
    /// CRC verdict of the underlying scratchpad read.
    pub fn verdict(&self) -> CrcVerdict {
        self.scratchpad.verdict()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Step {
    Idle,
    Selected,
    ConvertIssued,
    Waiting,
    Reselected,
    ScratchpadFetched,
    Done,
    Absent,
}

/// Runs a temperature conversion on `slave` and reads the result back.
///
/// Within one transaction: select, Convert T, wait `latency`, reselect, Read Scratchpad,
/// then 9 bytes when `crc` is set or 8 bytes otherwise. The bus stays locked through the
/// wait, so every other slave on the bus is held off for `latency`.
///
/// A select failure at either end aborts with
/// [`OneWireError::NoDevicePresent`](onewire_bus::OneWireError::NoDevicePresent).
pub fn measure<T: OneWire, D: DelayNs>(
    slave: &Slave<'_, T>,
    latency: Duration,
    crc: bool,
    delay: &mut D,
) -> OneWireResult<Measurement, T::BusError> {
    let name = slave.name();
    let mut step = Step::Idle;
    let advance = |step: &mut Step, next: Step| {
        trace!("{name}: conversion {:?} -> {:?}", *step, next);
        *step = next;
    };

    let res = slave.run(|txn| {
        advance(&mut step, Step::Selected);
        txn.write(&[Command::ConvertTemperature.op_code()])?;
        advance(&mut step, Step::ConvertIssued);

        advance(&mut step, Step::Waiting);
        delay.delay_us(latency.as_micros().min(u32::MAX as u128) as u32);

        txn.reselect()?;
        advance(&mut step, Step::Reselected);
        txn.write(&[Command::ReadScratchpad.op_code()])?;
        let mut buf = [0u8; 9];
        let len = if crc { 9 } else { 8 };
        txn.read(&mut buf[..len])?;
        advance(&mut step, Step::ScratchpadFetched);
        Ok(buf)
    });

    let buf = match res {
        Ok(buf) => buf,
        Err(e) => {
            if e.is_device_absent() {
                advance(&mut step, Step::Absent);
            }
            return Err(e);
        }
    };

    let scratchpad = if crc {
        Scratchpad::from_bytes(buf)
    } else {
        let mut payload = [0; 8];
        payload.copy_from_slice(&buf[..8]);
        Scratchpad::unchecked(payload)
    };
    let temperature = Temperature::from_scratchpad(buf[0], buf[1]);
    advance(&mut step, Step::Done);

    if scratchpad.verdict() == CrcVerdict::Invalid {
        warn!(
            "{}: conversion read crc mismatch, computed {:02x}: {}",
            slave.name(),
            scratchpad.computed_crc(),
            scratchpad
        );
    }
    debug!("{}: t={} ({:?})", slave.name(), temperature, scratchpad.verdict());
    Ok(Measurement {
        temperature,
        scratchpad,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedDs28ea00;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use onewire_bus::mock::{Event, MockOneWire};
    use onewire_bus::{Bus, OneWireCrc, OneWireError, rom};

    /// Records requested delays in microseconds.
    #[derive(Default)]
    struct RecordingDelay(Vec<u32>);

    impl DelayNs for RecordingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.0.push(ns / 1000);
        }

        fn delay_us(&mut self, us: u32) {
            self.0.push(us);
        }
    }

    fn rom() -> u64 {
        rom::from_parts(0x42, 0x00c0_ffee)
    }

    /// Notes whether the bus is locked each time it is asked to wait.
    struct LockWatch<'a> {
        bus: &'a Bus<MockOneWire>,
        locked: Vec<bool>,
    }

    impl DelayNs for LockWatch<'_> {
        fn delay_ns(&mut self, _: u32) {
            self.locked.push(format!("{:?}", self.bus).contains("locked: true"));
        }

        fn delay_us(&mut self, _: u32) {
            self.locked.push(format!("{:?}", self.bus).contains("locked: true"));
        }
    }

    #[test]
    fn decode_formula() {
        let t = Temperature::from_scratchpad(0x50, 0x05);
        assert_eq!(t.integer_part(), (0x05 << 4) | 0x05);
        assert_eq!(t.integer_part(), 85);
        assert_eq!(t.fraction_sixteenths(), 0);

        let t = Temperature::from_scratchpad(0x91, 0x01);
        assert_eq!(t.integer_part(), 25);
        assert_eq!(t.fraction_sixteenths(), 1);
        assert_eq!(t.to_fixed(), U12F4::from_num(25.0625));

        // sign bits are ignored
        let t = Temperature::from_scratchpad(0xa2, 0xf8);
        assert_eq!(t.integer_part(), 10);
        assert_eq!(t.fraction_sixteenths(), 2);
        assert_eq!(t.to_fixed(), U12F4::from_num(10.125));
    }

    #[test]
    fn measure_decodes_scripted_scratchpad() {
        let payload = [0x50, 0x05, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        let crc = OneWireCrc::compute(&payload);
        let mut reply = payload.to_vec();
        reply.push(crc);
        let mock = MockOneWire::new()
            .with_device(rom())
            .respond(0xbe, move |_| reply.clone());
        let journal = mock.journal();
        let bus = Bus::new(mock);

        let mut delay = RecordingDelay::default();
        let m = measure(&bus.slave(rom()), Duration::from_millis(750), true, &mut delay).unwrap();
        assert_eq!(m.temperature.integer_part(), 0x55);
        assert_eq!(m.temperature.fraction_sixteenths(), 0);
        assert_eq!(m.verdict(), CrcVerdict::Valid);
        assert_eq!(m.scratchpad.payload(), &payload);
        assert_eq!(delay.0, [750_000]);

        let mut expected_read = payload.to_vec();
        expected_read.push(crc);
        assert_eq!(
            journal.events(),
            [
                Event::ResetSelect {
                    rom: rom(),
                    present: true
                },
                Event::Write(vec![0x44]),
                Event::ResetSelect {
                    rom: rom(),
                    present: true
                },
                Event::Write(vec![0xbe]),
                Event::Read(expected_read),
            ]
        );
    }

    #[test]
    fn unchecked_read_is_not_invalid() {
        let mock = MockOneWire::new()
            .with_device(rom())
            .respond(0xbe, |_| vec![0x91, 0x01, 0, 0, 0x7f, 0xff, 0x0c, 0x10, 0x99]);
        let journal = mock.journal();
        let bus = Bus::new(mock);
        let m = measure(&bus.slave(rom()), Duration::ZERO, false, &mut NoopDelay::new()).unwrap();
        assert_eq!(m.verdict(), CrcVerdict::NotChecked);
        assert_eq!(m.scratchpad.check_byte(), None);
        assert_eq!(m.temperature.integer_part(), 25);
        assert!(matches!(
            journal.events().last(),
            Some(Event::Read(bytes)) if bytes.len() == 8
        ));
    }

    #[test]
    fn simulated_conversion() {
        let sim = SimulatedDs28ea00::new(rom()).with_temperature(U12F4::from_num(23.5));
        let bus = Bus::new(sim);
        let m = measure(&bus.slave(rom()), Duration::ZERO, true, &mut NoopDelay::new()).unwrap();
        assert_eq!(m.temperature.to_fixed(), U12F4::from_num(23.5));
        assert_eq!(m.temperature.integer_part(), 23);
        assert_eq!(m.temperature.fraction_sixteenths(), 8);
        assert!(m.scratchpad.is_valid());
        assert_eq!(bus.into_inner().conversions(), 1);
    }

    #[test]
    fn bus_stays_locked_through_wait() {
        let bus = Bus::new(MockOneWire::new().with_device(rom()));
        let mut watch = LockWatch {
            bus: &bus,
            locked: Vec::new(),
        };
        measure(&bus.slave(rom()), Duration::from_millis(10), true, &mut watch).unwrap();
        assert_eq!(watch.locked, [true]);
        assert!(format!("{bus:?}").contains("locked: false"));
    }

    #[test]
    fn absent_before_convert() {
        let bus = Bus::new(MockOneWire::new());
        let mut delay = RecordingDelay::default();
        let res = measure(&bus.slave(rom()), Duration::from_millis(750), true, &mut delay);
        assert!(matches!(res, Err(OneWireError::NoDevicePresent)));
        assert!(delay.0.is_empty());
    }

    #[test]
    fn absent_at_reselect_discards_partial_state() {
        let mock = MockOneWire::new()
            .with_device(rom())
            .fail_selects_after(1);
        let journal = mock.journal();
        let bus = Bus::new(mock);
        let mut delay = RecordingDelay::default();
        let res = measure(&bus.slave(rom()), Duration::from_millis(100), true, &mut delay);
        assert!(matches!(res, Err(OneWireError::NoDevicePresent)));
        // waited, then lost the device on reselect; nothing was read
        assert_eq!(delay.0, [100_000]);
        assert!(!journal.events().iter().any(|e| matches!(e, Event::Read(_))));
    }
}
