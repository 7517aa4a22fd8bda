use core::fmt::Debug;
use core::time::Duration;

use ds28ea00::{DEFAULT_CONVERSION_LATENCY, Ds28ea00, PIO_WRITE_ACK, ReadoutResolution};
use embedded_hal::delay::DelayNs;
use log::{debug, warn};
use onewire_bus::{OneWire, Slave};
use parking_lot::Mutex;

use crate::{Attributes, BridgeError, Endpoint, PioEncoding, format};

/// Settings applied to every device a bridge is built for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pio_encoding: PioEncoding,
    latency: Duration,
    crc: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            pio_encoding: PioEncoding::default(),
            latency: DEFAULT_CONVERSION_LATENCY,
            crc: true,
        }
    }
}

impl BridgeConfig {
    /// How `pio_value` writes map to latch bytes.
    pub fn with_pio_encoding(mut self, encoding: PioEncoding) -> Self {
        self.pio_encoding = encoding;
        self
    }

    /// Conversion wait for `therm` reads.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Conversion wait for `therm` reads, as the worst case at `resolution`.
    pub fn with_resolution(mut self, resolution: ReadoutResolution) -> Self {
        self.latency = resolution.conversion_time();
        self
    }

    /// Whether `therm` reads fetch and check the CRC byte.
    pub fn with_crc(mut self, crc: bool) -> Self {
        self.crc = crc;
        self
    }

    /// Configured PIO encoding.
    pub fn pio_encoding(&self) -> PioEncoding {
        self.pio_encoding
    }

    /// Configured conversion wait.
    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// Whether `therm` reads check the CRC.
    pub fn crc(&self) -> bool {
        self.crc
    }
}

/// Result of a PIO write: the latch byte sent and the byte the device answered with.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PioWrite {
    /// Latch byte sent after encoding.
    pub value: u8,
    /// Confirmation byte read back.
    pub confirmation: u8,
}

impl PioWrite {
    /// Whether the device acknowledged with `0xAA`.
    pub fn acknowledged(&self) -> bool {
        self.confirmation == PIO_WRITE_ACK
    }
}

/// Text endpoints of one DS28EA00.
///
/// The conversion delay sits behind its own lock, taken before the bus lock for the
/// length of a `therm` read.
#[derive(Debug)]
pub struct ProtocolBridge<'a, T, D> {
    device: Ds28ea00<'a, T>,
    encoding: PioEncoding,
    delay: Mutex<D>,
}

impl<'a, T, D> ProtocolBridge<'a, T, D> {
    /// Bridge for `slave` with the settings of `config`.
    pub fn new(slave: Slave<'a, T>, config: &BridgeConfig, delay: D) -> Self {
        let device = Ds28ea00::new(slave)
            .with_latency(config.latency)
            .with_crc(config.crc);
        Self {
            device,
            encoding: config.pio_encoding,
            delay: Mutex::new(delay),
        }
    }

    /// The underlying driver.
    pub fn device(&self) -> &Ds28ea00<'a, T> {
        &self.device
    }

    /// Slave name, `42-0123456789ab`.
    pub fn name(&self) -> String {
        self.device.slave().name()
    }

    /// ROM code of the slave.
    pub fn rom(&self) -> u64 {
        self.device.slave().rom()
    }
}

impl<T, D> ProtocolBridge<'_, T, D>
where
    T: OneWire,
    T::BusError: Debug,
{
    /// Encodes the first byte of `data` and writes it to the PIO latches.
    ///
    /// An empty `data` is rejected before the bus is touched. The rest of `data` is ignored.
    pub fn write_pio(&self, data: &[u8]) -> Result<PioWrite, BridgeError> {
        let Some(&first) = data.first() else {
            return Err(BridgeError::InvalidInput);
        };
        let value = self.encoding.encode(first);
        match self.device.write_pio(value) {
            Ok(confirmation) => {
                debug!("{}: pio_value {:02x} -> {:02x}", self.name(), first, value);
                Ok(PioWrite {
                    value,
                    confirmation,
                })
            }
            Err(e) => {
                if e.is_device_absent() {
                    warn!("{}: pio_value write, no device present", self.name());
                }
                Err(e.into())
            }
        }
    }
}

impl<T, D> Attributes for ProtocolBridge<'_, T, D>
where
    T: OneWire,
    T::BusError: Debug,
    D: DelayNs,
{
    fn read(&self, endpoint: Endpoint) -> Result<String, BridgeError> {
        let res = match endpoint {
            Endpoint::Scratchpad => self
                .device
                .read_scratchpad()
                .map(|pad| format::scratchpad(&pad)),
            Endpoint::Therm => {
                let mut delay = self.delay.lock();
                self.device.measure(&mut *delay).map(|m| format::therm(&m))
            }
            Endpoint::PioValue => self.device.read_pio_status().map(format::pio_status),
        };
        match res {
            Ok(text) => Ok(text),
            Err(e) if e.is_device_absent() => {
                warn!("{}: {} read, no device present", self.name(), endpoint);
                Ok(String::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, endpoint: Endpoint, data: &[u8]) -> Result<usize, BridgeError> {
        if !endpoint.writable() {
            return Err(BridgeError::ReadOnly(endpoint));
        }
        self.write_pio(data)?;
        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ds28ea00::sim::SimulatedDs28ea00;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use fixed::types::U12F4;
    use onewire_bus::mock::{Event, MockOneWire};
    use onewire_bus::{Bus, OneWireCrc, rom};

    fn rom() -> u64 {
        rom::from_parts(0x42, 0x0000_0000_beef)
    }

    fn fast() -> BridgeConfig {
        BridgeConfig::default().with_latency(Duration::ZERO)
    }

    #[test]
    fn default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.latency(), Duration::from_millis(750));
        assert!(config.crc());
        assert_eq!(
            config.pio_encoding(),
            PioEncoding::PresetOnZero {
                base: 0xff,
                preset: 0xff
            }
        );
        let config = config.with_resolution(ReadoutResolution::Resolution10bit);
        assert_eq!(config.latency(), Duration::from_micros(187500));
    }

    #[test]
    fn reads_simulated_device() {
        let _ = env_logger::builder().is_test(true).try_init();
        let sim = SimulatedDs28ea00::new(rom()).with_temperature(U12F4::from_num(23.5));
        let bus = Bus::new(sim);
        let bridge = ProtocolBridge::new(bus.slave(rom()), &fast(), NoopDelay::new());

        let pad = bridge.read(Endpoint::Scratchpad).unwrap();
        assert!(pad.starts_with("50 05 "));
        assert!(pad.ends_with(" YES\n"));

        let therm = bridge.read(Endpoint::Therm).unwrap();
        let lines: Vec<_> = therm.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("78 01 "));
        assert!(lines[0].ends_with(" YES"));
        assert!(lines[1].ends_with(" t=23.8"));

        assert_eq!(bridge.read(Endpoint::PioValue).unwrap(), "status=F\n");
    }

    #[test]
    fn corrupt_crc_reads_no() {
        let bus = Bus::new(SimulatedDs28ea00::new(rom()).with_corrupt_crc(true));
        let bridge = ProtocolBridge::new(bus.slave(rom()), &fast(), NoopDelay::new());
        assert!(bridge.read(Endpoint::Scratchpad).unwrap().ends_with(" NO\n"));
    }

    #[test]
    fn unchecked_therm() {
        let bus = Bus::new(SimulatedDs28ea00::new(rom()));
        let bridge = ProtocolBridge::new(
            bus.slave(rom()),
            &fast().with_crc(false),
            NoopDelay::new(),
        );
        let therm = bridge.read(Endpoint::Therm).unwrap();
        let lines: Vec<_> = therm.lines().collect();
        assert!(lines[0].contains(" -- : crc="));
        assert!(lines[0].ends_with(" N/A"));
        assert!(lines[1].ends_with(" -- t=21.0"));
    }

    #[test]
    fn absent_reads_empty_writes_fail() {
        let bus = Bus::new(SimulatedDs28ea00::new(rom()).with_present(false));
        let bridge = ProtocolBridge::new(bus.slave(rom()), &fast(), NoopDelay::new());
        for e in Endpoint::ALL {
            assert_eq!(bridge.read(e).unwrap(), "");
        }
        assert_eq!(
            bridge.write(Endpoint::PioValue, b"1"),
            Err(BridgeError::DeviceAbsent)
        );
    }

    #[test]
    fn empty_payload_never_reaches_bus() {
        let mock = MockOneWire::new().with_device(rom());
        let journal = mock.journal();
        let bus = Bus::new(mock);
        let bridge = ProtocolBridge::new(bus.slave(rom()), &fast(), NoopDelay::new());
        assert_eq!(
            bridge.write(Endpoint::PioValue, b""),
            Err(BridgeError::InvalidInput)
        );
        assert!(journal.events().is_empty());
    }

    #[test]
    fn read_only_endpoints() {
        let mock = MockOneWire::new().with_device(rom());
        let journal = mock.journal();
        let bus = Bus::new(mock);
        let bridge = ProtocolBridge::new(bus.slave(rom()), &fast(), NoopDelay::new());
        for e in [Endpoint::Scratchpad, Endpoint::Therm] {
            assert_eq!(bridge.write(e, b"1"), Err(BridgeError::ReadOnly(e)));
        }
        assert!(journal.events().is_empty());
    }

    #[test]
    fn write_encodes_first_byte() {
        let mock = MockOneWire::new()
            .with_device(rom())
            .respond(0xa5, |_| vec![PIO_WRITE_ACK]);
        let journal = mock.journal();
        let bus = Bus::new(mock);
        let config = fast().with_pio_encoding(PioEncoding::Xor { base: 0xff });
        let bridge = ProtocolBridge::new(bus.slave(rom()), &config, NoopDelay::new());

        assert_eq!(bridge.write(Endpoint::PioValue, b"\x01\x02\x03"), Ok(3));
        assert_eq!(
            journal.events(),
            [
                Event::ResetSelect {
                    rom: rom(),
                    present: true
                },
                Event::Write(vec![0xa5, 0xfe, 0x01]),
                Event::Read(vec![PIO_WRITE_ACK]),
            ]
        );
    }

    #[test]
    fn echo_confirmation_is_returned() {
        let mock = MockOneWire::new()
            .with_device(rom())
            .respond(0xa5, |frame| vec![frame[1]]);
        let bus = Bus::new(mock);
        let config = fast().with_pio_encoding(PioEncoding::Xor { base: 0 });
        let bridge = ProtocolBridge::new(bus.slave(rom()), &config, NoopDelay::new());
        let res = bridge.write_pio(&[0x00]).unwrap();
        assert_eq!(
            res,
            PioWrite {
                value: 0x00,
                confirmation: 0x00
            }
        );
        assert!(!res.acknowledged());
    }

    #[test]
    fn preset_on_zero_drives_simulated_latch() {
        let bus = Bus::new(SimulatedDs28ea00::new(rom()));
        let bridge = ProtocolBridge::new(bus.slave(rom()), &fast(), NoopDelay::new());

        // '0' selects the preset: both outputs off
        let res = bridge.write_pio(b"0").unwrap();
        assert_eq!(res.value, 0xff);
        assert!(res.acknowledged());

        // 0x03 -> 0xfc: both outputs on
        assert_eq!(bridge.write(Endpoint::PioValue, &[0x03]), Ok(1));
        assert_eq!(bridge.read(Endpoint::PioValue).unwrap(), "status=F0\n");
        assert_eq!(bus.into_inner().latch(), 0xfc);
    }

    #[test]
    fn scratchpad_crc_field_is_computed() {
        let payload = [0x91, 0x01, 0, 0, 0x7f, 0xff, 0x0c, 0x10];
        let crc = OneWireCrc::compute(&payload);
        let mut reply = payload.to_vec();
        reply.push(0x00);
        let mock = MockOneWire::new()
            .with_device(rom())
            .respond(0xbe, move |_| reply.clone());
        let bus = Bus::new(mock);
        let bridge = ProtocolBridge::new(bus.slave(rom()), &fast(), NoopDelay::new());
        assert_eq!(
            bridge.read(Endpoint::Scratchpad).unwrap(),
            format!("91 01 00 00 7f ff 0c 10 00 : crc={crc:02x} NO\n")
        );
    }
}
