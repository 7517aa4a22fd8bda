use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use ds28ea00::{ReadoutResolution, sim::SimulatedDs28ea00};
use ds28ea00_bridge::{Attributes, BridgeConfig, Endpoint, FamilyRegistry, PioEncoding};
use fixed::types::U12F4;
use onewire_bus::{Bus, rom};

/// Attach a simulated DS28EA00 to a bus and use its endpoints
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// ROM code, `42-0123456789ab` or 16 hex digits
    #[arg(short, long, default_value = "42-000000000001", value_parser = parse_rom)]
    rom: u64,
    /// Temperature the simulated device converts to
    #[arg(short, long, default_value = "21.5", value_parser = parse_temperature)]
    temperature: U12F4,
    /// Simulate a device that does not answer
    #[arg(long)]
    absent: bool,
    /// Send the scratchpad with a damaged CRC byte
    #[arg(long)]
    corrupt_crc: bool,
    /// Conversion wait in milliseconds, overrides --resolution
    #[arg(short, long)]
    latency_ms: Option<u64>,
    /// Resolution whose conversion time to wait for
    #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u8).range(9..=12))]
    resolution: u8,
    /// Read conversions without the CRC byte
    #[arg(long)]
    no_crc: bool,
    /// How the first byte of a pio_value write maps to the latches
    #[arg(short, long, value_enum, default_value_t = Encoding::Preset)]
    encoding: Encoding,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the endpoints of the device
    List,
    /// Read an endpoint
    Read {
        /// scratchpad, therm or pio_value
        endpoint: Endpoint,
        /// Number of reads
        #[arg(short, long, default_value_t = 1)]
        count: u32,
    },
    /// Write a payload to an endpoint
    Write {
        /// Endpoint to write
        endpoint: Endpoint,
        /// Payload bytes, as given
        payload: String,
    },
}

#[derive(ValueEnum, Copy, Clone, Debug)]
enum Encoding {
    /// '0' turns both outputs off, other bytes are XORed with 0xff
    Preset,
    /// Every byte is XORed with 0xff
    Xor,
}

impl From<Encoding> for PioEncoding {
    fn from(e: Encoding) -> Self {
        match e {
            Encoding::Preset => PioEncoding::default(),
            Encoding::Xor => PioEncoding::Xor { base: 0xff },
        }
    }
}

fn parse_rom(s: &str) -> Result<u64, String> {
    rom::parse(s).ok_or_else(|| format!("invalid ROM code {s:?}"))
}

fn parse_temperature(s: &str) -> Result<U12F4, String> {
    s.parse::<U12F4>().map_err(|e| e.to_string())
}

fn resolution(bits: u8) -> ReadoutResolution {
    use ReadoutResolution::*;
    [Resolution9bit, Resolution10bit, Resolution11bit, Resolution12bit]
        .into_iter()
        .find(|r| r.bits() == bits)
        .unwrap_or_default()
}

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::init();
    // Parse command line arguments
    let args = Args::parse();

    let sim = SimulatedDs28ea00::new(args.rom)
        .with_temperature(args.temperature)
        .with_present(!args.absent)
        .with_corrupt_crc(args.corrupt_crc);
    let bus = Bus::new(sim);

    let config = BridgeConfig::default()
        .with_crc(!args.no_crc)
        .with_pio_encoding(args.encoding.into());
    let config = match args.latency_ms {
        Some(ms) => config.with_latency(Duration::from_millis(ms)),
        None => config.with_resolution(resolution(args.resolution)),
    };

    let mut registry = FamilyRegistry::new(&bus, config, || linux_embedded_hal::Delay);
    let bridge = match registry.attach(args.rom) {
        Ok(bridge) => bridge,
        Err(e) => {
            log::error!("{}: {e}", rom::name(args.rom));
            return ExitCode::FAILURE;
        }
    };

    match args.command {
        Command::List => {
            for endpoint in Endpoint::ALL {
                println!("{}/{} {}", bridge.name(), endpoint, endpoint.mode());
            }
        }
        Command::Read { endpoint, count } => {
            for _ in 0..count {
                match bridge.read(endpoint) {
                    Ok(text) if text.is_empty() => {
                        log::error!("{}: no device present", bridge.name());
                        return ExitCode::FAILURE;
                    }
                    Ok(text) => print!("{text}"),
                    Err(e) => {
                        log::error!("{}/{endpoint}: {e}", bridge.name());
                        return ExitCode::FAILURE;
                    }
                }
            }
        }
        Command::Write { endpoint, payload } => {
            match bridge.write(endpoint, payload.as_bytes()) {
                Ok(n) => println!("{n}"),
                Err(e) => {
                    log::error!("{}/{endpoint}: {e}", bridge.name());
                    return ExitCode::FAILURE;
                }
            }
        }
    }
    ExitCode::SUCCESS
}
