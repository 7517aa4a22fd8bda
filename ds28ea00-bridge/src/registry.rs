use std::collections::BTreeMap;

use ds28ea00::Ds28ea00;
use log::{debug, info};
use onewire_bus::{Bus, rom};

use crate::{BridgeConfig, BridgeError, Endpoint, ProtocolBridge};

/// DS28EA00 slaves attached on one bus.
///
/// The owner of the bus calls [`FamilyRegistry::attach`] when a slave appears and
/// [`FamilyRegistry::detach`] when it goes away. Nothing registers itself.
#[derive(Debug)]
pub struct FamilyRegistry<'a, T, D> {
    bus: &'a Bus<T>,
    config: BridgeConfig,
    make_delay: fn() -> D,
    slaves: BTreeMap<u64, ProtocolBridge<'a, T, D>>,
}

impl<'a, T, D> FamilyRegistry<'a, T, D> {
    /// Family code handled by this registry.
    pub const FAMILY: u8 = Ds28ea00::<'a, T>::family();

    /// Empty registry for `bus`. Every attached slave gets `config` and a delay from
    /// `make_delay`.
    pub fn new(bus: &'a Bus<T>, config: BridgeConfig, make_delay: fn() -> D) -> Self {
        Self {
            bus,
            config,
            make_delay,
            slaves: BTreeMap::new(),
        }
    }

    /// Attaches the slave with ROM code `rom` and returns its bridge.
    ///
    /// The family code must be `0x42` and the ROM CRC must match. No bus traffic is
    /// generated.
    pub fn attach(&mut self, rom: u64) -> Result<&ProtocolBridge<'a, T, D>, BridgeError> {
        let family = rom::family(rom);
        if family != Self::FAMILY {
            return Err(BridgeError::WrongFamily(family));
        }
        if !rom::is_valid(rom) {
            return Err(BridgeError::InvalidRom(rom));
        }
        if self.slaves.contains_key(&rom) {
            return Err(BridgeError::AlreadyAttached(rom::name(rom)));
        }
        let bridge = ProtocolBridge::new(self.bus.slave(rom), &self.config, (self.make_delay)());
        info!(
            "{}: attached ({})",
            rom::name(rom),
            Endpoint::ALL.map(|e| e.name()).join(", ")
        );
        Ok(self.slaves.entry(rom).or_insert(bridge))
    }

    /// Detaches the slave with ROM code `rom`.
    pub fn detach(&mut self, rom: u64) -> Result<(), BridgeError> {
        match self.slaves.remove(&rom) {
            Some(_) => {
                debug!("{}: detached", rom::name(rom));
                Ok(())
            }
            None => Err(BridgeError::NotAttached(rom::name(rom))),
        }
    }

    /// Bridge of an attached slave.
    pub fn get(&self, rom: u64) -> Option<&ProtocolBridge<'a, T, D>> {
        self.slaves.get(&rom)
    }

    /// Bridge of an attached slave, looked up by its `42-0123456789ab` name.
    pub fn find(&self, name: &str) -> Option<&ProtocolBridge<'a, T, D>> {
        rom::parse(name).and_then(|rom| self.get(rom))
    }

    /// Attached slaves in ROM code order.
    pub fn slaves(&self) -> impl Iterator<Item = &ProtocolBridge<'a, T, D>> {
        self.slaves.values()
    }

    /// Endpoints every attached slave exposes.
    pub fn endpoints(&self) -> &'static [Endpoint] {
        &Endpoint::ALL
    }

    /// Number of attached slaves.
    pub fn len(&self) -> usize {
        self.slaves.len()
    }

    /// Whether nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.slaves.is_empty()
    }
}
