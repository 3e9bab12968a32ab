use crate::{
    Address, Command, Error, FunctionCommand, IoWire, NoPowerPin, OpCode, Polarity, PowerPin,
    Registry, Scratchpad, Target,
};
use core::fmt::Debug;
use embedded_hal::{delay::DelayNs, digital::OutputPin};
use log::{debug, warn};

/// Registry capacity of drivers built with [`Driver::new`] and [`Driver::with_power_pin`]
pub const DEFAULT_CAPACITY: usize = 16;

/// Bus master for a single 1-Wire data line
///
/// Owns the line, the optional power control pin, the scratch-pad image of the
/// device last talked to and the registry of discovered devices.
pub struct Driver<W: IoWire, P: OutputPin = NoPowerPin, const N: usize = DEFAULT_CAPACITY> {
    io_wire: W,
    pub(crate) power_pin: Option<PowerPin<P>>,
    pub(crate) parasite_mode: bool,
    pub(crate) scratchpad: Scratchpad,
    /// Device the scratch-pad image was last exchanged with
    pub(crate) scratchpad_owner: Option<Address>,
    pub(crate) registry: Registry<N>,
}

impl<W: IoWire> Driver<W> {
    pub fn new(io_wire: W) -> Self {
        Driver {
            io_wire,
            power_pin: None,
            parasite_mode: false,
            scratchpad: Scratchpad::default(),
            scratchpad_owner: None,
            registry: Registry::new(),
        }
    }
}

impl<W: IoWire, P: OutputPin> Driver<W, P> {
    /// Bus whose parasite powered devices are fed through an external MOSFET on `power_pin`
    pub fn with_power_pin(io_wire: W, power_pin: P, polarity: Polarity) -> Self {
        Driver {
            io_wire,
            power_pin: Some(PowerPin::new(power_pin, polarity)),
            parasite_mode: false,
            scratchpad: Scratchpad::default(),
            scratchpad_owner: None,
            registry: Registry::new(),
        }
    }
}

impl<E: Debug, W: IoWire<Error = E>, P: OutputPin, const N: usize> Driver<W, P, N> {
    /// Rebuilds the driver with room for `M` devices, forgetting all known devices
    pub fn with_capacity<const M: usize>(self) -> Driver<W, P, M> {
        Driver {
            io_wire: self.io_wire,
            power_pin: self.power_pin,
            parasite_mode: self.parasite_mode,
            scratchpad: self.scratchpad,
            scratchpad_owner: self.scratchpad_owner,
            registry: Registry::new(),
        }
    }

    /// Gives back the data line and the power control pin
    pub fn release_parts(self) -> (W, Option<P>) {
        (self.io_wire, self.power_pin.map(PowerPin::into_inner))
    }

    /// Clears all driver state and finds out whether any device is parasite powered
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<E>> {
        self.scratchpad.clear();
        self.scratchpad_owner = None;
        self.registry.clear();
        self.parasite_mode = match self.power_supply_available(delay, Target::All) {
            Ok(powered) => !powered,
            Err(Error::NoPresence) => {
                warn!("no devices responding during init");
                false
            }
            Err(e) => return Err(e),
        };
        debug!("parasite power: {}", self.parasite_mode);
        Ok(())
    }

    pub fn is_parasite_power(&self) -> bool {
        self.parasite_mode
    }

    pub fn set_parasite_power(&mut self, parasite_mode: bool) {
        self.parasite_mode = parasite_mode;
    }

    /// Scratch-pad image of the last read or write
    pub fn scratchpad(&self) -> &Scratchpad {
        &self.scratchpad
    }

    pub fn registry(&self) -> &Registry<N> {
        &self.registry
    }

    /// Address of a previously found device, in discovery order
    ///
    /// # Panics
    ///
    /// If `index` is not below the count returned by the last discovery.
    pub fn get_address(&self, index: usize) -> Address {
        self.registry.get(index)
    }

    /// Forgets all discovered devices
    pub fn clear_devices(&mut self) {
        self.registry.clear();
    }

    /// Resets the bus and selects a single device for the following function command
    pub fn match_rom(&mut self, delay: &mut impl DelayNs, addr: &Address) -> Result<(), Error<E>> {
        self.reset(delay)?;
        self.write_command(delay, Command::MatchRom)?;
        self.write_bytes(delay, addr.as_ref())?;
        Ok(())
    }

    /// Resets the bus and addresses every device with the following function command
    ///
    /// Only useful for commands all devices can answer at once without collisions.
    pub fn skip_rom(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<E>> {
        self.reset(delay)?;
        self.write_command(delay, Command::SkipRom)?;
        Ok(())
    }

    pub fn select(&mut self, delay: &mut impl DelayNs, target: Target) -> Result<(), Error<E>> {
        match target {
            Target::All => self.skip_rom(delay),
            Target::Device(addr) => self.match_rom(delay, addr),
        }
    }

    /// Reads the ROM code of the only device on the bus
    ///
    /// With more than one device the answers collide and the result is garbage,
    /// which [`Address::is_crc_valid`] will most likely reveal.
    pub fn single_device_read_rom(&mut self, delay: &mut impl DelayNs) -> Result<Address, Error<E>> {
        let mut address = Address::default();
        self.reset(delay)?;
        self.write_command(delay, Command::ReadRom)?;
        self.read_bytes(delay, address.as_mut())?;
        Ok(address)
    }

    /// Reads all 9 bytes of the scratch-pad of `addr` into the scratch-pad image
    pub fn read_scratchpad(
        &mut self,
        delay: &mut impl DelayNs,
        addr: &Address,
    ) -> Result<&Scratchpad, Error<E>> {
        let mut raw = [0u8; Scratchpad::BYTES];
        self.match_rom(delay, addr)?;
        self.write_command(delay, FunctionCommand::ReadScratchpad)?;
        self.read_bytes(delay, &mut raw)?;
        self.scratchpad = Scratchpad::from(raw);
        self.scratchpad_owner = Some(*addr);
        Ok(&self.scratchpad)
    }

    /// Stores `thresholds` (T(H) high byte, T(L) low byte) in the image and writes
    /// them to `addr`, followed by the configuration byte where the family has one
    pub fn write_scratchpad(
        &mut self,
        delay: &mut impl DelayNs,
        addr: &Address,
        thresholds: u16,
    ) -> Result<(), Error<E>> {
        self.scratchpad.set_thresholds(thresholds);
        let scratchpad = self.scratchpad;
        let len = if addr.family().has_config_register() {
            3
        } else {
            2
        };

        self.match_rom(delay, addr)?;
        self.write_command(delay, FunctionCommand::WriteScratchpad)?;
        self.write_bytes(delay, &scratchpad[2..2 + len])?;
        self.scratchpad_owner = Some(*addr);
        Ok(())
    }

    /// Whether the addressed devices have an external supply
    ///
    /// With [`Target::All`] a single parasite powered device answers `false`.
    pub fn power_supply_available(
        &mut self,
        delay: &mut impl DelayNs,
        target: Target,
    ) -> Result<bool, Error<E>> {
        self.select(delay, target)?;
        self.write_command(delay, FunctionCommand::ReadPowerSupply)?;
        Ok(self.read_bit(delay)?)
    }

    /// Performs a reset and listens for a presence pulse
    /// Returns Err(WireFault) if the wire seems to be shortened,
    /// Ok(()) if presence pulse has been received and Err(NoPresence)
    /// if no other device was detected but the wire seems to be ok
    pub fn reset(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<E>> {
        self.release()?;
        self.ensure_wire_high(delay)?;

        self.set_low()?;
        delay.delay_us(480);
        self.release()?;

        delay.delay_us(70);
        let presence = self.is_low()?;
        delay.delay_us(410);

        if presence {
            Ok(())
        } else {
            Err(Error::NoPresence)
        }
    }

    pub fn reset_presence(&mut self, delay: &mut impl DelayNs) -> Result<bool, Error<E>> {
        self.reset(delay).map(|_| true).or_else(|error| {
            if matches!(error, Error::NoPresence) {
                Ok(false)
            } else {
                Err(error)
            }
        })
    }

    fn ensure_wire_high(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<E>> {
        for _ in 0..125 {
            if self.is_high()? {
                return Ok(());
            }
            delay.delay_us(2);
        }
        Err(Error::WireFault)
    }

    pub fn read_bytes(&mut self, delay: &mut impl DelayNs, dst: &mut [u8]) -> Result<(), E> {
        for d in dst {
            *d = self.read_byte(delay)?;
        }
        Ok(())
    }

    /// Reads eight bits, least significant first
    pub fn read_byte(&mut self, delay: &mut impl DelayNs) -> Result<u8, E> {
        let mut byte = 0_u8;
        for _ in 0..8 {
            byte >>= 1;
            if self.read_bit(delay)? {
                byte |= 0x80;
            }
        }
        Ok(byte)
    }

    /// Read slot: 3 µs low pulse, sample 3 µs after releasing, then pad the slot
    pub fn read_bit(&mut self, delay: &mut impl DelayNs) -> Result<bool, E> {
        let val = critical_section::with(|_| {
            self.set_low()?;
            delay.delay_us(3);
            self.release()?;
            delay.delay_us(3);
            self.is_high()
        })?;
        delay.delay_us(45);
        Ok(val)
    }

    pub fn write_command(&mut self, delay: &mut impl DelayNs, cmd: impl OpCode) -> Result<(), E> {
        self.write_byte(delay, cmd.op_code())
    }

    pub fn write_bytes(&mut self, delay: &mut impl DelayNs, bytes: &[u8]) -> Result<(), E> {
        for b in bytes {
            self.write_byte(delay, *b)?;
        }
        Ok(())
    }

    /// Writes eight bits, least significant first
    pub fn write_byte(&mut self, delay: &mut impl DelayNs, byte: u8) -> Result<(), E> {
        let mut byte = byte;
        for _ in 0..8 {
            self.write_bit(delay, (byte & 0x01) == 0x01)?;
            byte >>= 1;
        }
        Ok(())
    }

    /// Write slot: a 3 µs low pulse writes a one, a 63 µs low pulse a zero
    pub fn write_bit(&mut self, delay: &mut impl DelayNs, high: bool) -> Result<(), E> {
        critical_section::with(|_| {
            self.set_low()?;
            delay.delay_us(3);
            if !high {
                delay.delay_us(60);
            }
            self.release()
        })?;
        delay.delay_us(if high { 55 } else { 5 });
        Ok(())
    }

    /// Feeds parasite powered devices for `ms` milliseconds after a power hungry command
    pub(crate) fn strong_pullup(&mut self, delay: &mut impl DelayNs, ms: u32) -> Result<(), Error<E>> {
        match self.power_pin.as_mut() {
            Some(pin) => {
                pin.enable().map_err(|_| Error::PowerPinFault)?;
                delay.delay_ms(ms);
                pin.disable().map_err(|_| Error::PowerPinFault)?;
            }
            None => {
                self.io_wire.drive_high()?;
                delay.delay_ms(ms);
                self.io_wire.release()?;
            }
        }
        Ok(())
    }

    #[inline(always)]
    pub(crate) fn release(&mut self) -> Result<(), E> {
        self.io_wire.release()
    }

    #[inline(always)]
    pub(crate) fn set_low(&mut self) -> Result<(), E> {
        self.io_wire.set_low()
    }

    #[inline(always)]
    pub(crate) fn is_high(&mut self) -> Result<bool, E> {
        self.io_wire.is_high()
    }

    #[inline(always)]
    pub(crate) fn is_low(&mut self) -> Result<bool, E> {
        self.io_wire.is_low()
    }
}
