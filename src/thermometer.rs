use crate::{
    Address, Driver, Error, Family, FunctionCommand, IoWire, Resolution, Scratchpad, Sensor,
    Target, INVALID_CONVERSION,
};
use core::fmt::Debug;
use embedded_hal::{delay::DelayNs, digital::OutputPin};
use log::warn;

/// Scale of the temperatures returned by [`Driver::temperature`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn convert(&self, celsius: f32) -> f32 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }
}

impl<E: Debug, W: IoWire<Error = E>, P: OutputPin, const N: usize> Driver<W, P, N> {
    /// Starts a temperature conversion and returns the milliseconds left until it is done
    ///
    /// The conversion time follows the family of the target and the resolution found
    /// in the scratch-pad image, if that image belongs to the target; otherwise, and
    /// for broadcasts, the slowest conversion is assumed. On a parasite
    /// powered bus the line is pulled up strongly for the whole conversion, so this
    /// blocks and returns `0`, as it does when `wait` is set.
    pub fn convert_temperature(
        &mut self,
        delay: &mut impl DelayNs,
        target: Target,
        wait: bool,
    ) -> Result<u16, Error<E>> {
        let time_ms = match target {
            Target::All => Family::DEFAULT_CONVERSION_TIME_MS,
            Target::Device(addr) => {
                let family = addr.family();
                if !family.is_thermometer() {
                    warn!("conversion time of family {:#04x} unknown", family.code());
                }
                if self.scratchpad_owner.as_ref() == Some(addr) {
                    family.conversion_time_ms(self.scratchpad.config())
                } else {
                    family.conversion_time_ms(Resolution::Bits12.config_bits())
                }
            }
        };

        self.select(delay, target)?;
        self.write_command(delay, FunctionCommand::ConvertTemperature)?;

        if self.parasite_mode {
            self.strong_pullup(delay, u32::from(time_ms))?;
            Ok(0)
        } else if wait {
            delay.delay_ms(u32::from(time_ms));
            Ok(0)
        } else {
            Ok(time_ms)
        }
    }

    /// Reads the result of the last conversion of `addr`
    ///
    /// Fails with [`Error::CrcMismatch`] if the scratch-pad did not arrive intact.
    /// Devices of unknown families report their raw reading unscaled.
    pub fn temperature(
        &mut self,
        delay: &mut impl DelayNs,
        addr: &Address,
        unit: TemperatureUnit,
    ) -> Result<f32, Error<E>> {
        let scratchpad = *self.read_scratchpad(delay, addr)?;
        scratchpad.ensure_crc::<E>()?;

        let celsius = decode_celsius(addr.family(), &scratchpad);
        Ok(unit.convert(celsius))
    }

    /// Like [`Driver::temperature`] but reports any failure as [`INVALID_CONVERSION`]
    pub fn temperature_or_invalid(
        &mut self,
        delay: &mut impl DelayNs,
        addr: &Address,
        unit: TemperatureUnit,
    ) -> f32 {
        self.temperature(delay, addr, unit)
            .unwrap_or(INVALID_CONVERSION)
    }

    /// Sets the conversion resolution of `addr` to `bits` (9 to 12)
    ///
    /// Merges the resolution into the configuration byte of the scratch-pad image and
    /// writes it back along with the thresholds. Unless the image already belongs to
    /// `addr` it is read from the device first, so its own thresholds survive. Nothing
    /// is touched when the family has no configuration register or `bits` is out of range.
    pub fn set_resolution(
        &mut self,
        delay: &mut impl DelayNs,
        addr: &Address,
        bits: u8,
    ) -> Result<(), Error<E>> {
        let family = addr.family();
        if !family.has_config_register() {
            return Err(Error::UnsupportedFamily(family.code()));
        }
        let resolution = Resolution::from_bits(bits).ok_or(Error::InvalidResolution(bits))?;

        if self.scratchpad_owner.as_ref() != Some(addr) {
            let scratchpad = *self.read_scratchpad(delay, addr)?;
            scratchpad.ensure_crc::<E>()?;
        }

        let config = (self.scratchpad.config() & !Scratchpad::CONFIG_RESOLUTION_MASK)
            | resolution.config_bits();
        self.scratchpad.set_config(config);
        let thresholds = self.scratchpad.thresholds();
        self.write_scratchpad(delay, addr, thresholds)
    }
}

fn decode_celsius(family: Family, scratchpad: &Scratchpad) -> f32 {
    family.celsius(scratchpad).unwrap_or_else(|| {
        warn!("unknown device family {:#04x}", family.code());
        f32::from(scratchpad.raw_temperature())
    })
}

/// Temperature sensor on the bus: one of the DS18x20 family or a MAX31826
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thermometer {
    address: Address,
    family: Family,
}

impl From<Thermometer> for Address {
    fn from(device: Thermometer) -> Self {
        device.address
    }
}

impl Thermometer {
    pub fn from_address<E: Sized + Debug>(address: Address) -> Result<Self, Error<E>> {
        let family = address.family();
        if family.is_thermometer() {
            Ok(Thermometer { address, family })
        } else {
            Err(Error::UnsupportedFamily(family.code()))
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn family(&self) -> Family {
        self.family
    }

    /// Reads the resolution from the configuration register
    ///
    /// Families without a configuration register report 12 bits.
    pub fn resolution<W: IoWire, P: OutputPin, const N: usize>(
        &self,
        driver: &mut Driver<W, P, N>,
        delay: &mut impl DelayNs,
    ) -> Result<Resolution, Error<W::Error>> {
        if !self.family.has_config_register() {
            return Ok(Resolution::Bits12);
        }
        let scratchpad = *driver.read_scratchpad(delay, &self.address)?;
        scratchpad.ensure_crc::<W::Error>()?;
        Ok(Resolution::from_config(scratchpad.config()))
    }
}

impl Sensor for Thermometer {
    fn start_measurement<W: IoWire, P: OutputPin, const N: usize>(
        &self,
        driver: &mut Driver<W, P, N>,
        delay: &mut impl DelayNs,
    ) -> Result<u16, Error<W::Error>> {
        driver.convert_temperature(delay, Target::Device(&self.address), false)
    }

    fn read_measurement<W: IoWire, P: OutputPin, const N: usize>(
        &self,
        driver: &mut Driver<W, P, N>,
        delay: &mut impl DelayNs,
    ) -> Result<f32, Error<W::Error>> {
        driver.temperature(delay, &self.address, TemperatureUnit::Celsius)
    }

    fn read_measurement_raw<W: IoWire, P: OutputPin, const N: usize>(
        &self,
        driver: &mut Driver<W, P, N>,
        delay: &mut impl DelayNs,
    ) -> Result<i16, Error<W::Error>> {
        let scratchpad = *driver.read_scratchpad(delay, &self.address)?;
        scratchpad.ensure_crc::<W::Error>()?;
        Ok(scratchpad.raw_temperature())
    }
}
