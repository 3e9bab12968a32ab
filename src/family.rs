use crate::Scratchpad;

/// Device type, identified by the first byte of the ROM code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// 9 bit thermometer with count remain refinement, also the older DS1820
    Ds18s20,
    /// 9 to 12 bit thermometer, also known as MAX31820
    Ds18b20,
    /// 9 to 12 bit thermometer
    Ds1822,
    /// 12 bit thermometer with 1k EEPROM
    Max31826,
    /// Real time clock
    Ds2404,
    /// Real time clock
    Ds2417,
    /// Current measurement
    Ds2740,
    /// 1k EEPROM
    Ds2502,
    Unknown(u8),
}

impl From<u8> for Family {
    fn from(code: u8) -> Self {
        match code {
            0x10 => Family::Ds18s20,
            0x28 => Family::Ds18b20,
            0x22 => Family::Ds1822,
            0x3B => Family::Max31826,
            0x04 => Family::Ds2404,
            0x27 => Family::Ds2417,
            0x36 => Family::Ds2740,
            0x09 => Family::Ds2502,
            other => Family::Unknown(other),
        }
    }
}

impl From<Family> for u8 {
    fn from(family: Family) -> u8 {
        family.code()
    }
}

impl Family {
    /// Conversion time when nothing better is known
    pub const DEFAULT_CONVERSION_TIME_MS: u16 = 750;

    pub fn code(&self) -> u8 {
        match self {
            Family::Ds18s20 => 0x10,
            Family::Ds18b20 => 0x28,
            Family::Ds1822 => 0x22,
            Family::Max31826 => 0x3B,
            Family::Ds2404 => 0x04,
            Family::Ds2417 => 0x27,
            Family::Ds2740 => 0x36,
            Family::Ds2502 => 0x09,
            Family::Unknown(code) => *code,
        }
    }

    pub fn is_thermometer(&self) -> bool {
        matches!(
            self,
            Family::Ds18s20 | Family::Ds18b20 | Family::Ds1822 | Family::Max31826
        )
    }

    /// Whether scratch-pad writes carry the configuration byte after the thresholds
    pub fn has_config_register(&self) -> bool {
        matches!(self, Family::Ds18s20 | Family::Ds18b20 | Family::Ds1822)
    }

    /// Worst case conversion time for the resolution selected in `config`
    pub fn conversion_time_ms(&self, config: u8) -> u16 {
        match self {
            Family::Ds18b20 | Family::Ds1822 => {
                Resolution::from_config(config).conversion_time_ms()
            }
            Family::Max31826 => 150,
            _ => Self::DEFAULT_CONVERSION_TIME_MS,
        }
    }

    /// Decodes the temperature held in `scratchpad`
    ///
    /// Returns `None` for families that are no thermometer this driver knows of.
    pub fn celsius(&self, scratchpad: &Scratchpad) -> Option<f32> {
        let raw = scratchpad.raw_temperature();
        match self {
            Family::Ds18b20 | Family::Ds1822 | Family::Max31826 => Some(f32::from(raw) / 16.0),
            Family::Ds18s20 => {
                let count_per_degree = f32::from(scratchpad.count_per_degree());
                if count_per_degree == 0.0 {
                    return Some(f32::from(raw) / 2.0);
                }
                let count_remain = f32::from(scratchpad.count_remain());
                Some(
                    f32::from(raw.div_euclid(2)) - 0.25
                        + (count_per_degree - count_remain) / count_per_degree,
                )
            }
            _ => None,
        }
    }
}

/// Conversion resolution of thermometers with a configuration register
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Resolution {
    Bits9 = 0b0000_0000,
    Bits10 = 0b0010_0000,
    Bits11 = 0b0100_0000,
    Bits12 = 0b0110_0000,
}

impl Resolution {
    pub fn from_bits(bits: u8) -> Option<Resolution> {
        match bits {
            9 => Some(Resolution::Bits9),
            10 => Some(Resolution::Bits10),
            11 => Some(Resolution::Bits11),
            12 => Some(Resolution::Bits12),
            _ => None,
        }
    }

    pub fn bits(&self) -> u8 {
        match self {
            Resolution::Bits9 => 9,
            Resolution::Bits10 => 10,
            Resolution::Bits11 => 11,
            Resolution::Bits12 => 12,
        }
    }

    pub fn from_config(config: u8) -> Resolution {
        match config & Scratchpad::CONFIG_RESOLUTION_MASK {
            0b0000_0000 => Resolution::Bits9,
            0b0010_0000 => Resolution::Bits10,
            0b0100_0000 => Resolution::Bits11,
            _ => Resolution::Bits12,
        }
    }

    /// Bits 5 and 6 of the configuration register
    pub fn config_bits(&self) -> u8 {
        *self as u8
    }

    pub fn conversion_time_ms(&self) -> u16 {
        match self {
            Resolution::Bits9 => 94,
            Resolution::Bits10 => 188,
            Resolution::Bits11 => 375,
            Resolution::Bits12 => 750,
        }
    }
}
