use crate::{crc, Error};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use core::{
    fmt::Debug,
    ops::{Deref, DerefMut},
};

/// Image of a device's scratch-pad RAM, as last read from or written to the bus
///
/// | byte | content                                         |
/// |------|-------------------------------------------------|
/// | 0..2 | raw temperature, two's complement little endian |
/// | 2..4 | alarm thresholds (T(H), T(L)) / user bytes      |
/// | 4    | configuration register (resolution bits 5..6)   |
/// | 6    | count remain (DS18S20 only)                     |
/// | 7    | count per degree (DS18S20 only)                 |
/// | 8    | CRC-8 of bytes 0..8                             |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct Scratchpad {
    raw: [u8; Self::BYTES],
}

impl Scratchpad {
    pub const BYTES: usize = 9;

    pub const CONFIG_RESOLUTION_MASK: u8 = 0x60;

    pub fn raw_temperature(&self) -> i16 {
        LittleEndian::read_i16(&self.raw[0..2])
    }

    /// T(H) in the high byte, T(L) in the low byte
    pub fn thresholds(&self) -> u16 {
        BigEndian::read_u16(&self.raw[2..4])
    }

    pub fn set_thresholds(&mut self, thresholds: u16) {
        BigEndian::write_u16(&mut self.raw[2..4], thresholds);
    }

    pub fn config(&self) -> u8 {
        self.raw[4]
    }

    pub fn set_config(&mut self, config: u8) {
        self.raw[4] = config;
    }

    pub fn count_remain(&self) -> u8 {
        self.raw[6]
    }

    pub fn count_per_degree(&self) -> u8 {
        self.raw[7]
    }

    pub fn crc8(&self) -> u8 {
        self.raw[8]
    }

    pub fn computed_crc8(&self) -> u8 {
        crc::checksum(&self.raw[..8])
    }

    pub fn is_crc_valid(&self) -> bool {
        self.computed_crc8() == self.crc8()
    }

    pub fn ensure_crc<E: Debug>(&self) -> Result<(), Error<E>> {
        if self.is_crc_valid() {
            Ok(())
        } else {
            Err(Error::CrcMismatch(self.computed_crc8(), self.crc8()))
        }
    }

    pub fn clear(&mut self) {
        self.raw = [0; Self::BYTES];
    }
}

impl From<[u8; Scratchpad::BYTES]> for Scratchpad {
    fn from(raw: [u8; Scratchpad::BYTES]) -> Self {
        Scratchpad { raw }
    }
}

impl Deref for Scratchpad {
    type Target = [u8; Scratchpad::BYTES];

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

impl DerefMut for Scratchpad {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.raw
    }
}
