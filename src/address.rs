use crate::{crc, Error, Family};
use core::{
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    ops::{Deref, DerefMut},
    str::FromStr,
};

/// 64 bit ROM code: family code, 48 bit serial number and CRC-8
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Address {
    raw: [u8; Self::BYTES as usize],
}

impl Default for Address {
    fn default() -> Self {
        Self::from([0; Self::BYTES as usize])
    }
}

impl From<[u8; Self::BYTES as usize]> for Address {
    fn from(raw: [u8; Self::BYTES as usize]) -> Self {
        Address { raw }
    }
}

impl From<Address> for [u8; Address::BYTES as usize] {
    fn from(addr: Address) -> [u8; Address::BYTES as usize] {
        addr.raw
    }
}

impl Deref for Address {
    type Target = [u8; Self::BYTES as usize];

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

impl DerefMut for Address {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.raw
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        self.deref() as _
    }
}

impl AsMut<[u8]> for Address {
    fn as_mut(&mut self) -> &mut [u8] {
        self.deref_mut() as _
    }
}

impl Address {
    /// The length of device address in bytes
    pub const BYTES: u8 = 8;

    /// The length of device address in bits
    pub const BITS: u8 = Self::BYTES * 8;

    pub fn family_code(&self) -> u8 {
        self[0]
    }

    pub fn family(&self) -> Family {
        Family::from(self.family_code())
    }

    /// CRC-8 over family code and serial number
    pub fn crc8(&self) -> u8 {
        crc::checksum(&self[..7])
    }

    pub fn is_crc_valid(&self) -> bool {
        self.crc8() == self[7]
    }

    pub fn ensure_correct_crc8<E: Debug>(&self) -> Result<(), Error<E>> {
        let computed = self.crc8();
        if computed != self[7] {
            Err(Error::CrcMismatch(computed, self[7]))
        } else {
            Ok(())
        }
    }

    /// Lenient parser for previously stored addresses
    ///
    /// Consumes two characters per byte for 16 characters. Characters that are
    /// not hex digits end the byte early and missing characters count as zero,
    /// so malformed input yields an unchecked address instead of an error.
    /// Use [`str::parse`] to reject such input.
    pub fn from_hex(hex: &str) -> Self {
        let mut addr = Address::default();
        let mut chars = hex.bytes();
        for byte in addr.iter_mut() {
            let pair = [chars.next(), chars.next()];
            *byte = pair
                .iter()
                .map_while(|c| c.and_then(|c| hex_to_u8(c as char)))
                .fold(0u8, |acc, nibble| (acc << 4) | nibble);
        }
        addr
    }
}

/// Error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressError {
    NotEnough,
    Invalid,
}

fn hex_to_u8(c: char) -> Option<u8> {
    c.to_digit(16).map(|d| d as u8)
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut addr = Address::default();
        let mut chars = s.chars().filter(|c| !c.is_whitespace() && *c != ':');

        for i in 0..Self::BYTES as usize {
            match (chars.next(), chars.next()) {
                (Some(h), Some(l)) => match (hex_to_u8(h), hex_to_u8(l)) {
                    (Some(h), Some(l)) => {
                        addr[i] = (h << 4) | l;
                    }
                    _ => return Err(AddressError::Invalid),
                },
                _ => return Err(AddressError::NotEnough),
            }
        }

        if chars.next().is_some() {
            return Err(AddressError::Invalid);
        }

        Ok(addr)
    }
}

/// Formats as 16 uppercase hex digits, the form [`Address::from_hex`] reads back
impl Display for Address {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        for byte in self.iter() {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}
