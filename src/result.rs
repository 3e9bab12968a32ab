use core::fmt::{Debug, Display, Formatter, Result as FmtResult};

/// Temperature reported by the sentinel API when a conversion could not be read
pub const INVALID_CONVERSION: f32 = -1000.0;

/// Error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E: Sized + Debug> {
    /// Wire not high
    WireFault,
    /// No presence on wire
    NoPresence,
    /// Both the id bit and its complement read high during a search
    SearchFault { bit: u8 },
    /// Computed and received checksum differ
    CrcMismatch(u8, u8),
    /// Operation needs a device family this driver does not handle
    UnsupportedFamily(u8),
    /// Conversion resolution outside of 9..=12 bits
    InvalidResolution(u8),
    /// Device registry has no room left
    RegistryFull,
    /// Power control line could not be switched
    PowerPinFault,
    PortError(E),
}

impl<E: Sized + Debug> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::PortError(e)
    }
}

impl<E: Sized + Debug> Display for Error<E> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Error::WireFault => write!(f, "wire does not float high"),
            Error::NoPresence => write!(f, "no devices responding"),
            Error::SearchFault { bit } => {
                write!(f, "no device answered search bit {}", bit)
            }
            Error::CrcMismatch(computed, expected) => write!(
                f,
                "crc mismatch: computed {:#04x}, expected {:#04x}",
                computed, expected
            ),
            Error::UnsupportedFamily(code) => {
                write!(f, "unsupported device family {:#04x}", code)
            }
            Error::InvalidResolution(bits) => write!(f, "invalid resolution of {} bits", bits),
            Error::RegistryFull => write!(f, "device registry is full"),
            Error::PowerPinFault => write!(f, "failed to switch power pin"),
            Error::PortError(e) => write!(f, "port error: {:?}", e),
        }
    }
}
