#![no_std]
#![doc = include_str!("../README.md")]

mod address;
mod command;
pub mod crc;
mod driver;
mod family;
mod iowire;
mod power;
mod registry;
mod result;
mod scratchpad;
mod search;
#[cfg(feature = "thermometer")]
mod sensor;
#[cfg(feature = "thermometer")]
mod thermometer;

pub use address::{Address, AddressError};
pub use command::{Command, FunctionCommand, OpCode, Target};
pub use crc::compute_partial_crc8;
pub use driver::{Driver, DEFAULT_CAPACITY};
pub use family::{Family, Resolution};
pub use iowire::{Inverted, IoWire};
pub use power::{NoPowerPin, Polarity, PowerPin};
pub use registry::Registry;
pub use result::{Error, INVALID_CONVERSION};
pub use scratchpad::Scratchpad;
pub use search::{DeviceSearch, DeviceSearchIter};
#[cfg(feature = "thermometer")]
pub use sensor::Sensor;
#[cfg(feature = "thermometer")]
pub use thermometer::{TemperatureUnit, Thermometer};
