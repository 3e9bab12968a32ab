pub trait OpCode {
    fn op_code(&self) -> u8;
}

/// ROM level commands, issued right after a reset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    MatchRom = 0x55,
    SearchRom = 0xF0,
    SkipRom = 0xCC,
    ReadRom = 0x33,
}

impl OpCode for Command {
    fn op_code(&self) -> u8 {
        *self as _
    }
}

/// Function commands, issued once a device has been selected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FunctionCommand {
    ConvertTemperature = 0x44,
    WriteScratchpad = 0x4E,
    ReadScratchpad = 0xBE,
    ReadPowerSupply = 0xB4,
}

impl OpCode for FunctionCommand {
    fn op_code(&self) -> u8 {
        *self as _
    }
}

/// Which devices a function command is addressed to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target<'a> {
    /// Broadcast to every device with Skip ROM
    All,
    /// Select a single device with Match ROM
    Device(&'a crate::Address),
}

impl<'a> From<&'a crate::Address> for Target<'a> {
    fn from(address: &'a crate::Address) -> Self {
        Target::Device(address)
    }
}
