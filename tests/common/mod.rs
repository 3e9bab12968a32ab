//! Simulated 1-Wire bus for driving the real driver in tests
//!
//! The bus keeps a virtual clock advanced by the delays the driver requests and
//! decodes every low pulse by its width, the way slaves on a real wire do: at
//! least 480 µs is a reset, less than 15 µs a `1` (or a read slot), anything in
//! between a `0`. Devices answer read slots by holding the line low for 15 µs.
//! A silent listener follows the protocol and records what the master writes.
#![allow(dead_code)]

use embedded_hal::delay::DelayNs;
use onewire_master::{crc, IoWire};
use std::{cell::RefCell, convert::Infallible, mem, rc::Rc};

const RESET_PULSE_NS: u64 = 480_000;
const ONE_PULSE_NS: u64 = 15_000;
const DEVICE_HOLD_NS: u64 = 15_000;
const PRESENCE_START_NS: u64 = 15_000;
const PRESENCE_END_NS: u64 = 240_000;

pub const ROM_A: [u8; 8] = [0x28, 0x62, 0x24, 0xC7, 0x03, 0x00, 0x00, 0x0F];
pub const ROM_B: [u8; 8] = [0x28, 0x08, 0x81, 0xFB, 0x07, 0x00, 0x00, 0x26];

/// Builds a ROM code with a valid CRC
pub fn rom(family: u8, serial: [u8; 6]) -> [u8; 8] {
    let mut rom = [family, 0, 0, 0, 0, 0, 0, 0];
    rom[1..7].copy_from_slice(&serial);
    rom[7] = crc::checksum(&rom[..7]);
    rom
}

/// Appends the CRC to the first 8 scratch-pad bytes
pub fn scratchpad(bytes: [u8; 8]) -> [u8; 9] {
    let mut scratchpad = [0u8; 9];
    scratchpad[..8].copy_from_slice(&bytes);
    scratchpad[8] = crc::checksum(&bytes);
    scratchpad
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    RomCommand,
    Search { bit: u8, step: u8 },
    Match { bit: u8, matched: bool },
    FunctionCommand,
    Transmit { bits: Vec<bool>, pos: usize },
    WriteScratchpad { index: usize },
}

fn bits_of(bytes: &[u8]) -> Vec<bool> {
    bytes
        .iter()
        .flat_map(|byte| (0..8).map(move |i| byte & (1 << i) != 0))
        .collect()
}

#[derive(Debug, Clone)]
pub struct SimDevice {
    pub rom: [u8; 8],
    pub scratchpad: [u8; 9],
    pub external_power: bool,
    pub conversions: usize,
    /// Stops answering the search after this many bits
    search_dropout: Option<u8>,
    listener: bool,
    phase: Phase,
    rx: u8,
    rx_bits: u8,
    frames: Vec<Vec<u8>>,
}

impl SimDevice {
    pub fn new(rom: [u8; 8]) -> Self {
        SimDevice {
            rom,
            // power-on state: 85 °C, T(H) 0x4B, T(L) 0x46, 12 bit
            scratchpad: scratchpad([0x50, 0x05, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10]),
            external_power: true,
            conversions: 0,
            search_dropout: None,
            listener: false,
            phase: Phase::Idle,
            rx: 0,
            rx_bits: 0,
            frames: Vec::new(),
        }
    }

    fn listener() -> Self {
        SimDevice {
            listener: true,
            ..SimDevice::new([0; 8])
        }
    }

    pub fn parasite(mut self) -> Self {
        self.external_power = false;
        self
    }

    pub fn with_scratchpad(mut self, scratchpad: [u8; 9]) -> Self {
        self.scratchpad = scratchpad;
        self
    }

    pub fn dropping_out_after(mut self, bits: u8) -> Self {
        self.search_dropout = Some(bits);
        self
    }

    fn rom_bit(&self, bit: u8) -> bool {
        self.rom[bit as usize / 8] & (1 << (bit % 8)) != 0
    }

    fn reset(&mut self) {
        self.phase = Phase::RomCommand;
        self.rx = 0;
        self.rx_bits = 0;
        self.frames.push(Vec::new());
    }

    fn log(&mut self, byte: u8) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push(byte);
        }
    }

    fn receive(&mut self, bit: bool) -> Option<u8> {
        self.rx >>= 1;
        if bit {
            self.rx |= 0x80;
        }
        self.rx_bits += 1;
        if self.rx_bits == 8 {
            let byte = self.rx;
            self.rx = 0;
            self.rx_bits = 0;
            self.log(byte);
            Some(byte)
        } else {
            None
        }
    }

    /// Level the device puts on the line during the slot that just started
    fn slot_output(&self) -> Option<bool> {
        if self.listener {
            return None;
        }
        match &self.phase {
            Phase::Search { bit, step: 0 } => Some(self.rom_bit(*bit)),
            Phase::Search { bit, step: 1 } => Some(!self.rom_bit(*bit)),
            Phase::Transmit { bits, pos } => Some(bits[*pos]),
            _ => None,
        }
    }

    fn end_slot(&mut self, master_bit: bool) {
        let phase = mem::replace(&mut self.phase, Phase::Idle);
        self.phase = match phase {
            Phase::Idle => Phase::Idle,
            Phase::RomCommand => match self.receive(master_bit) {
                None => Phase::RomCommand,
                Some(0xF0) => self.start_search(0),
                Some(0x55) => Phase::Match {
                    bit: 0,
                    matched: true,
                },
                Some(0xCC) => Phase::FunctionCommand,
                Some(0x33) => Phase::Transmit {
                    bits: bits_of(&self.rom),
                    pos: 0,
                },
                Some(_) => Phase::Idle,
            },
            Phase::Search { bit, step } if step < 2 => Phase::Search { bit, step: step + 1 },
            Phase::Search { bit, .. } => {
                self.receive(master_bit);
                if !self.listener && master_bit != self.rom_bit(bit) {
                    Phase::Idle
                } else if bit + 1 == 64 {
                    Phase::Idle
                } else {
                    self.start_search(bit + 1)
                }
            }
            Phase::Match { bit, matched } => {
                self.receive(master_bit);
                let matched = matched && master_bit == self.rom_bit(bit);
                if bit + 1 < 64 {
                    Phase::Match {
                        bit: bit + 1,
                        matched,
                    }
                } else if matched || self.listener {
                    Phase::FunctionCommand
                } else {
                    Phase::Idle
                }
            }
            Phase::FunctionCommand => match self.receive(master_bit) {
                None => Phase::FunctionCommand,
                Some(0xBE) => Phase::Transmit {
                    bits: bits_of(&self.scratchpad),
                    pos: 0,
                },
                Some(0x4E) => Phase::WriteScratchpad { index: 2 },
                Some(0x44) => {
                    self.conversions += 1;
                    Phase::Idle
                }
                Some(0xB4) => Phase::Transmit {
                    bits: vec![self.external_power],
                    pos: 0,
                },
                Some(_) => Phase::Idle,
            },
            Phase::Transmit { bits, pos } => {
                if pos + 1 < bits.len() {
                    Phase::Transmit { bits, pos: pos + 1 }
                } else {
                    Phase::Idle
                }
            }
            Phase::WriteScratchpad { index } => match self.receive(master_bit) {
                None => Phase::WriteScratchpad { index },
                Some(byte) => {
                    if index < 5 {
                        self.scratchpad[index] = byte;
                        self.scratchpad[8] = crc::checksum(&self.scratchpad[..8]);
                    }
                    Phase::WriteScratchpad { index: index + 1 }
                }
            },
        };
    }

    fn start_search(&self, bit: u8) -> Phase {
        if !self.listener && self.search_dropout == Some(bit) {
            Phase::Idle
        } else {
            Phase::Search { bit, step: 0 }
        }
    }
}

#[derive(Debug)]
pub struct BusState {
    now_ns: u64,
    low_since: Option<u64>,
    slot_start: u64,
    slot_low: bool,
    presence_from: Option<u64>,
    pullup_since: Option<u64>,
    pullups_ns: Vec<u64>,
    resets: usize,
    devices: Vec<SimDevice>,
    listener: SimDevice,
}

impl BusState {
    fn end_pullup(&mut self) {
        if let Some(since) = self.pullup_since.take() {
            self.pullups_ns.push(self.now_ns - since);
        }
    }

    fn participants(&mut self) -> impl Iterator<Item = &mut SimDevice> {
        self.devices
            .iter_mut()
            .chain(std::iter::once(&mut self.listener))
    }

    fn set_low(&mut self) {
        self.end_pullup();
        if self.low_since.is_none() {
            self.low_since = Some(self.now_ns);
            self.slot_start = self.now_ns;
            self.slot_low = self.devices.iter().any(|d| d.slot_output() == Some(false));
            self.presence_from = None;
        }
    }

    fn release(&mut self) {
        self.end_pullup();
        if let Some(since) = self.low_since.take() {
            let width = self.now_ns - since;
            if width >= RESET_PULSE_NS {
                self.resets += 1;
                self.slot_low = false;
                self.presence_from = Some(self.now_ns);
                self.participants().for_each(SimDevice::reset);
            } else {
                let bit = width < ONE_PULSE_NS;
                self.participants().for_each(|d| d.end_slot(bit));
            }
        }
    }

    fn is_low(&self) -> bool {
        if self.low_since.is_some() {
            return true;
        }
        if self.slot_low && self.now_ns - self.slot_start < DEVICE_HOLD_NS {
            return true;
        }
        match self.presence_from {
            Some(from) => {
                let t = self.now_ns - from;
                !self.devices.is_empty() && (PRESENCE_START_NS..PRESENCE_END_NS).contains(&t)
            }
            None => false,
        }
    }
}

/// Shared handle: one clone goes into the driver as data line, another serves as delay
#[derive(Debug, Clone)]
pub struct SimBus(Rc<RefCell<BusState>>);

impl SimBus {
    pub fn new(devices: Vec<SimDevice>) -> Self {
        SimBus(Rc::new(RefCell::new(BusState {
            now_ns: 0,
            low_since: None,
            slot_start: 0,
            slot_low: false,
            presence_from: None,
            pullup_since: None,
            pullups_ns: Vec::new(),
            resets: 0,
            devices,
            listener: SimDevice::listener(),
        })))
    }

    pub fn empty() -> Self {
        SimBus::new(Vec::new())
    }

    /// Bytes written by the master, one entry per reset
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.0.borrow().listener.frames.clone()
    }

    pub fn last_frame(&self) -> Vec<u8> {
        self.frames().last().cloned().unwrap_or_default()
    }

    pub fn clear_frames(&self) {
        self.0.borrow_mut().listener.frames.clear();
    }

    pub fn resets(&self) -> usize {
        self.0.borrow().resets
    }

    pub fn now_us(&self) -> u64 {
        self.0.borrow().now_ns / 1_000
    }

    pub fn pullups_ms(&self) -> Vec<u64> {
        self.0
            .borrow()
            .pullups_ns
            .iter()
            .map(|ns| ns / 1_000_000)
            .collect()
    }

    /// Connects another device, as if plugged in while the bus is idle
    pub fn attach(&self, device: SimDevice) {
        self.0.borrow_mut().devices.push(device);
    }

    pub fn device(&self, index: usize) -> SimDevice {
        self.0.borrow().devices[index].clone()
    }
}

impl IoWire for SimBus {
    type Error = Infallible;

    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.borrow().is_low())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().set_low();
        Ok(())
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().release();
        Ok(())
    }

    fn drive_high(&mut self) -> Result<(), Self::Error> {
        let mut state = self.0.borrow_mut();
        state.release();
        state.pullup_since = Some(state.now_ns);
        Ok(())
    }
}

impl DelayNs for SimBus {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().now_ns += u64::from(ns);
    }
}
