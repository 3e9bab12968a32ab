use crate::{Address, Command, Driver, Error, IoWire};
use core::fmt::Debug;
use embedded_hal::{delay::DelayNs, digital::OutputPin};
use log::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum SearchState {
    #[default]
    Initialized,
    DeviceFound,
    End,
}

/// Path through the binary tree of ROM codes taken by the previous descent
///
/// Bit positions are counted from 1; a discrepancy of 0 means none.
#[derive(Clone, Default)]
pub struct DeviceSearch {
    address: [u8; 8],
    last_discrepancy: u8,
    state: SearchState,
}

impl DeviceSearch {
    pub fn new() -> DeviceSearch {
        DeviceSearch::default()
    }

    /// Whether the search has walked every branch of the tree
    pub fn is_finished(&self) -> bool {
        self.state == SearchState::End
    }

    /// Position of the deepest branch where the previous descent went the `0` way
    pub fn last_discrepancy(&self) -> Option<u8> {
        match self.last_discrepancy {
            0 => None,
            bit => Some(bit),
        }
    }

    fn is_bit_set_in_address(&self, bit: u8) -> bool {
        let index = (bit - 1) / 8;
        let offset = (bit - 1) % 8;
        self.address[index as usize] & (0x01 << offset) != 0x00
    }

    fn write_bit_in_address(&mut self, bit: u8, value: bool) {
        let index = ((bit - 1) / 8) as usize;
        let offset = (bit - 1) % 8;
        if value {
            self.address[index] |= 0x01 << offset;
        } else {
            self.address[index] &= !(0x01 << offset);
        }
    }

    /// Picks the branch at a bit where devices disagree and remembers where
    /// the `0` branch was taken, so the next descent can come back for the `1`
    fn choose_branch(&self, bit: u8, marker: &mut u8) -> bool {
        if bit == self.last_discrepancy {
            true
        } else if bit > self.last_discrepancy {
            *marker = bit;
            false
        } else {
            let previous = self.is_bit_set_in_address(bit);
            if !previous {
                *marker = bit;
            }
            previous
        }
    }

    pub fn into_iter<'a, W: IoWire, P: OutputPin, const N: usize, Delay: DelayNs>(
        self,
        wire: &'a mut Driver<W, P, N>,
        delay: &'a mut Delay,
    ) -> DeviceSearchIter<'a, W, P, N, Delay> {
        DeviceSearchIter {
            search: Some(self),
            wire,
            delay,
        }
    }
}

pub struct DeviceSearchIter<'a, W: IoWire, P: OutputPin, const N: usize, Delay: DelayNs> {
    search: Option<DeviceSearch>,
    wire: &'a mut Driver<W, P, N>,
    delay: &'a mut Delay,
}

impl<'a, W: IoWire, P: OutputPin, const N: usize, Delay: DelayNs> Iterator
    for DeviceSearchIter<'a, W, P, N, Delay>
{
    type Item = Result<Address, Error<W::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut search = self.search.take()?;
        let result = self
            .wire
            .search_next(&mut search, &mut *self.delay)
            .transpose()?;
        if result.is_ok() {
            self.search = Some(search);
        }
        Some(result)
    }
}

impl<E: Debug, W: IoWire<Error = E>, P: OutputPin, const N: usize> Driver<W, P, N> {
    /// Runs discovery until every branch has been walked and returns how many
    /// devices are known afterwards, including those found by earlier calls
    ///
    /// A bus without presence pulse ends discovery without error. Both id bits
    /// reading high or a ROM code failing its CRC aborts the whole call.
    pub fn find_all_devices_on_bus(&mut self, delay: &mut impl DelayNs) -> Result<usize, Error<E>> {
        let mut search = DeviceSearch::new();
        while let Some(address) = self.search_next(&mut search, delay)? {
            match self.registry.insert(address) {
                Ok(true) => debug!("found device {}", address),
                Ok(false) => trace!("device {} already known", address),
                Err(address) => {
                    warn!("no room left for device {}", address);
                    return Err(Error::RegistryFull);
                }
            }
        }
        Ok(self.registry.len())
    }

    /// Descends the tree once, following the branches `search` left open
    ///
    /// Returns `Ok(None)` once the tree is exhausted or nobody answers the reset.
    pub fn search_next(
        &mut self,
        search: &mut DeviceSearch,
        delay: &mut impl DelayNs,
    ) -> Result<Option<Address>, Error<E>> {
        if search.state == SearchState::End {
            return Ok(None);
        }

        if !self.reset_presence(delay)? {
            warn!("no devices responding to search");
            search.state = SearchState::End;
            return Ok(None);
        }

        self.write_command(delay, Command::SearchRom)?;

        let mut marker = 0u8;
        for bit in 1..=Address::BITS {
            let id_bit = self.read_bit(delay)?; // normal bit
            let cmp_id_bit = self.read_bit(delay)?; // complementary bit

            let direction = match (id_bit, cmp_id_bit) {
                (true, true) => {
                    warn!("no device answered search bit {}", bit);
                    search.state = SearchState::End;
                    return Err(Error::SearchFault { bit });
                }
                (false, false) => search.choose_branch(bit, &mut marker),
                (id_bit, _) => id_bit,
            };

            search.write_bit_in_address(bit, direction);
            self.write_bit(delay, direction)?;
        }

        trace!("descent done, last discrepancy at bit {}", marker);
        search.last_discrepancy = marker;
        search.state = if marker == 0 {
            SearchState::End
        } else {
            SearchState::DeviceFound
        };

        let address = Address::from(search.address);
        if let Err(e) = address.ensure_correct_crc8::<E>() {
            warn!("discarding device {} with bad crc", address);
            search.state = SearchState::End;
            return Err(e);
        }
        Ok(Some(address))
    }
}
