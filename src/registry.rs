use crate::Address;
use core::ops::Index;
use heapless::Vec;

/// Addresses found on the bus, in discovery order and without duplicates
#[derive(Debug, Clone, Default)]
pub struct Registry<const N: usize> {
    addresses: Vec<Address, N>,
}

impl<const N: usize> Registry<N> {
    pub const fn new() -> Self {
        Registry {
            addresses: Vec::new(),
        }
    }

    /// Appends `address` unless it is already known
    ///
    /// Returns `Ok(true)` if the address was new, `Err` with the address if it
    /// is new but there is no room left.
    pub fn insert(&mut self, address: Address) -> Result<bool, Address> {
        if self.contains(&address) {
            return Ok(false);
        }
        self.addresses.push(address)?;
        Ok(true)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.addresses.iter().any(|known| known == address)
    }

    /// Address at `index` in discovery order
    ///
    /// # Panics
    ///
    /// If `index` is out of range.
    pub fn get(&self, index: usize) -> Address {
        self.addresses[index]
    }

    pub fn try_get(&self, index: usize) -> Option<Address> {
        self.addresses.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Address> {
        self.addresses.iter()
    }

    pub fn clear(&mut self) {
        self.addresses.clear();
    }
}

impl<const N: usize> Index<usize> for Registry<N> {
    type Output = Address;

    fn index(&self, index: usize) -> &Self::Output {
        &self.addresses[index]
    }
}

impl<'a, const N: usize> IntoIterator for &'a Registry<N> {
    type Item = &'a Address;
    type IntoIter = core::slice::Iter<'a, Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
