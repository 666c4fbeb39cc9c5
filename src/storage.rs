//! Byte-addressed non-volatile storage backends
//!
//! Every backend exposes the same contract: single-byte reads and writes at
//! absolute addresses, a write that is skipped when the stored value already
//! matches, and an idempotent `flush`.
//!
//! Byte access is fail-silent. A backend that cannot reach its device leaves
//! its state unchanged and reports nothing to the caller; the tag log above
//! is written on the assumption that byte operations never fail visibly.
//!
//! None of these types may be touched from an interrupt handler.

use crate::layout::SENTINEL;

/// Byte-level storage contract shared by all backends
pub trait ByteStorage {
    /// Prepare the underlying device. Must run before the first read or write.
    fn init(&mut self);

    /// Read the byte at `address`
    fn read_byte(&mut self, address: usize) -> u8;

    /// Write `value` at `address`, skipping the write if the value is unchanged
    fn write_byte(&mut self, address: usize, value: u8);

    /// Commit any buffered writes
    fn flush(&mut self);

    /// Addressable size in bytes
    fn capacity(&self) -> usize;
}

impl<S: ByteStorage + ?Sized> ByteStorage for &mut S {
    fn init(&mut self) {
        (**self).init()
    }

    fn read_byte(&mut self, address: usize) -> u8 {
        (**self).read_byte(address)
    }

    fn write_byte(&mut self, address: usize, value: u8) {
        (**self).write_byte(address, value)
    }

    fn flush(&mut self) {
        (**self).flush()
    }

    fn capacity(&self) -> usize {
        (**self).capacity()
    }
}

/// Size of the on-chip EEPROM on the reference controller
pub const INTERNAL_EEPROM_SIZE: usize = 1024;

/// Directly addressed on-chip EEPROM
///
/// Every byte write goes straight to the cell, so there is nothing to flush.
/// Out-of-range reads return the erased value and out-of-range writes are
/// dropped.
#[derive(Debug, Clone)]
pub struct InternalEeprom<const N: usize = INTERNAL_EEPROM_SIZE> {
    cells: [u8; N],
    /// Physical cell writes performed (wear accounting)
    writes: u64,
}

impl<const N: usize> InternalEeprom<N> {
    /// A fully erased device
    pub fn new() -> Self {
        InternalEeprom {
            cells: [SENTINEL; N],
            writes: 0,
        }
    }

    /// A device preloaded with an image; bytes past `N` are ignored
    pub fn from_image(image: &[u8]) -> Self {
        let mut eeprom = Self::new();
        let len = image.len().min(N);
        eeprom.cells[..len].copy_from_slice(&image[..len]);
        eeprom
    }

    /// Raw cell contents
    pub fn image(&self) -> &[u8; N] {
        &self.cells
    }

    /// Number of cell writes actually issued
    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl<const N: usize> Default for InternalEeprom<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteStorage for InternalEeprom<N> {
    fn init(&mut self) {}

    fn read_byte(&mut self, address: usize) -> u8 {
        self.cells.get(address).copied().unwrap_or(SENTINEL)
    }

    fn write_byte(&mut self, address: usize, value: u8) {
        if let Some(cell) = self.cells.get_mut(address) {
            if *cell != value {
                *cell = value;
                self.writes += 1;
            }
        }
    }

    fn flush(&mut self) {}

    fn capacity(&self) -> usize {
        N
    }
}
