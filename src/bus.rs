//! Serial-bus EEPROM device seam
//!
//! [`EepromBus`] models the two transactions a 24LC-series EEPROM needs:
//!
//! ```text
//! read:  START dev|W addr_hi addr_lo  RSTART dev|R  d0 .. dn(NACK)  STOP
//! write: START dev|W addr_hi addr_lo  d0 .. dn                      STOP
//! ```
//!
//! Board support code implements it over the real two-wire peripheral;
//! [`SimulatedEeprom`] implements it in memory for tests and host tools.

use std::fmt;
use thiserror::Error;

/// Two-wire transport to an external EEPROM
pub trait EepromBus {
    type Error: fmt::Debug;

    /// Bring up the bus (and pulse the device reset line where wired)
    fn init(&mut self) {}

    /// Sequential read of `buf.len()` bytes starting at `address`
    ///
    /// On failure `buf` may be partially filled.
    fn read(&mut self, device: u8, address: u16, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Page write of `data` starting at `address`
    fn write(&mut self, device: u8, address: u16, data: &[u8]) -> Result<(), Self::Error>;

    /// Busy-wait for a device settling time
    fn delay_ms(&mut self, _ms: u32) {}
}

impl<B: EepromBus + ?Sized> EepromBus for &mut B {
    type Error = B::Error;

    fn init(&mut self) {
        (**self).init()
    }

    fn read(&mut self, device: u8, address: u16, buf: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read(device, address, buf)
    }

    fn write(&mut self, device: u8, address: u16, data: &[u8]) -> Result<(), Self::Error> {
        (**self).write(device, address, data)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("device {0:#04x} did not acknowledge")]
    Nack(u8),

    #[error("injected bus fault")]
    Injected,
}

/// Bus activity counters of a [`SimulatedEeprom`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    pub inits: u32,
    pub read_transactions: u64,
    pub write_transactions: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub delay_ms: u64,
}

/// Size of a 24LC256
pub const SIMULATED_SIZE: usize = 32 * 1024;

/// Page size of a 24LC256
pub const SIMULATED_PAGE_SIZE: usize = 64;

/// In-memory 24LC256-style EEPROM
///
/// Writes wrap inside the addressed page the way the real part does, and
/// reads roll over at the end of the array. Faults can be injected to
/// exercise the fail-silent paths of the page cache.
#[derive(Debug, Clone)]
pub struct SimulatedEeprom {
    memory: Vec<u8>,
    device: u8,
    page_size: usize,
    failing_reads: u32,
    failing_writes: u32,
    /// Bytes delivered by a failing read before it aborts
    partial_read: usize,
    stats: BusStats,
}

impl SimulatedEeprom {
    /// An erased 32 KiB device answering at `device`
    pub fn new(device: u8) -> Self {
        Self::with_geometry(device, SIMULATED_SIZE, SIMULATED_PAGE_SIZE)
    }

    /// `size` and `page_size` must be powers of two
    pub fn with_geometry(device: u8, size: usize, page_size: usize) -> Self {
        debug_assert!(size.is_power_of_two() && page_size.is_power_of_two());
        SimulatedEeprom {
            memory: vec![0xFF; size],
            device,
            page_size,
            failing_reads: 0,
            failing_writes: 0,
            partial_read: 0,
            stats: BusStats::default(),
        }
    }

    /// Fail the next `count` reads after delivering `partial` bytes each
    pub fn fail_reads(&mut self, count: u32, partial: usize) {
        self.failing_reads = count;
        self.partial_read = partial;
    }

    /// Fail the next `count` writes without touching memory
    pub fn fail_writes(&mut self, count: u32) {
        self.failing_writes = count;
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    pub fn stats(&self) -> BusStats {
        self.stats
    }

    fn mask(&self, address: usize) -> usize {
        address & (self.memory.len() - 1)
    }

    fn check_device(&self, device: u8) -> Result<(), BusError> {
        if device == self.device {
            Ok(())
        } else {
            Err(BusError::Nack(device))
        }
    }
}

impl EepromBus for SimulatedEeprom {
    type Error = BusError;

    fn init(&mut self) {
        self.stats.inits += 1;
    }

    fn read(&mut self, device: u8, address: u16, buf: &mut [u8]) -> Result<(), BusError> {
        self.check_device(device)?;
        self.stats.read_transactions += 1;

        let deliver = if self.failing_reads > 0 {
            self.partial_read.min(buf.len())
        } else {
            buf.len()
        };

        for (i, slot) in buf.iter_mut().take(deliver).enumerate() {
            *slot = self.memory[self.mask(address as usize + i)];
        }
        self.stats.bytes_read += deliver as u64;

        if self.failing_reads > 0 {
            self.failing_reads -= 1;
            return Err(BusError::Injected);
        }
        Ok(())
    }

    fn write(&mut self, device: u8, address: u16, data: &[u8]) -> Result<(), BusError> {
        self.check_device(device)?;
        self.stats.write_transactions += 1;

        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err(BusError::Injected);
        }

        let address = self.mask(address as usize);
        let base = address & !(self.page_size - 1);
        let start = address - base;
        for (i, &byte) in data.iter().enumerate() {
            let cell = base + (start + i) % self.page_size;
            self.memory[cell] = byte;
        }
        self.stats.bytes_written += data.len() as u64;
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) {
        self.stats.delay_ms += u64::from(ms);
    }
}
