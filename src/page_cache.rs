//! Single-page write-back cache in front of a serial-bus EEPROM
//!
//! Byte-at-a-time bus access costs a full transaction per byte. The log is
//! read and appended strictly in address order, so keeping one aligned page
//! resident turns a scan into one bulk read per page and an append into one
//! page write.
//!
//! Invariants:
//! - at most one page is resident
//! - a dirty page is written back before a different page is loaded
//! - a page load blanks the buffer to the erased pattern before reading
//! - bus failures are logged and counted, never returned

use crate::bus::EepromBus;
use crate::bus::SIMULATED_SIZE;
use crate::config::{Backend, StoreConfig};
use crate::error::{Result, TagStoreError};
use crate::layout::SENTINEL;
use crate::page::{page_base, CacheLine, PAGE_SIZE};
use crate::storage::ByteStorage;
use tracing::{debug, warn};

/// Write-cycle time of the device after a page write (5 ms max, plus margin)
pub const WRITE_CYCLE_MS: u32 = 6;

/// Default addressable size of the external device
pub const EXTERNAL_EEPROM_SIZE: usize = SIMULATED_SIZE;

/// Largest device reachable with the two-byte word address of the bus
pub const MAX_BUS_CAPACITY: usize = 1 << 16;

/// Page cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Accesses served by the resident page
    pub hits: u64,
    /// Accesses that needed a different page
    pub misses: u64,
    /// Successful page loads
    pub loads: u64,
    /// Successful page write-backs
    pub flushes: u64,
    /// Failed bus transactions (loads and write-backs)
    pub bus_failures: u64,
}

impl CacheStats {
    /// Hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Paged write-back cache implementing [`ByteStorage`] over an [`EepromBus`]
pub struct PageCache<B: EepromBus> {
    bus: B,
    device: u8,
    capacity: usize,
    line: CacheLine,
    initialized: bool,
    stats: CacheStats,
}

impl<B: EepromBus> PageCache<B> {
    /// Cache for a 32 KiB device at 7-bit address `device`
    pub fn new(bus: B, device: u8) -> Self {
        Self::build(bus, device, EXTERNAL_EEPROM_SIZE)
    }

    /// Cache for a device of `capacity` bytes
    ///
    /// Fails if page addresses would not fit the 16-bit bus address.
    pub fn with_capacity(bus: B, device: u8, capacity: usize) -> Result<Self> {
        if capacity > MAX_BUS_CAPACITY {
            return Err(TagStoreError::InvalidConfig(format!(
                "capacity {} exceeds the {} bytes a 16-bit bus address reaches",
                capacity, MAX_BUS_CAPACITY
            )));
        }
        Ok(Self::build(bus, device, capacity))
    }

    /// Cache sized and addressed by an external store layout
    ///
    /// The device answers at `config.device_address` and the cache covers
    /// the log region up to `config.end_of_region`.
    pub fn from_config(bus: B, config: &StoreConfig) -> Result<Self> {
        if config.backend != Backend::External {
            return Err(TagStoreError::InvalidConfig(
                "page cache needs an external backend layout".to_string(),
            ));
        }
        config.validate()?;
        Self::with_capacity(bus, config.device_address, config.end_of_region + 1)
    }

    fn build(bus: B, device: u8, capacity: usize) -> Self {
        PageCache {
            bus,
            device,
            capacity,
            line: CacheLine::new(),
            initialized: false,
            stats: CacheStats::default(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Base address of the resident page
    pub fn resident_page(&self) -> Option<usize> {
        self.line.base()
    }

    pub fn is_dirty(&self) -> bool {
        self.line.is_dirty()
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Direct bus access; call [`invalidate`](Self::invalidate) after
    /// changing device contents behind the cache
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Write back and drop the resident page
    pub fn invalidate(&mut self) {
        self.flush();
        if !self.line.is_dirty() {
            self.line.erase();
        }
    }

    /// Write back and hand the bus back
    pub fn into_inner(mut self) -> B {
        self.flush();
        self.bus
    }

    /// Make the page holding `address` resident
    ///
    /// Returns false when the page could not be made resident; the access
    /// is then served as erased memory.
    pub fn ensure_page(&mut self, address: usize) -> bool {
        if self.line.holds(address) {
            self.stats.hits += 1;
            return true;
        }
        self.stats.misses += 1;

        self.flush();
        if self.line.is_dirty() {
            // Keep unwritten data resident rather than discard it
            return false;
        }

        // capacity <= MAX_BUS_CAPACITY keeps every page base within u16
        let base = page_base(address);
        self.line.erase();
        match self.bus.read(self.device, base as u16, self.line.buffer_mut()) {
            Ok(()) => {
                self.line.install(base);
                self.stats.loads += 1;
                debug!("Loaded EEPROM page {:#06x}", base);
                true
            }
            Err(e) => {
                self.line.erase();
                self.stats.bus_failures += 1;
                warn!("EEPROM page {:#06x} load failed: {:?}", base, e);
                false
            }
        }
    }

    pub fn read(&mut self, address: usize) -> u8 {
        if address >= self.capacity || !self.ensure_page(address) {
            return SENTINEL;
        }
        self.line.get(address)
    }

    pub fn write(&mut self, address: usize, value: u8) {
        if address >= self.capacity {
            return;
        }
        if self.ensure_page(address) {
            self.line.set(address, value);
        } else {
            warn!("Dropped EEPROM write at {:#06x}", address);
        }
    }

    /// Write the resident page back if it is dirty
    pub fn flush(&mut self) {
        if !self.line.is_dirty() {
            return;
        }
        let Some(base) = self.line.base() else {
            self.line.mark_clean();
            return;
        };

        match self.bus.write(self.device, base as u16, self.line.bytes()) {
            Ok(()) => {
                self.bus.delay_ms(WRITE_CYCLE_MS);
                self.line.mark_clean();
                self.stats.flushes += 1;
                debug!("Flushed EEPROM page {:#06x} ({} bytes)", base, PAGE_SIZE);
            }
            Err(e) => {
                self.stats.bus_failures += 1;
                warn!("EEPROM page {:#06x} write-back failed: {:?}", base, e);
            }
        }
    }
}

impl<B: EepromBus> ByteStorage for PageCache<B> {
    fn init(&mut self) {
        if !self.initialized {
            self.bus.init();
            self.initialized = true;
        }
    }

    fn read_byte(&mut self, address: usize) -> u8 {
        self.read(address)
    }

    fn write_byte(&mut self, address: usize, value: u8) {
        self.write(address, value)
    }

    fn flush(&mut self) {
        PageCache::flush(self)
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
