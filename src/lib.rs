//! Tag Store
//!
//! An append-only credential log for door-lock controllers, kept in a
//! small EEPROM. Each record maps a 4-byte RFID tag identifier to a PIN.
//!
//! ## Features
//!
//! - **Append-only log** with a lazily rebuilt append position after power loss
//! - **Single-page write-back cache** in front of serial-bus EEPROMs
//! - **Fixed-size buffers** for decoded records, no per-record allocation
//! - **CRC-16/XMODEM integrity hash** for comparing against a remote key list
//! - **Self-healing format check**: a foreign version byte resets the log
//!
//! ## Modules
//!
//! - [`storage`] - Byte-storage contract and the on-chip backend
//! - [`bus`] - Serial-bus EEPROM seam and a simulated device
//! - [`page`] / [`page_cache`] - Resident page and the write-back cache
//! - [`io`] - EEPROM image files for host tooling
//! - [`tag`] / [`record`] - Identifiers, PINs and the record codec
//! - [`tagstore`] - The log itself
//! - [`config`] / [`layout`] / [`error`]
//!
//! ## Example Usage
//!
//! ```rust
//! use tagstore::{InternalEeprom, StoreConfig, TagStore};
//!
//! let mut store = TagStore::open(InternalEeprom::<1024>::new(), StoreConfig::internal()).unwrap();
//!
//! store.append(b"DEADBEEF 1234").unwrap();
//! assert_eq!(store.find("DEADBEEF").unwrap(), "1234");
//! assert!(store.find("CAFEBABE").is_err());
//!
//! let report = store.integrity_report();
//! assert_eq!(report.records, 1);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ TagStore (append/find/hash)  │
//! ├──────────────────────────────┤
//! │ record codec                 │
//! ├──────────────────────────────┤
//! │ ByteStorage                  │
//! │  ├─ InternalEeprom           │
//! │  ├─ ImageFile                │
//! │  └─ PageCache ── EepromBus   │
//! └──────────────────────────────┘
//! ```
//!
//! All operations are synchronous and single-threaded. None of them may be
//! called from interrupt context.

pub mod bus;
pub mod config;
pub mod error;
pub mod io;
pub mod layout;
pub mod page;
pub mod page_cache;
pub mod record;
pub mod storage;
pub mod tag;
pub mod tagstore;

// Re-export commonly used types
pub use bus::{BusError, EepromBus, SimulatedEeprom};
pub use config::{Backend, StoreConfig};
pub use error::{ErrorKind, Result, TagStoreError};
pub use io::ImageFile;
pub use page::{CacheLine, PAGE_SIZE};
pub use page_cache::{CacheStats, PageCache, MAX_BUS_CAPACITY};
pub use record::{Slot, TagRecord};
pub use storage::{ByteStorage, InternalEeprom};
pub use tag::{Pin, TagId};
pub use tagstore::{
    hash_entries, hash_key_list, hash_records, IntegrityReport, Scan, TagStore,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
