//! The append-only tag log
//!
//! Records are written once, in order, starting at the configured tag start
//! and never modified in place. The offset of the end-of-log marker is kept
//! in memory once known; after a power cycle it is rebuilt lazily by the
//! first full scan.
//!
//! Not reentrant: the lock controller must never call into the store from
//! an interrupt handler.

use crate::config::StoreConfig;
use crate::error::{Result, TagStoreError};
use crate::layout::SENTINEL;
use crate::record::{self, Slot, TagRecord};
use crate::storage::ByteStorage;
use crate::tag::{Pin, TagId};
use crc::{Crc, Digest, CRC_16_XMODEM};
use std::iter::FusedIterator;
use tracing::{debug, info, warn};

static INTEGRITY_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Result of an integrity pass over the whole log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrityReport {
    /// CRC-16/XMODEM over every record in log order
    pub hash: u16,
    /// Records visited
    pub records: usize,
    /// Bytes left between the end-of-log marker and the end of the region
    pub free_bytes: usize,
}

/// Credential log over a byte-addressed backend
pub struct TagStore<S: ByteStorage> {
    storage: S,
    config: StoreConfig,
    /// Offset of the end-of-log marker, `None` until a full scan
    last_offset: Option<usize>,
}

impl<S: ByteStorage> TagStore<S> {
    /// Wrap `storage` without touching it
    pub fn new(storage: S, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        if config.end_of_region > storage.capacity() {
            return Err(TagStoreError::InvalidConfig(format!(
                "end_of_region {} exceeds backend capacity {}",
                config.end_of_region,
                storage.capacity()
            )));
        }

        Ok(TagStore {
            storage,
            config,
            last_offset: None,
        })
    }

    /// [`new`](Self::new) followed by [`init`](Self::init)
    pub fn open(storage: S, config: StoreConfig) -> Result<Self> {
        let mut store = Self::new(storage, config)?;
        store.init();
        Ok(store)
    }

    /// Prepare the backend and reset the log if the version byte is foreign
    pub fn init(&mut self) {
        self.storage.init();
        let version = self.storage.read_byte(self.config.version_offset);
        if version != self.config.format_version {
            warn!(
                "Tag store version {:#04x} (expected {:#04x}), resetting tag region",
                version, self.config.format_version
            );
            self.reset_all();
        } else {
            debug!("Tag store version {:#04x} ok", version);
        }
    }

    /// Declare the log empty
    ///
    /// Only the version byte and the first length byte are rewritten; the
    /// old records stay on the device behind the new end-of-log marker.
    pub fn reset_all(&mut self) {
        self.storage
            .write_byte(self.config.version_offset, self.config.format_version);
        self.storage.flush();
        self.storage.write_byte(self.config.tag_start, SENTINEL);
        self.storage.flush();
        self.last_offset = Some(self.config.tag_start);
        info!("Tag store reset");
    }

    /// Iterate records from the start of the log
    ///
    /// Stops at the end-of-log marker or at the first corrupt record. A scan
    /// that runs to its end records where it stopped as the append position.
    pub fn scan(&mut self) -> Scan<'_, S> {
        let start = self.config.tag_start;
        Scan {
            store: self,
            offset: Some(start),
        }
    }

    /// PIN of the oldest record for an 8-hex-digit identifier
    ///
    /// Hex case is ignored. An identifier that does not parse cannot be
    /// stored and so is reported as not found.
    pub fn find(&mut self, id: &str) -> Result<Pin> {
        let id: TagId = id.parse().map_err(|_| TagStoreError::NotFound)?;
        self.find_id(&id)
    }

    pub fn find_id(&mut self, id: &TagId) -> Result<Pin> {
        self.scan()
            .find(|record| record.id == *id)
            .map(|record| record.pin)
            .ok_or(TagStoreError::NotFound)
    }

    /// Append a `"IIIIIIII PPPP..."` text entry
    ///
    /// Returns the new append position. Malformed entries are rejected
    /// before the device is touched.
    pub fn append(&mut self, entry: &[u8]) -> Result<usize> {
        let record = TagRecord::parse_entry(entry, self.config.min_pin_len)?;
        self.append_record(&record)
    }

    /// Append an already-validated record
    pub fn append_record(&mut self, record: &TagRecord) -> Result<usize> {
        let offset = self.ensure_last_offset();
        let next = record::encode_append(
            &mut self.storage,
            offset,
            self.config.end_of_region,
            record,
        )
        .map_err(|e| {
            if let TagStoreError::WriteFailed { .. } = e {
                warn!("Tag {} did not read back at offset {}, log unchanged", record.id, offset);
            }
            e
        })?;
        self.last_offset = Some(next);
        debug!("Appended tag {} at offset {}", record.id, offset);
        Ok(next)
    }

    /// Walk the log and report where it ends
    ///
    /// Unlike [`scan`](Self::scan), a corrupt length byte is returned as
    /// [`TagStoreError::Corrupt`] instead of ending the walk quietly.
    pub fn check(&mut self) -> Result<usize> {
        let end = self.config.end_of_region;
        let mut offset = self.config.tag_start;
        let mut records = 0;
        loop {
            match record::decode_at(&mut self.storage, offset, end) {
                Slot::Record { next, .. } => {
                    offset = next;
                    records += 1;
                }
                Slot::EndOfLog => {
                    self.note_end(offset);
                    return Ok(records);
                }
                Slot::Corrupt => {
                    self.note_end(offset);
                    return Err(TagStoreError::Corrupt { offset });
                }
            }
        }
    }

    /// CRC-16/XMODEM over the whole log
    pub fn integrity_hash(&mut self) -> u16 {
        self.integrity_report().hash
    }

    /// Flush, then hash every record as `ID ' ' PIN '\0'` in log order
    pub fn integrity_report(&mut self) -> IntegrityReport {
        self.storage.flush();

        let mut digest = INTEGRITY_CRC.digest();
        let mut records = 0;
        for record in self.scan() {
            feed_record(&mut digest, &record);
            records += 1;
        }

        let free_bytes = self.free_bytes();
        info!("{} bytes EEPROM free", free_bytes);

        IntegrityReport {
            hash: digest.finalize(),
            records,
            free_bytes,
        }
    }

    /// Bytes left for new records (scans if the append position is unknown)
    pub fn free_bytes(&mut self) -> usize {
        let offset = self.ensure_last_offset();
        self.config.end_of_region.saturating_sub(offset)
    }

    /// Append position, if known
    pub fn last_offset(&self) -> Option<usize> {
        self.last_offset
    }

    /// Commit buffered writes to the device
    pub fn flush(&mut self) {
        self.storage.flush();
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Raw backend access; forgets the cached append position
    pub fn storage_mut(&mut self) -> &mut S {
        self.last_offset = None;
        &mut self.storage
    }

    /// Flush and hand the backend back
    pub fn into_inner(mut self) -> S {
        self.storage.flush();
        self.storage
    }

    fn ensure_last_offset(&mut self) -> usize {
        if let Some(offset) = self.last_offset {
            return offset;
        }
        self.scan().for_each(drop);
        self.last_offset.unwrap_or(self.config.tag_start)
    }

    fn note_end(&mut self, offset: usize) {
        // Never move backwards: a short read must not expose live records to overwrite
        self.last_offset = Some(match self.last_offset {
            Some(known) if known > offset => known,
            _ => offset,
        });
    }
}

/// Iterator returned by [`TagStore::scan`]
pub struct Scan<'a, S: ByteStorage> {
    store: &'a mut TagStore<S>,
    offset: Option<usize>,
}

impl<S: ByteStorage> Iterator for Scan<'_, S> {
    type Item = TagRecord;

    fn next(&mut self) -> Option<TagRecord> {
        let offset = self.offset?;
        let end = self.store.config.end_of_region;
        match record::decode_at(&mut self.store.storage, offset, end) {
            Slot::Record { record, next } => {
                self.offset = Some(next);
                Some(record)
            }
            Slot::EndOfLog => {
                self.offset = None;
                self.store.note_end(offset);
                None
            }
            Slot::Corrupt => {
                warn!("Corrupt tag record at offset {}, scan stopped", offset);
                self.offset = None;
                self.store.note_end(offset);
                None
            }
        }
    }
}

impl<S: ByteStorage> FusedIterator for Scan<'_, S> {}

fn feed_record(digest: &mut Digest<'_, u16>, record: &TagRecord) {
    digest.update(record.id.to_hex().as_bytes());
    digest.update(&[b' ']);
    digest.update(record.pin.as_bytes());
    digest.update(&[0]);
}

/// Hash of a log holding `records` in order
pub fn hash_records<'a, I>(records: I) -> u16
where
    I: IntoIterator<Item = &'a TagRecord>,
{
    let mut digest = INTEGRITY_CRC.digest();
    for record in records {
        feed_record(&mut digest, record);
    }
    digest.finalize()
}

/// Hash of a key list of `"IIIIIIII PPPP..."` entries, as a gateway computes it
///
/// Matches [`TagStore::integrity_hash`] after the same entries were appended
/// in the same order, provided identifiers are written in uppercase.
pub fn hash_entries<I>(entries: I) -> u16
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let mut digest = INTEGRITY_CRC.digest();
    for entry in entries {
        digest.update(entry.as_ref());
        digest.update(&[0]);
    }
    digest.finalize()
}

/// [`hash_entries`] over a key list file, one entry per line
///
/// Line endings (LF or CRLF) and trailing whitespace are stripped; blank
/// lines are skipped.
pub fn hash_key_list(text: &str) -> u16 {
    hash_entries(
        text.lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty()),
    )
}
