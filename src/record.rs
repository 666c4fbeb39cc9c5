//! Tag record codec
//!
//! On-device record layout:
//!
//! ```text
//! [pin_len: u8][id: 4 bytes][pin: pin_len bytes]
//! ```
//!
//! A length byte of `0xFF` marks the end of the log. Text entries arrive as
//! `"IIIIIIII PPPP..."`: 8 hex digits, one space, then the PIN.

use crate::error::{Result, TagStoreError};
use crate::layout::{
    encoded_len, ENTRY_SEPARATOR, ID_HEX_LEN, ID_LEN, MAX_PIN_LEN, RECORD_OVERHEAD, SENTINEL,
};
use crate::storage::ByteStorage;
use crate::tag::{Pin, TagId};

/// One persisted credential
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagRecord {
    pub id: TagId,
    pub pin: Pin,
}

impl TagRecord {
    pub fn new(id: TagId, pin: &[u8]) -> Result<Self> {
        Ok(TagRecord {
            id,
            pin: Pin::new(pin)?,
        })
    }

    /// Validate a `"IIIIIIII PPPP..."` entry without touching storage
    pub fn parse_entry(entry: &[u8], min_pin_len: usize) -> Result<Self> {
        if entry.len() < ID_HEX_LEN + 1 + min_pin_len {
            return Err(TagStoreError::MalformedInput("tag too short"));
        }
        let id = TagId::parse(&entry[..ID_HEX_LEN])?;
        if entry[ID_HEX_LEN] != ENTRY_SEPARATOR {
            return Err(TagStoreError::MalformedInput("Tag too long"));
        }
        Self::new(id, &entry[ID_HEX_LEN + 1..])
    }

    /// Size of this record on the device
    pub fn encoded_len(&self) -> usize {
        encoded_len(self.pin.len())
    }
}

/// What the codec found at an offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Record { record: TagRecord, next: usize },
    EndOfLog,
    /// The length byte implies a record running past the region
    Corrupt,
}

/// Decode the record starting at `offset`
pub fn decode_at<S: ByteStorage + ?Sized>(
    storage: &mut S,
    offset: usize,
    end_of_region: usize,
) -> Slot {
    let len = storage.read_byte(offset);
    if len == SENTINEL {
        return Slot::EndOfLog;
    }
    let len = len as usize;
    if offset + len + RECORD_OVERHEAD > end_of_region || len > MAX_PIN_LEN {
        return Slot::Corrupt;
    }

    let mut id = [0u8; ID_LEN];
    for (i, byte) in id.iter_mut().enumerate() {
        *byte = storage.read_byte(offset + 1 + i);
    }

    let mut pin = Pin::empty();
    for i in 0..len {
        pin.push(storage.read_byte(offset + RECORD_OVERHEAD + i));
    }

    Slot::Record {
        record: TagRecord {
            id: TagId::from_bytes(id),
            pin,
        },
        next: offset + encoded_len(len),
    }
}

/// Write `record` at `offset` followed by a fresh end-of-log marker
///
/// Fails with [`TagStoreError::StoreFull`] before writing anything if the
/// record and its trailing marker do not fit below `end_of_region`.
/// Returns the offset of the new marker, i.e. the next free byte.
///
/// The length byte at `offset` is the current end-of-log marker, so it is
/// written last and only once the rest of the record reads back intact.
/// A dropped write therefore leaves the old marker in place and the call
/// fails with [`TagStoreError::WriteFailed`].
pub fn encode_append<S: ByteStorage + ?Sized>(
    storage: &mut S,
    offset: usize,
    end_of_region: usize,
    record: &TagRecord,
) -> Result<usize> {
    let end = offset + record.encoded_len();
    if end >= end_of_region {
        return Err(TagStoreError::StoreFull);
    }

    // Identifier, PIN and the new trailing marker
    let body = offset + 1;
    let pin_end = ID_LEN + record.pin.len();
    let mut expected = [SENTINEL; ID_LEN + MAX_PIN_LEN + 1];
    expected[..ID_LEN].copy_from_slice(record.id.as_bytes());
    expected[ID_LEN..pin_end].copy_from_slice(record.pin.as_bytes());
    let expected = &expected[..=pin_end];

    for (i, &byte) in expected.iter().enumerate() {
        storage.write_byte(body + i, byte);
    }
    let intact = expected
        .iter()
        .enumerate()
        .all(|(i, &byte)| storage.read_byte(body + i) == byte);
    if !intact {
        return Err(TagStoreError::WriteFailed { offset });
    }

    let len = record.pin.len() as u8;
    storage.write_byte(offset, len);
    if storage.read_byte(offset) != len {
        return Err(TagStoreError::WriteFailed { offset });
    }

    Ok(end)
}
