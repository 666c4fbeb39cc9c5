//! Persisted layout of the tag store
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │ 0..63     unused by the tag store           │
//! │ 63        format version byte               │
//! │ 64..end   record log, terminated by 0xFF    │
//! └────────────────────────────────────────────┘
//!
//! record: [pin_len: u8][identifier: 4 bytes][pin: pin_len bytes]
//! ```

/// Offset of the format version byte
pub const VERSION_OFFSET: usize = 63;

/// Current record format version
pub const FORMAT_VERSION: u8 = 1;

/// First byte of the record log
pub const TAG_START: usize = 64;

/// Length byte value marking the end of the log (also the erased state)
pub const SENTINEL: u8 = 0xFF;

/// Raw identifier size in bytes
pub const ID_LEN: usize = 4;

/// Length byte plus identifier
pub const RECORD_OVERHEAD: usize = 1 + ID_LEN;

/// Longest storable PIN; keeps a length byte clear of [`SENTINEL`]
pub const MAX_PIN_LEN: usize = 251;

/// Shortest PIN accepted from the text entry surface by default
pub const DEFAULT_MIN_PIN_LEN: usize = 4;

/// Separator between identifier and PIN in a text entry
pub const ENTRY_SEPARATOR: u8 = b' ';

/// Hex digits in a text identifier
pub const ID_HEX_LEN: usize = ID_LEN * 2;

/// End of the record region on the 1 KiB internal EEPROM
pub const INTERNAL_END_OF_REGION: usize = 1023;

/// End of the record region on the 32 KiB external EEPROM
pub const EXTERNAL_END_OF_REGION: usize = 32767;

/// On-device size of a record carrying `pin_len` PIN bytes
pub const fn encoded_len(pin_len: usize) -> usize {
    RECORD_OVERHEAD + pin_len
}
