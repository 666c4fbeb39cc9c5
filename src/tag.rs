//! Tag identifiers and PINs
//!
//! Identifiers travel as 8 hex digits but are stored as 4 raw bytes.
//! PINs are opaque bytes (ASCII digits in practice) held in a bounded
//! buffer so a decoded record never allocates.

use crate::error::{Result, TagStoreError};
use crate::layout::{ID_HEX_LEN, ID_LEN, MAX_PIN_LEN};
use std::fmt::{self, Write};
use std::str::FromStr;

/// Binary form of an 8-hex-digit tag identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagId([u8; ID_LEN]);

impl TagId {
    pub const fn from_bytes(bytes: [u8; ID_LEN]) -> Self {
        TagId(bytes)
    }

    /// Parse exactly 8 hex digits (either case)
    pub fn parse(hex_digits: &[u8]) -> Result<Self> {
        if hex_digits.len() != ID_HEX_LEN {
            return Err(TagStoreError::MalformedInput("Bad tag"));
        }
        let mut bytes = [0u8; ID_LEN];
        hex::decode_to_slice(hex_digits, &mut bytes)
            .map_err(|_| TagStoreError::MalformedInput("Bad tag"))?;
        Ok(TagId(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// Uppercase, zero-padded hex rendering
    pub fn to_hex(&self) -> heapless::String<ID_HEX_LEN> {
        let mut out = heapless::String::new();
        for byte in self.0 {
            // Capacity is exactly two digits per byte
            let _ = write!(out, "{:02X}", byte);
        }
        out
    }
}

impl FromStr for TagId {
    type Err = TagStoreError;

    fn from_str(s: &str) -> Result<Self> {
        TagId::parse(s.as_bytes())
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// PIN bytes, 1 to [`MAX_PIN_LEN`] long
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pin(heapless::Vec<u8, MAX_PIN_LEN>);

impl Pin {
    pub fn new(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(TagStoreError::MalformedInput("empty PIN"));
        }
        heapless::Vec::from_slice(bytes)
            .map(Pin)
            .map_err(|_| TagStoreError::MalformedInput("PIN too long"))
    }

    pub(crate) fn empty() -> Self {
        Pin(heapless::Vec::new())
    }

    /// Append one byte read back from storage; the caller bounds the length
    pub(crate) fn push(&mut self, byte: u8) {
        let _ = self.0.push(byte);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// UTF-8 view, if the stored bytes are valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq<str> for Pin {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for Pin {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

/// Printable ASCII as is, anything else as `\xNN`
impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in self.as_bytes() {
            if byte.is_ascii_graphic() || byte == b' ' {
                f.write_char(char::from(byte))?;
            } else {
                write!(f, "\\x{:02X}", byte)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_render() {
        let id: TagId = "deadBEEF".parse().unwrap();
        assert_eq!(id.as_bytes(), &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(id.to_hex().as_str(), "DEADBEEF");
        assert_eq!(id.to_string(), "DEADBEEF");
    }

    #[test]
    fn test_render_zero_pads() {
        let id = TagId::from_bytes([0x00, 0x0A, 0x10, 0x01]);
        assert_eq!(id.to_hex().as_str(), "000A1001");
    }

    #[test]
    fn test_parse_rejects_bad_digits() {
        let err = TagId::parse(b"ZZZZZZZZ").unwrap_err();
        assert_eq!(err.to_string(), "Bad tag");
        assert!(TagId::parse(b"DEADBEE").is_err());
        assert!(TagId::parse(b"DEADBEEF0").is_err());
    }

    #[test]
    fn test_pin_bounds() {
        assert!(Pin::new(b"").is_err());
        assert!(Pin::new(&[b'1'; MAX_PIN_LEN]).is_ok());
        let err = Pin::new(&[b'1'; MAX_PIN_LEN + 1]).unwrap_err();
        assert_eq!(err.to_string(), "PIN too long");
    }

    #[test]
    fn test_pin_views() {
        let pin = Pin::new(b"1234").unwrap();
        assert_eq!(pin, "1234");
        assert_eq!(pin.as_str(), Some("1234"));
        assert_eq!(pin.to_string(), "1234");
        assert_eq!(pin.len(), 4);
    }

    #[test]
    fn test_pin_display_escapes_non_ascii() {
        let pin = Pin::new(&[b'1', 0xE9, b'2', 0x00, 0xFF]).unwrap();
        assert_eq!(pin.to_string(), "1\\xE92\\x00\\xFF");
        assert_eq!(pin.as_str(), None);
    }
}
