//! Store configuration
//!
//! Describes where the version byte and the record log live and which
//! backend class the layout targets. A configuration is chosen once at
//! startup and handed to [`TagStore::new`](crate::TagStore::new).
//!
//! # Example
//!
//! ```toml
//! backend = "external"
//! end_of_region = 32767
//! device_address = 0x50
//! ```

use crate::error::{Result, TagStoreError};
use crate::layout;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Backend class a layout is sized for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Directly addressed on-chip EEPROM (1 KiB class)
    Internal,
    /// Page-cached serial-bus EEPROM (32 KiB class)
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub backend: Backend,

    /// Offset of the format version byte
    pub version_offset: usize,

    /// First byte of the record log
    pub tag_start: usize,

    /// Records must end at or before this address
    pub end_of_region: usize,

    /// Shortest PIN accepted from a text entry
    pub min_pin_len: usize,

    /// 7-bit bus address of the external device
    pub device_address: u8,

    /// Expected value of the version byte
    pub format_version: u8,
}

impl StoreConfig {
    /// Layout for the on-chip EEPROM
    pub fn internal() -> Self {
        StoreConfig {
            backend: Backend::Internal,
            version_offset: layout::VERSION_OFFSET,
            tag_start: layout::TAG_START,
            end_of_region: layout::INTERNAL_END_OF_REGION,
            min_pin_len: layout::DEFAULT_MIN_PIN_LEN,
            device_address: 0x50,
            format_version: layout::FORMAT_VERSION,
        }
    }

    /// Layout for a 24LC256-class serial EEPROM
    pub fn external() -> Self {
        StoreConfig {
            backend: Backend::External,
            end_of_region: layout::EXTERNAL_END_OF_REGION,
            ..Self::internal()
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: StoreConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version_offset >= self.tag_start {
            return Err(TagStoreError::InvalidConfig(format!(
                "version byte ({}) must precede the record log ({})",
                self.version_offset, self.tag_start
            )));
        }

        // Room for at least one minimal record plus its trailing sentinel
        let min_record = layout::encoded_len(self.min_pin_len.max(1));
        if self.tag_start + min_record >= self.end_of_region {
            return Err(TagStoreError::InvalidConfig(format!(
                "record region {}..{} cannot hold a single record",
                self.tag_start, self.end_of_region
            )));
        }

        if self.min_pin_len == 0 || self.min_pin_len > layout::MAX_PIN_LEN {
            return Err(TagStoreError::InvalidConfig(format!(
                "min_pin_len must be within 1..={}",
                layout::MAX_PIN_LEN
            )));
        }

        if self.format_version == layout::SENTINEL {
            return Err(TagStoreError::InvalidConfig(
                "format_version 0xFF is indistinguishable from erased memory".to_string(),
            ));
        }

        if self.device_address > 0x7F {
            return Err(TagStoreError::InvalidConfig(format!(
                "device_address {:#04x} is not a 7-bit address",
                self.device_address
            )));
        }

        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::internal()
    }
}
