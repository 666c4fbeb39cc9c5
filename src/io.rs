//! EEPROM image files
//!
//! A directly addressed backend over a file on the host. Used by the
//! `tagstore` tool to inspect and prepare device images, and by tests that
//! need the store to survive a simulated power cycle.

use crate::error::Result;
use crate::layout::SENTINEL;
use crate::storage::ByteStorage;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// File-backed byte storage
///
/// Byte access follows the fail-silent contract of [`ByteStorage`]: an I/O
/// failure is logged and otherwise ignored.
pub struct ImageFile {
    file: File,
    path: PathBuf,
    size: usize,
}

impl ImageFile {
    /// Create (or truncate) an image of `size` erased bytes
    pub fn create<P: AsRef<Path>>(path: P, size: usize) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        file.write_all(&vec![SENTINEL; size])?;
        file.flush()?;

        Ok(ImageFile {
            file,
            path: path.as_ref().to_path_buf(),
            size,
        })
    }

    /// Open an existing image; its length is the device size
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let size = file.metadata()?.len() as usize;

        Ok(ImageFile {
            file,
            path: path.as_ref().to_path_buf(),
            size,
        })
    }

    /// Open an image, creating an erased one of `size` bytes if it is missing
    pub fn open_or_create<P: AsRef<Path>>(path: P, size: usize) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path, size)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sync all writes to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    fn try_read(&mut self, address: usize) -> std::io::Result<u8> {
        let mut byte = [SENTINEL];
        self.file.seek(SeekFrom::Start(address as u64))?;
        self.file.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    fn try_write(&mut self, address: usize, value: u8) -> std::io::Result<()> {
        self.file.seek(SeekFrom::Start(address as u64))?;
        self.file.write_all(&[value])
    }
}

impl ByteStorage for ImageFile {
    fn init(&mut self) {}

    fn read_byte(&mut self, address: usize) -> u8 {
        if address >= self.size {
            return SENTINEL;
        }
        match self.try_read(address) {
            Ok(byte) => byte,
            Err(e) => {
                warn!("image read at {} failed: {}", address, e);
                SENTINEL
            }
        }
    }

    fn write_byte(&mut self, address: usize, value: u8) {
        if address >= self.size || self.read_byte(address) == value {
            return;
        }
        if let Err(e) = self.try_write(address, value) {
            warn!("image write at {} failed: {}", address, e);
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.file.flush() {
            warn!("image flush failed: {}", e);
        }
    }

    fn capacity(&self) -> usize {
        self.size
    }
}
