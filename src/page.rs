use crate::layout::SENTINEL;

/// Page size of the external EEPROM (24LC256)
pub const PAGE_SIZE: usize = 64;

const PAGE_MASK: usize = PAGE_SIZE - 1;

/// Page-aligned base of the page holding `address`
pub const fn page_base(address: usize) -> usize {
    address & !PAGE_MASK
}

/// Position of `address` inside its page
pub const fn page_offset(address: usize) -> usize {
    address & PAGE_MASK
}

/// The single resident page of the cache
///
/// `base` is `None` until a page has been loaded successfully. The buffer
/// holds the erased pattern whenever no page is resident.
#[derive(Debug, Clone)]
pub struct CacheLine {
    base: Option<usize>,
    bytes: [u8; PAGE_SIZE],
    dirty: bool,
}

impl CacheLine {
    pub fn new() -> Self {
        CacheLine {
            base: None,
            bytes: [SENTINEL; PAGE_SIZE],
            dirty: false,
        }
    }

    /// Base address of the resident page
    pub fn base(&self) -> Option<usize> {
        self.base
    }

    pub fn holds(&self, address: usize) -> bool {
        self.base == Some(page_base(address))
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Drop residency and blank the buffer to the erased pattern
    pub fn erase(&mut self) {
        self.base = None;
        self.bytes = [SENTINEL; PAGE_SIZE];
        self.dirty = false;
    }

    /// Buffer to fill from the device
    pub fn buffer_mut(&mut self) -> &mut [u8; PAGE_SIZE] {
        &mut self.bytes
    }

    pub fn bytes(&self) -> &[u8; PAGE_SIZE] {
        &self.bytes
    }

    /// Mark the buffer as the contents of the page at `base`
    pub fn install(&mut self, base: usize) {
        debug_assert_eq!(page_base(base), base);
        self.base = Some(base);
        self.dirty = false;
    }

    pub fn get(&self, address: usize) -> u8 {
        self.bytes[page_offset(address)]
    }

    /// Store `value`; returns true if the buffer changed
    pub fn set(&mut self, address: usize, value: u8) -> bool {
        let slot = &mut self.bytes[page_offset(address)];
        if *slot == value {
            return false;
        }
        *slot = value;
        self.dirty = true;
        true
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

impl Default for CacheLine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_arithmetic() {
        assert_eq!(page_base(0), 0);
        assert_eq!(page_base(63), 0);
        assert_eq!(page_base(64), 64);
        assert_eq!(page_base(200), 192);
        assert_eq!(page_offset(200), 8);
    }

    #[test]
    fn test_new_line_is_empty_and_erased() {
        let line = CacheLine::new();
        assert_eq!(line.base(), None);
        assert!(!line.is_dirty());
        assert!(line.bytes().iter().all(|&b| b == 0xFF));
        assert!(!line.holds(0));
    }

    #[test]
    fn test_set_marks_dirty_only_on_change() {
        let mut line = CacheLine::new();
        line.install(128);

        assert!(!line.set(130, 0xFF));
        assert!(!line.is_dirty());

        assert!(line.set(130, 0x01));
        assert!(line.is_dirty());
        assert_eq!(line.get(130), 0x01);
        assert!(line.holds(191));
        assert!(!line.holds(192));
    }

    #[test]
    fn test_erase_resets() {
        let mut line = CacheLine::new();
        line.install(64);
        line.set(64, 0);
        line.erase();

        assert_eq!(line.base(), None);
        assert!(!line.is_dirty());
        assert_eq!(line.bytes()[0], 0xFF);
    }
}
