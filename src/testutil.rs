//! Mock hardware backends.
//!
//! A [`MockWindow`] is a heap-backed stand-in for the BAR0 MMIO window and a
//! [`MockPci`] answers config-space reads, so the whole bring-up path runs
//! hosted with no device present.

use core::cell::UnsafeCell;

use alloc::vec;
use alloc::vec::Vec;

use crate::device::{Bar0, PciConfigRead, PCI_DEVICE_ID, PCI_REVISION_ID, PCI_VENDOR_ID};
use crate::mmio::RegisterSpace;

/// A fake register window over heap memory.
pub struct MockWindow {
    words: UnsafeCell<Vec<u32>>,
    len_bytes: usize,
}

// SAFETY: test fixture; concurrent access is the test's responsibility.
unsafe impl Sync for MockWindow {}

impl MockWindow {
    /// Zero-filled window of `len_bytes` (rounded down to whole dwords).
    pub fn new(len_bytes: usize) -> Self {
        Self {
            words: UnsafeCell::new(vec![0u32; len_bytes / 4]),
            len_bytes: (len_bytes / 4) * 4,
        }
    }

    fn ptr(&self) -> *mut u32 {
        // SAFETY: the Vec is never resized after construction.
        unsafe { (*self.words.get()).as_mut_ptr() }
    }

    /// A register-space view. The window must outlive it.
    pub fn regs(&self) -> RegisterSpace {
        RegisterSpace::new(self.ptr(), self.len_bytes)
    }

    /// The window as a raw BAR handoff.
    pub fn bar0(&self) -> Bar0 {
        Bar0 {
            base: self.ptr(),
            len: self.len_bytes,
        }
    }

    /// Backdoor write, bypassing the bounds checks. Panics on a bad offset.
    pub fn poke(&self, offset: u32, value: u32) {
        assert!(offset as usize + 4 <= self.len_bytes && offset % 4 == 0);
        // SAFETY: asserted in bounds; volatile to match the access layer.
        unsafe { core::ptr::write_volatile(self.ptr().add(offset as usize / 4), value) };
    }

    /// Backdoor read. Panics on a bad offset.
    pub fn peek(&self, offset: u32) -> u32 {
        assert!(offset as usize + 4 <= self.len_bytes && offset % 4 == 0);
        // SAFETY: asserted in bounds.
        unsafe { core::ptr::read_volatile(self.ptr().add(offset as usize / 4)) }
    }
}

/// Canned PCI config space.
#[derive(Debug, Clone, Copy)]
pub struct MockPci {
    pub vendor_id: u16,
    pub device_id: u16,
    pub revision: u8,
}

impl MockPci {
    /// A Raptor Lake-S UHD 770 as it identifies itself.
    pub fn raptor_lake() -> Self {
        Self {
            vendor_id: 0x8086,
            device_id: 0xA780,
            revision: 0x04,
        }
    }

    /// No device in the slot: config space reads all-ones.
    pub fn absent() -> Self {
        Self {
            vendor_id: 0xFFFF,
            device_id: 0xFFFF,
            revision: 0xFF,
        }
    }
}

impl PciConfigRead for MockPci {
    fn config_read16(&self, offset: u8) -> u16 {
        match offset {
            PCI_VENDOR_ID => self.vendor_id,
            PCI_DEVICE_ID => self.device_id,
            _ => 0,
        }
    }

    fn config_read8(&self, offset: u8) -> u8 {
        match offset {
            PCI_REVISION_ID => self.revision,
            _ => 0,
        }
    }
}
