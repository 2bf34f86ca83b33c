//! Bounds-checked access to the BAR0 register window.
//!
//! Every read and write goes through [`RegisterSpace`], which enforces:
//! - the window is actually mapped (non-null, at least one dword long),
//! - the offset is dword-aligned,
//! - the offset is below the safe ceiling,
//! - the full dword lies inside the mapped length.
//!
//! Failures are reported as `Err`, never escalated; callers decide what is
//! fatal. Diagnostic paths that must not fail use [`RegisterSpace::read32_or_sentinel`].

use core::sync::atomic::{fence, Ordering};

use crate::error::XeError;
use crate::regs::{MAX_SAFE_MMIO_OFFSET, SENTINEL_NO_MAPPING, SENTINEL_OUT_OF_RANGE};

/// A mapped (or deliberately unmapped) MMIO register window.
///
/// `base` may be null: an unmapped window is a valid state and every access
/// returns `NullMapping` instead of faulting.
pub struct RegisterSpace {
    base: *mut u32,
    mapped_len: usize,
    max_safe_offset: u32,
}

// SAFETY: the pointer addresses device MMIO (or a test buffer that outlives
// the window); accesses are volatile dword loads/stores with no aliasing
// assumptions, so sharing the handle across threads is sound.
unsafe impl Send for RegisterSpace {}
unsafe impl Sync for RegisterSpace {}

impl RegisterSpace {
    /// Wrap a mapped window. A null `base` or a `mapped_len` under one dword
    /// produces a window on which every access reports `NullMapping`.
    pub fn new(base: *mut u32, mapped_len: usize) -> Self {
        Self {
            base,
            mapped_len,
            max_safe_offset: MAX_SAFE_MMIO_OFFSET,
        }
    }

    /// An explicitly unmapped window.
    pub fn unmapped() -> Self {
        Self::new(core::ptr::null_mut(), 0)
    }

    /// Whether the window can service any access at all.
    pub fn is_mapped(&self) -> bool {
        !self.base.is_null() && self.mapped_len >= 4
    }

    /// Whether `offset` would pass the bounds check on this window.
    pub fn contains(&self, offset: u32) -> bool {
        self.is_mapped() && self.check(offset).is_ok()
    }

    fn check(&self, offset: u32) -> Result<(), XeError> {
        if !self.is_mapped() {
            return Err(XeError::NullMapping);
        }
        if offset % 4 != 0 || offset > self.max_safe_offset {
            return Err(XeError::OutOfRange);
        }
        let end = offset as usize + 4;
        if end > self.mapped_len {
            return Err(XeError::OutOfRange);
        }
        Ok(())
    }

    /// Read a dword register.
    pub fn read32(&self, offset: u32) -> Result<u32, XeError> {
        self.check(offset)?;
        // SAFETY: check() proved offset+4 <= mapped_len and base is non-null.
        let value = unsafe { core::ptr::read_volatile(self.base.add(offset as usize / 4)) };
        Ok(value)
    }

    /// Write a dword register. A fence after the store keeps posted writes
    /// ordered before any subsequent read.
    pub fn write32(&self, offset: u32, value: u32) -> Result<(), XeError> {
        self.check(offset)?;
        // SAFETY: check() proved offset+4 <= mapped_len and base is non-null.
        unsafe { core::ptr::write_volatile(self.base.add(offset as usize / 4), value) };
        fence(Ordering::SeqCst);
        Ok(())
    }

    /// Infallible read for diagnostic dumps: a distinct sentinel per failure
    /// mode instead of an `Err`. Never use the result for control decisions.
    pub fn read32_or_sentinel(&self, offset: u32) -> u32 {
        match self.read32(offset) {
            Ok(v) => v,
            Err(XeError::NullMapping) => SENTINEL_NO_MAPPING,
            Err(_) => SENTINEL_OUT_OF_RANGE,
        }
    }
}
