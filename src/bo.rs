//! Buffer objects and their cookie registry.
//!
//! External callers never see pointers; a buffer object is identified by a
//! 1-based dense cookie. Slots are never reused within a device lifetime, so
//! a stale cookie stays invalid instead of silently aliasing a new buffer.

use alloc::vec::Vec;

use log::{debug, info, warn};

use crate::error::XeError;
use crate::ggtt::GgttProbe;
use crate::regs::PAGE_BYTES;

/// Largest request accepted, 64 MiB.
pub const MAX_BO_BYTES: u32 = 64 * 1024 * 1024;

/// A host-memory buffer object.
pub struct BufferObject {
    backing: Vec<u8>,
    size_bytes: u32,
    /// GGTT placement once pinned; zero while unpinned.
    ggtt_offset: u32,
    pinned: bool,
}

impl BufferObject {
    pub fn size_bytes(&self) -> u32 {
        self.size_bytes
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn ggtt_offset(&self) -> u32 {
        self.ggtt_offset
    }

    pub fn bytes(&self) -> &[u8] {
        &self.backing
    }
}

/// Cookie-indexed registry of live buffer objects.
pub struct BufferObjectRegistry {
    slots: Vec<Option<BufferObject>>,
}

impl BufferObjectRegistry {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Allocate a zero-filled buffer, rounded up to whole pages. Returns the
    /// new cookie. Zero-sized and oversized requests are rejected.
    pub fn create(&mut self, size_bytes: u32) -> Result<u64, XeError> {
        if size_bytes == 0 || size_bytes > MAX_BO_BYTES {
            return Err(XeError::BadArgument);
        }
        let rounded = size_bytes
            .checked_add(PAGE_BYTES - 1)
            .ok_or(XeError::BadArgument)?
            & !(PAGE_BYTES - 1);

        let mut backing = Vec::new();
        backing
            .try_reserve_exact(rounded as usize)
            .map_err(|_| XeError::AllocationFailed)?;
        backing.resize(rounded as usize, 0);

        self.slots.push(Some(BufferObject {
            backing,
            size_bytes: rounded,
            ggtt_offset: 0,
            pinned: false,
        }));
        let cookie = self.slots.len() as u64;
        info!("bo: created cookie={} size={} bytes", cookie, rounded);
        Ok(cookie)
    }

    fn slot_index(&self, cookie: u64) -> Result<usize, XeError> {
        if cookie == 0 || cookie > self.slots.len() as u64 {
            return Err(XeError::InvalidCookie);
        }
        Ok((cookie - 1) as usize)
    }

    /// Look up a live buffer object.
    pub fn resolve(&self, cookie: u64) -> Result<&BufferObject, XeError> {
        let idx = self.slot_index(cookie)?;
        self.slots[idx].as_ref().ok_or(XeError::InvalidCookie)
    }

    /// Release a buffer object. The slot stays occupied-but-empty so the
    /// cookie is dead forever.
    pub fn destroy(&mut self, cookie: u64) -> Result<(), XeError> {
        let idx = self.slot_index(cookie)?;
        match self.slots[idx].take() {
            Some(bo) => {
                debug!("bo: destroyed cookie={} size={}", cookie, bo.size_bytes);
                Ok(())
            }
            None => Err(XeError::InvalidCookie),
        }
    }

    /// Give a buffer a GGTT placement. Fails today because the allocator does
    /// not exist yet; the call shape is kept so callers exercise the path.
    pub fn pin(&mut self, cookie: u64, ggtt: &mut GgttProbe) -> Result<u32, XeError> {
        let idx = self.slot_index(cookie)?;
        let bo = self.slots[idx].as_mut().ok_or(XeError::InvalidCookie)?;
        if bo.pinned {
            return Err(XeError::BadArgument);
        }
        let offset = ggtt.allocate(bo.size_bytes)?;
        bo.ggtt_offset = offset;
        bo.pinned = true;
        Ok(offset)
    }

    /// Drop every live object. Teardown path.
    pub fn release_all(&mut self) {
        let live = self.live_count();
        if live > 0 {
            warn!("bo: releasing {} live buffer object(s) at teardown", live);
        }
        for slot in &mut self.slots {
            *slot = None;
        }
    }
}

impl Default for BufferObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockWindow;

    #[test]
    fn test_cookies_are_dense_and_one_based() {
        let mut reg = BufferObjectRegistry::new();
        assert_eq!(reg.create(100).unwrap(), 1);
        assert_eq!(reg.create(100).unwrap(), 2);
        assert_eq!(reg.create(100).unwrap(), 3);
    }

    #[test]
    fn test_size_rounds_up_to_pages() {
        let mut reg = BufferObjectRegistry::new();
        let cookie = reg.create(1).unwrap();
        assert_eq!(reg.resolve(cookie).unwrap().size_bytes(), PAGE_BYTES);
        let cookie = reg.create(PAGE_BYTES).unwrap();
        assert_eq!(reg.resolve(cookie).unwrap().size_bytes(), PAGE_BYTES);
        let cookie = reg.create(PAGE_BYTES + 1).unwrap();
        assert_eq!(reg.resolve(cookie).unwrap().size_bytes(), 2 * PAGE_BYTES);
    }

    #[test]
    fn test_create_rejects_zero_and_oversize() {
        let mut reg = BufferObjectRegistry::new();
        assert_eq!(reg.create(0), Err(XeError::BadArgument));
        assert_eq!(reg.create(MAX_BO_BYTES + 1), Err(XeError::BadArgument));
        assert!(reg.create(MAX_BO_BYTES).is_ok());
    }

    #[test]
    fn test_destroyed_cookie_stays_dead() {
        let mut reg = BufferObjectRegistry::new();
        let a = reg.create(100).unwrap();
        let b = reg.create(1).unwrap();
        assert_eq!(reg.resolve(3).err(), Some(XeError::InvalidCookie));
        reg.destroy(a).unwrap();
        assert_eq!(reg.resolve(a).err(), Some(XeError::InvalidCookie));
        assert_eq!(reg.destroy(a), Err(XeError::InvalidCookie));
        // Neighbors survive; new allocations get fresh cookies.
        assert!(reg.resolve(b).is_ok());
        let c = reg.create(100).unwrap();
        assert_eq!(c, 3);
    }

    #[test]
    fn test_bad_cookies_rejected() {
        let reg = BufferObjectRegistry::new();
        assert_eq!(reg.resolve(0).err(), Some(XeError::InvalidCookie));
        assert_eq!(reg.resolve(1).err(), Some(XeError::InvalidCookie));
        assert_eq!(reg.resolve(u64::MAX).err(), Some(XeError::InvalidCookie));
    }

    #[test]
    fn test_pin_fails_until_allocator_exists() {
        let win = MockWindow::new(0x3000);
        win.poke(crate::regs::PGTBL_CTL, 0x1000);
        let mut ggtt = GgttProbe::probe(&win.regs()).unwrap();

        let mut reg = BufferObjectRegistry::new();
        let cookie = reg.create(4096).unwrap();
        assert_eq!(reg.pin(cookie, &mut ggtt), Err(XeError::NotReady));
        assert!(!reg.resolve(cookie).unwrap().is_pinned());
    }

    #[test]
    fn test_release_all_clears_everything() {
        let mut reg = BufferObjectRegistry::new();
        let a = reg.create(100).unwrap();
        let b = reg.create(100).unwrap();
        reg.release_all();
        assert_eq!(reg.live_count(), 0);
        assert_eq!(reg.resolve(a).err(), Some(XeError::InvalidCookie));
        assert_eq!(reg.resolve(b).err(), Some(XeError::InvalidCookie));
    }
}
