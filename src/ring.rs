//! Render command streamer scaffolding.
//!
//! The streamer keeps a host-memory ring image, builds well-formed MI batches
//! and tracks a software tail. The hardware tail register is never written:
//! until GGTT placement and ring register programming are verified, kicking
//! the engine risks a hang the machine cannot recover from. State inspection
//! and idle polling run against live registers under a forcewake hold.

use alloc::vec::Vec;

use log::{debug, info, warn};

use crate::config::BringupConfig;
use crate::error::XeError;
use crate::forcewake::{ForcewakeDomains, ForcewakeGuard};
use crate::mmio::RegisterSpace;
use crate::regs::{
    MI_BATCH_BUFFER_END, MI_MODE_RING_IDLE, MI_NOOP, PAGE_BYTES, RCS0_MI_MODE, RCS0_RING_CTL,
    RCS0_RING_HEAD, RCS0_RING_TAIL, RING_CTL_ENABLE, RING_CTL_SIZE_MASK, RING_CTL_SIZE_SHIFT,
};
use crate::time::delay_ms;

/// Default ring size: one page.
pub const DEFAULT_RING_BYTES: u32 = PAGE_BYTES;

/// Lifecycle of the streamer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingState {
    Uninitialized,
    Initialized,
    TornDown,
}

/// Software-side ring buffer for RCS0.
pub struct RingStreamer {
    state: RingState,
    buffer: Vec<u32>,
    size_bytes: u32,
    /// GGTT offset the ring would occupy once placement works; zero until then.
    ggtt_offset: u32,
    head: u32,
    tail: u32,
}

impl RingStreamer {
    pub fn new() -> Self {
        Self {
            state: RingState::Uninitialized,
            buffer: Vec::new(),
            size_bytes: 0,
            ggtt_offset: 0,
            head: 0,
            tail: 0,
        }
    }

    pub fn state(&self) -> RingState {
        self.state
    }

    pub fn tail(&self) -> u32 {
        self.tail
    }

    pub fn size_bytes(&self) -> u32 {
        self.size_bytes
    }

    /// Dword at byte offset `off` in the ring image. Test and diagnostic use.
    pub fn word_at(&self, off: u32) -> Option<u32> {
        self.buffer.get(off as usize / 4).copied()
    }

    /// Allocate the host-side ring image. `size_bytes` must be a power of two
    /// and page-aligned.
    pub fn initialize(&mut self, size_bytes: u32) -> Result<(), XeError> {
        if size_bytes == 0 || !size_bytes.is_power_of_two() || size_bytes % PAGE_BYTES != 0 {
            return Err(XeError::BadArgument);
        }
        let words = size_bytes as usize / 4;
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(words)
            .map_err(|_| XeError::AllocationFailed)?;
        buffer.resize(words, MI_NOOP);

        self.buffer = buffer;
        self.size_bytes = size_bytes;
        self.head = 0;
        self.tail = 0;
        self.state = RingState::Initialized;
        info!("ring: initialized, {} bytes host-side", size_bytes);
        Ok(())
    }

    /// Copy `words` into the ring at the software tail and advance it.
    ///
    /// Fails with `RingFull` (tail untouched) when the batch would not fit in
    /// one contiguous run before wrap.
    pub fn write_command(&mut self, words: &[u32]) -> Result<(), XeError> {
        if self.state != RingState::Initialized {
            return Err(XeError::NotReady);
        }
        let needed = u32::try_from(words.len())
            .ok()
            .and_then(|n| n.checked_mul(4))
            .ok_or(XeError::RingFull)?;
        if needed > self.size_bytes - self.tail {
            return Err(XeError::RingFull);
        }
        let start = self.tail as usize / 4;
        self.buffer[start..start + words.len()].copy_from_slice(words);
        self.tail = (self.tail + needed) & (self.size_bytes - 1);
        Ok(())
    }

    /// Record the new software tail. The hardware tail register is left
    /// untouched; submission stays armed-but-disabled until placement is
    /// verified.
    fn update_tail(&self) {
        debug!(
            "ring: software tail now {} (hardware tail not written)",
            self.tail
        );
    }

    /// Queue the canonical three-dword no-op batch: two MI_NOOPs and an
    /// MI_BATCH_BUFFER_END.
    pub fn submit_noop(&mut self) -> Result<(), XeError> {
        self.write_command(&[MI_NOOP, MI_NOOP, MI_BATCH_BUFFER_END])?;
        self.update_tail();
        info!("ring: queued no-op batch, software tail={}", self.tail);
        Ok(())
    }

    /// Log the live RCS0 ring registers. Uses sentinel reads so a dead window
    /// still produces a dump instead of an error. Touches no streamer state,
    /// so callers need not hold the ring lock.
    pub fn log_state(regs: &RegisterSpace, config: &BringupConfig) {
        let _wake = ForcewakeGuard::acquire(
            regs,
            ForcewakeDomains::GT | ForcewakeDomains::RENDER,
            config,
        );
        let ctl = regs.read32_or_sentinel(RCS0_RING_CTL);
        let head = regs.read32_or_sentinel(RCS0_RING_HEAD);
        let tail = regs.read32_or_sentinel(RCS0_RING_TAIL);
        let mode = regs.read32_or_sentinel(RCS0_MI_MODE);
        let enabled = ctl & RING_CTL_ENABLE != 0;
        let size_pages = ((ctl >> RING_CTL_SIZE_SHIFT) & RING_CTL_SIZE_MASK) + 1;
        info!(
            "ring: ctl=0x{:08x} (enabled={} size={} pages) head=0x{:08x} tail=0x{:08x} mode=0x{:08x}",
            ctl, enabled, size_pages, head, tail, mode
        );
    }

    /// Poll until the engine reports idle: hardware head equals hardware tail,
    /// or MI_MODE advertises rings-idle. One countdown step per millisecond; a
    /// zero budget times out immediately. Read failures count as not-idle for
    /// that iteration. Reads hardware only; callers must not hold the ring
    /// lock across the poll.
    pub fn wait_idle(regs: &RegisterSpace, timeout_ms: u32) -> Result<(), XeError> {
        let mut remaining = timeout_ms;
        while remaining > 0 {
            let idle = match (regs.read32(RCS0_RING_HEAD), regs.read32(RCS0_RING_TAIL)) {
                (Ok(head), Ok(tail)) if head == tail => true,
                _ => matches!(
                    regs.read32(RCS0_MI_MODE),
                    Ok(mode) if mode & MI_MODE_RING_IDLE != 0
                ),
            };
            if idle {
                return Ok(());
            }
            delay_ms(1);
            remaining -= 1;
        }
        warn!("ring: idle wait exhausted after {} ms", timeout_ms);
        Err(XeError::Timeout)
    }

    /// Release the host-side image. Idempotent.
    pub fn teardown(&mut self) {
        if self.state == RingState::Initialized {
            info!("ring: torn down, {} bytes released", self.size_bytes);
        }
        self.buffer = Vec::new();
        self.size_bytes = 0;
        self.ggtt_offset = 0;
        self.head = 0;
        self.tail = 0;
        self.state = RingState::TornDown;
    }
}

impl Default for RingStreamer {
    fn default() -> Self {
        Self::new()
    }
}
