//! Global graphics translation table probe.
//!
//! Read-only for now: the probe records whether PGTBL_CTL claims an enabled
//! table and a page-masked base guess. Allocation is deliberately
//! unimplemented; it fails loudly instead of handing out fake offsets.

use log::{info, warn};

use crate::error::XeError;
use crate::mmio::RegisterSpace;
use crate::regs::{GGTT_APERTURE_BYTES, PGTBL_CTL};

/// Result of probing the translation-table control register.
#[derive(Debug, Clone, Copy)]
pub struct GgttProbe {
    /// PGTBL_CTL read back nonzero.
    pub enabled: bool,
    /// Control value with the low 12 bits masked off. A guess, not a verified
    /// table address.
    pub base_guess: u32,
}

impl GgttProbe {
    /// Read PGTBL_CTL and record what the hardware claims.
    pub fn probe(regs: &RegisterSpace) -> Result<Self, XeError> {
        let ctl = regs.read32(PGTBL_CTL)?;
        let enabled = ctl != 0;
        let base_guess = ctl & !0xFFF;
        if enabled {
            info!(
                "ggtt: PGTBL_CTL=0x{:08x} base_guess=0x{:08x} aperture={} MiB",
                ctl,
                base_guess,
                GGTT_APERTURE_BYTES / (1024 * 1024)
            );
        } else {
            info!("ggtt: PGTBL_CTL reads zero, translation table disabled");
        }
        Ok(Self { enabled, base_guess })
    }

    /// Reserve `size_bytes` of GGTT address space.
    ///
    /// Not implemented: entry writes and TLB invalidation are unverified on
    /// this hardware, so pinning fails visibly rather than pretending.
    pub fn allocate(&mut self, size_bytes: u32) -> Result<u32, XeError> {
        warn!(
            "ggtt: allocation of {} bytes requested, allocator not implemented",
            size_bytes
        );
        Err(XeError::NotReady)
    }
}
