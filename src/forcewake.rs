//! Forcewake power-domain handshake.
//!
//! GT registers read garbage while the domain sleeps. [`ForcewakeGuard`]
//! raises the request bits, polls the acknowledge register with a bounded
//! budget, and releases on drop. Acquisition is best-effort: a missing ack
//! leaves the guard unacquired and dependent reads proceed as stale
//! diagnostics rather than failing the caller.

use bitflags::bitflags;
use log::{debug, warn};

use crate::config::BringupConfig;
use crate::mmio::RegisterSpace;
use crate::regs::{FORCEWAKE_ACK, FORCEWAKE_REQ};
use crate::time::delay_ms;

bitflags! {
    /// Power domains covered by the multithreaded forcewake interface.
    pub struct ForcewakeDomains: u16 {
        const GT = 1 << 0;
        const RENDER = 1 << 1;
        const MEDIA = 1 << 2;
    }
}

/// Poll iterations (1 ms apart) before giving up on the ack.
const ACK_POLL_BUDGET: u32 = 50;

/// RAII hold on a set of forcewake domains.
///
/// Dropping the guard clears the request bits, but only if the acquire
/// actually took effect; an unacquired guard never writes on release.
pub struct ForcewakeGuard<'a> {
    regs: &'a RegisterSpace,
    domains: ForcewakeDomains,
    acquired: bool,
}

impl<'a> ForcewakeGuard<'a> {
    /// Request `domains` and wait for the hardware acknowledge.
    ///
    /// Skipped entirely (guard reports unacquired) when forcewake is disabled
    /// by configuration or the request/ack pair is outside the mapped window.
    pub fn acquire(
        regs: &'a RegisterSpace,
        domains: ForcewakeDomains,
        config: &BringupConfig,
    ) -> Self {
        let mut guard = Self {
            regs,
            domains,
            acquired: false,
        };

        if config.forcewake_disabled() {
            debug!("forcewake: disabled by configuration, skipping");
            return guard;
        }
        if !regs.contains(FORCEWAKE_REQ) || !regs.contains(FORCEWAKE_ACK) {
            warn!("forcewake: request/ack registers not addressable, skipping");
            return guard;
        }

        let bits = domains.bits() as u32;
        // Masked-write layout: high half selects bits, low half sets them.
        if regs.write32(FORCEWAKE_REQ, (bits << 16) | bits).is_err() {
            return guard;
        }

        let mut remaining = ACK_POLL_BUDGET;
        while remaining > 0 {
            match regs.read32(FORCEWAKE_ACK) {
                Ok(ack) if ack & bits == bits => {
                    guard.acquired = true;
                    debug!("forcewake: acquired {:?} (ack=0x{:08x})", domains, ack);
                    return guard;
                }
                Ok(_) => {}
                // A failing read will not recover inside this budget.
                Err(_) => break,
            }
            delay_ms(1);
            remaining -= 1;
        }

        warn!("forcewake: no ack for {:?}, reads may be stale", domains);
        guard
    }

    /// Whether the hardware acknowledged the request.
    pub fn is_acquired(&self) -> bool {
        self.acquired
    }
}

impl Drop for ForcewakeGuard<'_> {
    fn drop(&mut self) {
        if !self.acquired {
            return;
        }
        // Mask set, value bits clear: release only our domains.
        let bits = self.domains.bits() as u32;
        if self.regs.write32(FORCEWAKE_REQ, bits << 16).is_err() {
            warn!("forcewake: release write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockWindow;

    #[test]
    fn test_acquire_with_preset_ack() {
        let win = MockWindow::new(0xB000);
        let domains = ForcewakeDomains::GT | ForcewakeDomains::RENDER;
        win.poke(FORCEWAKE_ACK, domains.bits() as u32);
        let regs = win.regs();

        let guard = ForcewakeGuard::acquire(&regs, domains, &BringupConfig::default());
        assert!(guard.is_acquired());
        let bits = domains.bits() as u32;
        assert_eq!(win.peek(FORCEWAKE_REQ), (bits << 16) | bits);

        drop(guard);
        assert_eq!(win.peek(FORCEWAKE_REQ), bits << 16);
    }

    #[test]
    fn test_no_ack_leaves_guard_unacquired() {
        let win = MockWindow::new(0xB000);
        let regs = win.regs();
        let bits = ForcewakeDomains::GT.bits() as u32;

        let guard = ForcewakeGuard::acquire(&regs, ForcewakeDomains::GT, &BringupConfig::default());
        assert!(!guard.is_acquired());
        let req_after_acquire = win.peek(FORCEWAKE_REQ);
        assert_eq!(req_after_acquire, (bits << 16) | bits);

        // Unacquired guard must not touch the register on drop.
        drop(guard);
        assert_eq!(win.peek(FORCEWAKE_REQ), req_after_acquire);
    }

    #[test]
    fn test_disabled_by_config_touches_nothing() {
        let win = MockWindow::new(0xB000);
        let regs = win.regs();
        let config = BringupConfig {
            disable_forcewake: true,
            ..BringupConfig::default()
        };

        let guard = ForcewakeGuard::acquire(&regs, ForcewakeDomains::GT, &config);
        assert!(!guard.is_acquired());
        assert_eq!(win.peek(FORCEWAKE_REQ), 0);
    }

    #[test]
    fn test_strict_safe_built_directly_touches_nothing() {
        let win = MockWindow::new(0xB000);
        win.poke(FORCEWAKE_ACK, ForcewakeDomains::GT.bits() as u32);
        let regs = win.regs();
        let config = BringupConfig {
            strict_safe: true,
            ..BringupConfig::default()
        };

        let guard = ForcewakeGuard::acquire(&regs, ForcewakeDomains::GT, &config);
        assert!(!guard.is_acquired());
        assert_eq!(win.peek(FORCEWAKE_REQ), 0);
    }

    #[test]
    fn test_window_without_forcewake_registers() {
        // Window too small to reach 0xA188.
        let win = MockWindow::new(0x1000);
        let regs = win.regs();
        let guard = ForcewakeGuard::acquire(&regs, ForcewakeDomains::GT, &BringupConfig::default());
        assert!(!guard.is_acquired());
    }
}
