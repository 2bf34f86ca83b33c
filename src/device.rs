//! Device bring-up state machine.
//!
//! `XeDevice::open` walks the milestone ladder in order:
//!
//! 1. map the BAR0 register window (fatal on failure)
//! 2. identify the adapter from PCI config space (fatal on absent device)
//! 3. probe power state under forcewake
//! 4. probe the translation table
//! 5. initialize the command streamer (host-side only)
//! 6. interrupt and firmware stages, recorded as prepared-not-ready
//!
//! Only the first two stages are fatal; later failures downgrade the device
//! to a prepared state that still serves diagnostics.

use log::{error, info, warn};
use spin::Mutex;

use crate::bo::BufferObjectRegistry;
use crate::config::BringupConfig;
use crate::error::XeError;
use crate::forcewake::{ForcewakeDomains, ForcewakeGuard};
use crate::ggtt::GgttProbe;
use crate::mmio::RegisterSpace;
use crate::regs::{
    GEN6_RC_CONTROL, GEN6_RC_STATE, GEN6_RPNSWREQ, GEN6_RP_CONTROL, HSW_PWR_WELL_CTL1,
    HSW_PWR_WELL_CTL2, RC6_RESIDENCY_TIME,
};
use crate::ring::{RingStreamer, DEFAULT_RING_BYTES};

/// PCI config-space offsets.
pub const PCI_VENDOR_ID: u8 = 0x00;
pub const PCI_DEVICE_ID: u8 = 0x02;
pub const PCI_REVISION_ID: u8 = 0x08;

/// Intel's PCI vendor id.
pub const VENDOR_INTEL: u16 = 0x8086;

/// Read access to a device's PCI configuration space. The host adapter
/// implements this over its platform's config mechanism.
pub trait PciConfigRead {
    fn config_read16(&self, offset: u8) -> u16;
    fn config_read8(&self, offset: u8) -> u8;
}

/// A mapped BAR0 window as handed over by the host adapter.
#[derive(Debug, Clone, Copy)]
pub struct Bar0 {
    pub base: *mut u32,
    pub len: usize,
}

/// Bring-up milestones, strictly ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BringupState {
    Unmapped,
    BarMapped,
    Identified,
    PowerProbed,
    RingReady,
    /// Everything up to acceleration prerequisites verified.
    AccelReady,
    /// Bring-up completed but one or more stages only prepared.
    AccelPrepared,
    Stopped,
}

/// What the PCI config space said about the adapter.
#[derive(Debug, Clone, Copy)]
pub struct DeviceIdent {
    pub vendor_id: u16,
    pub device_id: u16,
    pub revision: u8,
    pub name: &'static str,
}

/// Per-stage readiness, reported through the external surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadinessReport {
    /// Bring-up reached its terminal state.
    pub ready: bool,
    pub forcewake_acked: bool,
    pub ggtt_ready: bool,
    pub ring_ready: bool,
    /// Interrupt delivery is not wired up; always prepared-only.
    pub irq_ready: bool,
    /// Firmware (GuC/HuC) load is not attempted; always prepared-only.
    pub firmware_ready: bool,
}

/// An opened Xe adapter.
pub struct XeDevice {
    pub(crate) config: BringupConfig,
    pub(crate) state: BringupState,
    pub(crate) regs: RegisterSpace,
    pub(crate) ident: DeviceIdent,
    pub(crate) ggtt: Option<GgttProbe>,
    pub(crate) ring: Mutex<RingStreamer>,
    pub(crate) bos: Mutex<BufferObjectRegistry>,
    pub(crate) readiness: ReadinessReport,
}

impl XeDevice {
    /// Bring the adapter up. Fatal errors (no window, no device) return `Err`;
    /// anything later degrades the terminal state instead.
    pub fn open(
        config: BringupConfig,
        bar0: Bar0,
        pci: &dyn PciConfigRead,
    ) -> Result<Self, XeError> {
        let regs = RegisterSpace::new(bar0.base, bar0.len);
        if !regs.is_mapped() {
            error!("device: BAR0 window not mapped, aborting");
            return Err(XeError::NullMapping);
        }

        let mut dev = Self {
            config,
            state: BringupState::BarMapped,
            regs,
            ident: DeviceIdent {
                vendor_id: 0,
                device_id: 0,
                revision: 0,
                name: "unidentified",
            },
            ggtt: None,
            ring: Mutex::new(RingStreamer::new()),
            bos: Mutex::new(BufferObjectRegistry::new()),
            readiness: ReadinessReport::default(),
        };

        dev.identify(pci)?;
        dev.probe_power();
        dev.probe_ggtt();
        dev.init_ring();

        // Interrupt and firmware bring-up are out of scope; record them as
        // prepared so the readiness report is honest.
        dev.readiness.irq_ready = false;
        dev.readiness.firmware_ready = false;

        dev.readiness.ready = true;
        dev.state = if dev.readiness.ring_ready && dev.readiness.ggtt_ready {
            BringupState::AccelReady
        } else {
            BringupState::AccelPrepared
        };
        info!("device: bring-up complete, state={:?}", dev.state);
        Ok(dev)
    }

    fn identify(&mut self, pci: &dyn PciConfigRead) -> Result<(), XeError> {
        let vendor = pci.config_read16(PCI_VENDOR_ID);
        if vendor == 0xFFFF {
            error!("device: config space reads all-ones, no device present");
            return Err(XeError::NotReady);
        }
        let device = pci.config_read16(PCI_DEVICE_ID);
        let revision = pci.config_read8(PCI_REVISION_ID);
        self.ident = DeviceIdent {
            vendor_id: vendor,
            device_id: device,
            revision,
            name: device_name(device),
        };
        if vendor != VENDOR_INTEL {
            warn!("device: unexpected vendor 0x{:04x}", vendor);
        }
        info!(
            "device: {:04x}:{:04x} rev {:02x} ({})",
            vendor, device, revision, self.ident.name
        );
        self.state = BringupState::Identified;
        Ok(())
    }

    /// Dump RP/RC and power-well state under a forcewake hold. Informational
    /// only; a missing ack is recorded, not fatal.
    fn probe_power(&mut self) {
        let wake = ForcewakeGuard::acquire(
            &self.regs,
            ForcewakeDomains::GT | ForcewakeDomains::RENDER,
            &self.config,
        );
        self.readiness.forcewake_acked = wake.is_acquired();
        if self.config.verbose {
            info!(
                "power: rpnswreq=0x{:08x} rp_ctl=0x{:08x} rc_ctl=0x{:08x} rc_state=0x{:08x}",
                self.regs.read32_or_sentinel(GEN6_RPNSWREQ),
                self.regs.read32_or_sentinel(GEN6_RP_CONTROL),
                self.regs.read32_or_sentinel(GEN6_RC_CONTROL),
                self.regs.read32_or_sentinel(GEN6_RC_STATE),
            );
            info!(
                "power: pwr_well1=0x{:08x} pwr_well2=0x{:08x} rc6_residency=0x{:08x}",
                self.regs.read32_or_sentinel(HSW_PWR_WELL_CTL1),
                self.regs.read32_or_sentinel(HSW_PWR_WELL_CTL2),
                self.regs.read32_or_sentinel(RC6_RESIDENCY_TIME),
            );
        }
        drop(wake);
        self.state = BringupState::PowerProbed;
    }

    fn probe_ggtt(&mut self) {
        match GgttProbe::probe(&self.regs) {
            Ok(probe) => {
                self.readiness.ggtt_ready = probe.enabled;
                self.ggtt = Some(probe);
            }
            Err(e) => {
                warn!("device: ggtt probe failed ({}), continuing prepared", e);
            }
        }
    }

    fn init_ring(&mut self) {
        if self.config.command_stream_disabled() {
            info!("device: command streamer disabled by configuration");
            return;
        }
        let mut ring = self.ring.lock();
        match ring.initialize(DEFAULT_RING_BYTES) {
            Ok(()) => {
                self.readiness.ring_ready = true;
                drop(ring);
                self.state = BringupState::RingReady;
            }
            Err(e) => {
                warn!("device: ring init failed ({}), continuing prepared", e);
            }
        }
    }

    /// Guard for every external operation: a stopped device serves nothing.
    pub(crate) fn ensure_running(&self) -> Result<(), XeError> {
        if self.state == BringupState::Stopped {
            return Err(XeError::NotReady);
        }
        Ok(())
    }

    pub fn state(&self) -> BringupState {
        self.state
    }

    pub fn ident(&self) -> DeviceIdent {
        self.ident
    }

    pub fn readiness(&self) -> ReadinessReport {
        self.readiness
    }

    /// Tear the device down in reverse bring-up order: streamer, translation
    /// table, buffer objects, then the window. Idempotent.
    pub fn close(&mut self) {
        if self.state == BringupState::Stopped {
            return;
        }
        self.ring.lock().teardown();
        self.ggtt = None;
        self.bos.lock().release_all();
        self.regs = RegisterSpace::unmapped();
        self.readiness = ReadinessReport::default();
        self.state = BringupState::Stopped;
        info!("device: stopped");
    }
}

impl Drop for XeDevice {
    fn drop(&mut self) {
        self.close();
    }
}

/// Marketing name for a known device id.
pub fn device_name(device_id: u16) -> &'static str {
    match device_id {
        0x4680 | 0x4682 | 0x4688 | 0x468A => "Alder Lake-S GT1 (UHD 7xx)",
        0x46A0 | 0x46A3 | 0x46A6 | 0x46A8 => "Alder Lake-P GT2 (Iris Xe)",
        0xA780 | 0xA781 | 0xA782 | 0xA783 => "Raptor Lake-S GT1 (UHD 770)",
        0xA788 | 0xA789 => "Raptor Lake-S GT1 (UHD 710)",
        0xA7A0 | 0xA7A1 | 0xA7A8 | 0xA7A9 => "Raptor Lake-P GT2 (Iris Xe)",
        0x5690 | 0x5691 | 0x5692 => "DG2 (Arc A7xx)",
        0x56A0 | 0x56A1 | 0x56A2 => "DG2 (Arc A7xx desktop)",
        0x56A5 | 0x56A6 => "DG2 (Arc A3xx desktop)",
        _ => "Unknown Intel Xe",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regs::{FORCEWAKE_ACK, PGTBL_CTL};
    use crate::testutil::{MockPci, MockWindow};

    fn full_window() -> MockWindow {
        let win = MockWindow::new(0x0014_0000);
        win.poke(PGTBL_CTL, 0x0080_0001);
        win.poke(
            FORCEWAKE_ACK,
            (ForcewakeDomains::GT | ForcewakeDomains::RENDER).bits() as u32,
        );
        win
    }

    #[test]
    fn test_open_reaches_accel_ready() {
        let win = full_window();
        let pci = MockPci::raptor_lake();
        let dev = XeDevice::open(BringupConfig::default(), win.bar0(), &pci).unwrap();
        assert_eq!(dev.state(), BringupState::AccelReady);
        let r = dev.readiness();
        assert!(r.ready && r.forcewake_acked && r.ggtt_ready && r.ring_ready);
        assert!(!r.irq_ready && !r.firmware_ready);
        assert_eq!(dev.ident().vendor_id, VENDOR_INTEL);
    }

    #[test]
    fn test_open_without_window_is_fatal() {
        let pci = MockPci::raptor_lake();
        let bar0 = Bar0 {
            base: core::ptr::null_mut(),
            len: 0,
        };
        assert!(matches!(
            XeDevice::open(BringupConfig::default(), bar0, &pci),
            Err(XeError::NullMapping)
        ));
    }

    #[test]
    fn test_open_absent_device_is_fatal() {
        let win = full_window();
        let pci = MockPci::absent();
        assert!(matches!(
            XeDevice::open(BringupConfig::default(), win.bar0(), &pci),
            Err(XeError::NotReady)
        ));
    }

    #[test]
    fn test_disabled_ggtt_degrades_to_prepared() {
        let win = MockWindow::new(0x0014_0000);
        win.poke(
            FORCEWAKE_ACK,
            (ForcewakeDomains::GT | ForcewakeDomains::RENDER).bits() as u32,
        );
        let pci = MockPci::raptor_lake();
        let dev = XeDevice::open(BringupConfig::default(), win.bar0(), &pci).unwrap();
        assert_eq!(dev.state(), BringupState::AccelPrepared);
        assert!(dev.readiness().ready);
        assert!(!dev.readiness().ggtt_ready);
    }

    #[test]
    fn test_nocs_skips_ring() {
        let win = full_window();
        let pci = MockPci::raptor_lake();
        let config = BringupConfig::parse("nocs");
        let dev = XeDevice::open(config, win.bar0(), &pci).unwrap();
        assert_eq!(dev.state(), BringupState::AccelPrepared);
        assert!(!dev.readiness().ring_ready);
    }

    #[test]
    fn test_close_is_idempotent_and_terminal() {
        let win = full_window();
        let pci = MockPci::raptor_lake();
        let mut dev = XeDevice::open(BringupConfig::default(), win.bar0(), &pci).unwrap();
        dev.close();
        assert_eq!(dev.state(), BringupState::Stopped);
        assert_eq!(dev.ensure_running(), Err(XeError::NotReady));
        dev.close();
        assert_eq!(dev.state(), BringupState::Stopped);
    }

    #[test]
    fn test_device_name_table() {
        assert_eq!(device_name(0xA780), "Raptor Lake-S GT1 (UHD 770)");
        assert_eq!(device_name(0x0042), "Unknown Intel Xe");
    }
}
