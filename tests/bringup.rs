//! End-to-end bring-up over mock hardware: open, exercise the external
//! surface, tear down.

use xe_bringup::forcewake::ForcewakeDomains;
use xe_bringup::regs::{FORCEWAKE_ACK, FORCEWAKE_REQ, PGTBL_CTL};
use xe_bringup::testutil::{MockPci, MockWindow};
use xe_bringup::{BringupConfig, BringupState, XeDevice, XeError};

/// A window large enough for every register the core touches, with forcewake
/// acking instantly and an enabled translation table.
fn live_window() -> MockWindow {
    let win = MockWindow::new(0x0014_0000);
    win.poke(PGTBL_CTL, 0x00C0_0001);
    win.poke(
        FORCEWAKE_ACK,
        (ForcewakeDomains::GT | ForcewakeDomains::RENDER).bits() as u32,
    );
    win
}

#[test]
fn full_bringup_and_teardown() {
    let win = live_window();
    let pci = MockPci::raptor_lake();
    let mut dev = XeDevice::open(BringupConfig::parse("verbose"), win.bar0(), &pci).unwrap();

    assert_eq!(dev.state(), BringupState::AccelReady);
    let readiness = dev.readiness();
    assert!(readiness.ready);
    assert!(readiness.forcewake_acked);
    assert!(readiness.ggtt_ready);
    assert!(readiness.ring_ready);
    assert!(!readiness.irq_ready);
    assert!(!readiness.firmware_ready);

    // CreateBuffer -> Submit -> Wait through the selector surface.
    let mut out = [0u64; 8];
    assert_eq!(dev.external_method(0, &[16384], &mut out), Ok(1));
    let cookie = out[0];
    assert_eq!(cookie, 1);

    assert_eq!(dev.external_method(1, &[cookie], &mut out), Ok(1));
    assert_eq!(out[0], 12);

    // Mock head == tail, so the idle wait succeeds immediately.
    assert_eq!(dev.external_method(2, &[100], &mut out), Ok(0));

    // Register dump covers the whole allow-list.
    assert_eq!(dev.external_method(3, &[], &mut out), Ok(8));

    // Identification scalars.
    assert_eq!(dev.external_method(4, &[], &mut out), Ok(4));
    assert_eq!(out[0], 0x8086);
    assert_eq!(out[1], 0xA780);
    assert_eq!(out[3], 1);

    // GT and display snapshots come back without error on a live window.
    assert_eq!(dev.external_method(5, &[], &mut out), Ok(4));
    assert_eq!(dev.external_method(6, &[], &mut out), Ok(7));

    dev.close();
    assert_eq!(dev.state(), BringupState::Stopped);
    assert_eq!(
        dev.external_method(0, &[4096], &mut out),
        Err(XeError::NotReady)
    );
}

#[test]
fn strict_safe_mode_still_opens() {
    let win = live_window();
    let pci = MockPci::raptor_lake();
    let dev = XeDevice::open(BringupConfig::parse("strictsafe"), win.bar0(), &pci).unwrap();

    // Ring disabled, so the terminal state is prepared, not ready.
    assert_eq!(dev.state(), BringupState::AccelPrepared);
    assert!(dev.readiness().ready);
    assert!(!dev.readiness().ring_ready);
    assert!(!dev.readiness().forcewake_acked);

    // Forcewake never touched the request register.
    assert_eq!(win.peek(FORCEWAKE_REQ), 0);

    // Buffer management still works; submission does not.
    dev.create_buffer(4096).unwrap();
    assert_eq!(dev.submit(), Err(XeError::NotReady));

    // Diagnostics stay available.
    assert!(dev.read_regs().is_ok());
    assert!(dev.device_info().is_ok());
}

#[test]
fn forcewake_released_after_snapshot() {
    let win = live_window();
    let pci = MockPci::raptor_lake();
    let dev = XeDevice::open(BringupConfig::default(), win.bar0(), &pci).unwrap();

    dev.gt_config().unwrap();
    let bits = (ForcewakeDomains::GT | ForcewakeDomains::RENDER).bits() as u32;
    // Release leaves mask bits set, value bits clear.
    assert_eq!(win.peek(FORCEWAKE_REQ), bits << 16);
}

#[test]
fn prepared_device_without_ggtt() {
    let win = MockWindow::new(0x0014_0000);
    win.poke(
        FORCEWAKE_ACK,
        (ForcewakeDomains::GT | ForcewakeDomains::RENDER).bits() as u32,
    );
    let pci = MockPci::raptor_lake();
    let dev = XeDevice::open(BringupConfig::default(), win.bar0(), &pci).unwrap();

    assert_eq!(dev.state(), BringupState::AccelPrepared);
    assert!(!dev.readiness().ggtt_ready);
    // The ring is host-side only, so submission still works.
    assert_eq!(dev.submit(), Ok(12));
}
