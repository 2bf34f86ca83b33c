//! Safe bring-up core for Intel Xe PCI graphics adapters.
//!
//! Everything here is deliberately conservative: the goal is to get a real
//! adapter from "BAR mapped" to "acceleration prerequisites verified" without
//! ever hanging the machine.
//!
//! - Bounds-checked MMIO register access over BAR0
//! - Forcewake power-domain handshake with RAII release
//! - Translation-table (GGTT) probe, read-only for now
//! - Host-side render ring with well-formed MI batches; the hardware tail is
//!   never kicked
//! - Cookie-based buffer objects
//! - A milestone-ordered bring-up state machine with honest readiness
//!   reporting
//! - A scalar-marshalled external method surface
//!
//! The host adapter supplies the mapped BAR0 window and a
//! [`device::PciConfigRead`] implementation; the core never touches the
//! platform directly.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod bo;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod forcewake;
pub mod ggtt;
pub mod mmio;
pub mod regs;
pub mod ring;
pub mod testutil;
pub mod time;

pub use config::BringupConfig;
pub use device::{Bar0, BringupState, DeviceIdent, PciConfigRead, ReadinessReport, XeDevice};
pub use dispatch::{DeviceInfo, DisplayInfo, GtConfig, Method};
pub use error::XeError;
