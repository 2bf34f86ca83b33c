//! External method surface.
//!
//! Mirrors a user-client selector table: a numeric selector plus scalar
//! inputs/outputs. Every argument is validated and clamped here, so the inner
//! modules only ever see well-formed requests. Sentinel values never cross
//! this boundary; a failed register read becomes an `Err` instead.

use log::debug;

use crate::bo::MAX_BO_BYTES;
use crate::device::{BringupState, XeDevice};
use crate::error::XeError;
use crate::forcewake::{ForcewakeDomains, ForcewakeGuard};
use crate::regs::{
    DDI_BUF_CTL_A, DSPACNTR, GEN6_RC_CONTROL, GEN6_RC_STATE, GEN6_RPNSWREQ, GEN6_RP_CONTROL,
    HTOTAL_A, PIPEACONF, PIPEASRC, PIPE_DDI_FUNC_CTL_A, READ_ALLOW_LIST, VTOTAL_A,
};
use crate::ring::RingStreamer;

/// Upper bound on an idle-wait budget from an external caller.
pub const MAX_WAIT_MS: u32 = 10_000;

/// External selectors, stable numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    CreateBuffer = 0,
    Submit = 1,
    Wait = 2,
    ReadRegs = 3,
    GetDeviceInfo = 4,
    GetGtConfig = 5,
    GetDisplayInfo = 6,
}

impl Method {
    pub fn from_selector(selector: u32) -> Option<Self> {
        match selector {
            0 => Some(Method::CreateBuffer),
            1 => Some(Method::Submit),
            2 => Some(Method::Wait),
            3 => Some(Method::ReadRegs),
            4 => Some(Method::GetDeviceInfo),
            5 => Some(Method::GetGtConfig),
            6 => Some(Method::GetDisplayInfo),
            _ => None,
        }
    }
}

/// Identification snapshot for external callers.
#[derive(Debug, Clone, Copy)]
pub struct DeviceInfo {
    pub vendor_id: u16,
    pub device_id: u16,
    pub revision: u8,
    pub state: BringupState,
    pub accel_ready: bool,
}

/// GT power/frequency snapshot, taken under a forcewake hold.
#[derive(Debug, Clone, Copy)]
pub struct GtConfig {
    pub rpnswreq: u32,
    pub rp_control: u32,
    pub rc_control: u32,
    pub rc_state: u32,
}

/// Pipe A display state, read-only.
#[derive(Debug, Clone, Copy)]
pub struct DisplayInfo {
    pub pipe_conf: u32,
    pub plane_ctl: u32,
    pub htotal: u32,
    pub vtotal: u32,
    pub pipe_src: u32,
    pub ddi_buf_ctl: u32,
    pub ddi_func_ctl: u32,
}

impl XeDevice {
    /// Allocate a buffer object for an external caller. The byte count is
    /// clamped to one byte minimum (page-rounded inside the registry) and
    /// `MAX_BO_BYTES` maximum rather than rejected.
    pub fn create_buffer(&self, size_bytes: u32) -> Result<u64, XeError> {
        self.ensure_running()?;
        self.bos.lock().create(size_bytes.clamp(1, MAX_BO_BYTES))
    }

    /// Release a buffer object.
    pub fn destroy_buffer(&self, cookie: u64) -> Result<(), XeError> {
        self.ensure_running()?;
        self.bos.lock().destroy(cookie)
    }

    /// Queue the no-op batch and dump ring state. Returns the new software
    /// tail. Nothing is executed; the batch only becomes resident in memory.
    pub fn submit(&self) -> Result<u32, XeError> {
        self.ensure_running()?;
        if self.config.command_stream_disabled() {
            return Err(XeError::NotReady);
        }
        // The lock covers only the ring mutation; the state dump polls
        // forcewake and must not stall concurrent submitters.
        let tail = {
            let mut ring = self.ring.lock();
            ring.submit_noop()?;
            ring.tail()
        };
        RingStreamer::log_state(&self.regs, &self.config);
        Ok(tail)
    }

    /// Poll for engine idle with a clamped budget. Hardware-only: the ring
    /// lock is never taken, so submissions proceed during the poll.
    pub fn wait(&self, timeout_ms: u32) -> Result<(), XeError> {
        self.ensure_running()?;
        if self.config.command_stream_disabled() {
            return Err(XeError::NotReady);
        }
        let budget = timeout_ms.min(MAX_WAIT_MS);
        RingStreamer::wait_idle(&self.regs, budget)
    }

    /// Read the fixed allow-list of safe offsets. Arbitrary offsets are never
    /// accepted from outside; a read failure propagates as an error.
    pub fn read_regs(&self) -> Result<[u32; READ_ALLOW_LIST.len()], XeError> {
        self.ensure_running()?;
        let mut out = [0u32; READ_ALLOW_LIST.len()];
        for (slot, &off) in out.iter_mut().zip(READ_ALLOW_LIST.iter()) {
            *slot = self.regs.read32(off)?;
        }
        Ok(out)
    }

    pub fn device_info(&self) -> Result<DeviceInfo, XeError> {
        self.ensure_running()?;
        let ident = self.ident();
        Ok(DeviceInfo {
            vendor_id: ident.vendor_id,
            device_id: ident.device_id,
            revision: ident.revision,
            state: self.state,
            accel_ready: self.state == BringupState::AccelReady,
        })
    }

    /// GT state snapshot. Reads run under forcewake so the values are live,
    /// not power-gated garbage.
    pub fn gt_config(&self) -> Result<GtConfig, XeError> {
        self.ensure_running()?;
        let _wake = ForcewakeGuard::acquire(
            &self.regs,
            ForcewakeDomains::GT | ForcewakeDomains::RENDER,
            &self.config,
        );
        Ok(GtConfig {
            rpnswreq: self.regs.read32(GEN6_RPNSWREQ)?,
            rp_control: self.regs.read32(GEN6_RP_CONTROL)?,
            rc_control: self.regs.read32(GEN6_RC_CONTROL)?,
            rc_state: self.regs.read32(GEN6_RC_STATE)?,
        })
    }

    /// Pipe A snapshot. Display registers are outside the GT power well, so
    /// no forcewake hold is needed.
    pub fn display_info(&self) -> Result<DisplayInfo, XeError> {
        self.ensure_running()?;
        Ok(DisplayInfo {
            pipe_conf: self.regs.read32(PIPEACONF)?,
            plane_ctl: self.regs.read32(DSPACNTR)?,
            htotal: self.regs.read32(HTOTAL_A)?,
            vtotal: self.regs.read32(VTOTAL_A)?,
            pipe_src: self.regs.read32(PIPEASRC)?,
            ddi_buf_ctl: self.regs.read32(DDI_BUF_CTL_A)?,
            ddi_func_ctl: self.regs.read32(PIPE_DDI_FUNC_CTL_A)?,
        })
    }

    /// Scalar-marshalled entry point: dispatch `selector` with `input` scalars
    /// and write results into `output`. Returns the number of output scalars
    /// produced. Unknown selectors and short argument arrays are rejected.
    pub fn external_method(
        &self,
        selector: u32,
        input: &[u64],
        output: &mut [u64],
    ) -> Result<u32, XeError> {
        let method = Method::from_selector(selector).ok_or(XeError::BadArgument)?;
        debug!("dispatch: {:?} in={} out={}", method, input.len(), output.len());
        match method {
            Method::CreateBuffer => {
                let size = *input.first().ok_or(XeError::BadArgument)?;
                // Oversized requests saturate and are then clamped, matching
                // the clamp-not-reject contract.
                let size = u32::try_from(size).unwrap_or(u32::MAX);
                let cookie = self.create_buffer(size)?;
                let slot = output.first_mut().ok_or(XeError::BadArgument)?;
                *slot = cookie;
                Ok(1)
            }
            Method::Submit => {
                // A cookie input is optional; when present it must name a
                // live buffer, though the batch submitted is still the no-op.
                if let Some(&cookie) = input.first() {
                    self.ensure_running()?;
                    self.bos.lock().resolve(cookie)?;
                }
                let tail = self.submit()?;
                if let Some(slot) = output.first_mut() {
                    *slot = tail as u64;
                    Ok(1)
                } else {
                    Ok(0)
                }
            }
            Method::Wait => {
                let timeout = *input.first().ok_or(XeError::BadArgument)?;
                let timeout = u32::try_from(timeout).unwrap_or(MAX_WAIT_MS);
                self.wait(timeout)?;
                Ok(0)
            }
            Method::ReadRegs => {
                let values = self.read_regs()?;
                // Optional first scalar: how many entries the caller wants,
                // clamped to the allow-list length.
                let count = input
                    .first()
                    .map(|&c| c as usize)
                    .unwrap_or(values.len())
                    .min(values.len());
                if output.len() < count {
                    return Err(XeError::BadArgument);
                }
                for (slot, value) in output.iter_mut().zip(values[..count].iter()) {
                    *slot = *value as u64;
                }
                Ok(count as u32)
            }
            Method::GetDeviceInfo => {
                let info = self.device_info()?;
                if output.len() < 4 {
                    return Err(XeError::BadArgument);
                }
                output[0] = info.vendor_id as u64;
                output[1] = info.device_id as u64;
                output[2] = info.revision as u64;
                output[3] = info.accel_ready as u64;
                Ok(4)
            }
            Method::GetGtConfig => {
                let gt = self.gt_config()?;
                if output.len() < 4 {
                    return Err(XeError::BadArgument);
                }
                output[0] = gt.rpnswreq as u64;
                output[1] = gt.rp_control as u64;
                output[2] = gt.rc_control as u64;
                output[3] = gt.rc_state as u64;
                Ok(4)
            }
            Method::GetDisplayInfo => {
                let disp = self.display_info()?;
                if output.len() < 7 {
                    return Err(XeError::BadArgument);
                }
                output[0] = disp.pipe_conf as u64;
                output[1] = disp.plane_ctl as u64;
                output[2] = disp.htotal as u64;
                output[3] = disp.vtotal as u64;
                output[4] = disp.pipe_src as u64;
                output[5] = disp.ddi_buf_ctl as u64;
                output[6] = disp.ddi_func_ctl as u64;
                Ok(7)
            }
        }
    }
}
