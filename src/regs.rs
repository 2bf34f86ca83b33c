//! Gen12/Xe register offsets and command opcodes.
//!
//! Offsets are byte offsets into the BAR0 MMIO window. The map is partial and
//! only partially verified against live hardware; everything here is treated
//! as untrusted by the access layer, which bounds-checks every offset.

/// Page size used for ring and buffer-object alignment.
pub const PAGE_BYTES: u32 = 4096;

/// Highest byte offset the access layer will ever touch, even when the mapped
/// window claims to be larger. Covers the GT range, power wells, display
/// pipeline and fence registers with headroom.
pub const MAX_SAFE_MMIO_OFFSET: u32 = 0x003F_FFFC;

/// Sentinel returned by diagnostic reads when no window is mapped.
pub const SENTINEL_NO_MAPPING: u32 = 0xDEAD_4D30;
/// Sentinel returned by diagnostic reads for an out-of-range offset.
pub const SENTINEL_OUT_OF_RANGE: u32 = 0xDEAD_4F52;

// ============================================================================
// Engine / ring registers (render command streamer, RCS0)
// ============================================================================

/// RCS0 engine base, verified from a Linux register dump.
pub const RCS0_BASE: u32 = 0x0000_2000;

/// Ring tail, dword offset of the next submission.
pub const RCS0_RING_TAIL: u32 = RCS0_BASE + 0x30;
/// Ring head, advanced by hardware only.
pub const RCS0_RING_HEAD: u32 = RCS0_BASE + 0x34;
/// Ring control: enable and size bits.
pub const RCS0_RING_CTL: u32 = RCS0_BASE + 0x2C;
/// MI mode (read-only here); bit 9 reads back ring-idle.
pub const RCS0_MI_MODE: u32 = RCS0_BASE + 0x9C;

/// Graphics mode register.
pub const GFX_MODE: u32 = 0x0000_2500;

/// Ring control bit 0: ring enabled.
pub const RING_CTL_ENABLE: u32 = 1 << 0;
/// Ring control bits [20:12]: ring size in pages, minus one.
pub const RING_CTL_SIZE_SHIFT: u32 = 12;
pub const RING_CTL_SIZE_MASK: u32 = 0x1FF;

/// MI mode bit 9: rings idle.
pub const MI_MODE_RING_IDLE: u32 = 1 << 9;

// ============================================================================
// Translation table
// ============================================================================

/// Page-table control (PGTBL_CTL); long-standing location.
pub const PGTBL_CTL: u32 = 0x0000_2020;

/// Typical GGTT aperture size (256 MiB BAR2).
pub const GGTT_APERTURE_BYTES: u32 = 256 * 1024 * 1024;

// ============================================================================
// MI command opcodes
// ============================================================================

pub const MI_NOOP: u32 = 0x0000_0000;
pub const MI_BATCH_BUFFER_END: u32 = 0x0A00_0000;

// ============================================================================
// Forcewake (multithreaded request/ack pair, Gen9+)
// ============================================================================

/// Forcewake request register; word layout `[mask:16][value:16]`.
pub const FORCEWAKE_REQ: u32 = 0x0000_A188;
/// Forcewake acknowledge register.
pub const FORCEWAKE_ACK: u32 = 0x0000_A18C;

// ============================================================================
// Power management (RP/RC state)
// ============================================================================

pub const GEN6_RPNSWREQ: u32 = 0x0000_A008;
pub const GEN6_RP_CONTROL: u32 = 0x0000_A024;
pub const GEN6_RC_CONTROL: u32 = 0x0000_A090;
pub const GEN6_RC_STATE: u32 = 0x0000_A094;
pub const GEN6_PMINTRMSK: u32 = 0x0000_A168;

/// RC6 residency counter.
pub const RC6_RESIDENCY_TIME: u32 = 0x0013_8108;

// Power well control (HSW+)
pub const HSW_PWR_WELL_CTL1: u32 = 0x0004_5400;
pub const HSW_PWR_WELL_CTL2: u32 = 0x0004_5404;

// ============================================================================
// Fence registers (tiled memory); 32 pairs at 0x100000
// ============================================================================

pub const FENCE_REG_BASE: u32 = 0x0010_0000;
pub const FENCE_REG_COUNT: u32 = 32;

/// Fence n start register.
pub const fn fence_start(n: u32) -> u32 {
    FENCE_REG_BASE + n * 8
}

/// Fence n end register.
pub const fn fence_end(n: u32) -> u32 {
    FENCE_REG_BASE + n * 8 + 4
}

// ============================================================================
// Display pipeline (read-only diagnostics)
// ============================================================================

pub const HTOTAL_A: u32 = 0x0006_0000;
pub const HSYNC_A: u32 = 0x0006_0008;
pub const VTOTAL_A: u32 = 0x0006_000C;
pub const VSYNC_A: u32 = 0x0006_0014;
pub const PIPEASRC: u32 = 0x0006_001C;
pub const PIPE_DDI_FUNC_CTL_A: u32 = 0x0006_0400;
pub const DDI_BUF_CTL_A: u32 = 0x0006_4000;
pub const PIPEACONF: u32 = 0x0007_0008;
pub const DSPACNTR: u32 = 0x0007_0180;

// ============================================================================
// Read-only allow-list for the external register dump
// ============================================================================

/// Safe, read-only dword offsets exposed through the dispatch surface. No
/// arbitrary offsets ever cross that boundary.
pub const READ_ALLOW_LIST: [u32; 8] = [
    0x0000, 0x0004, 0x0010, 0x0014, 0x0100, 0x0104, 0x1000, 0x1004,
];
