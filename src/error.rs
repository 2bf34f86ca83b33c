//! Error handling for the Xe bring-up core.
//!
//! Hardware-access anomalies are reported, never escalated: the bring-up
//! controller decides which failures are fatal and which downgrade a stage
//! to "prepared".

use core::fmt;

/// Errors surfaced by the bring-up core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XeError {
    /// The register window is absent (BAR0 never mapped or already torn down).
    NullMapping,
    /// Register offset exceeds the safe ceiling or the mapped length.
    OutOfRange,
    /// Backing memory request failed.
    AllocationFailed,
    /// Insufficient contiguous space in the ring for a batch.
    RingFull,
    /// Forcewake acknowledge or idle-wait budget exhausted.
    Timeout,
    /// Buffer-object cookie unknown or already destroyed.
    InvalidCookie,
    /// Operation attempted before its prerequisite stage completed, or while
    /// disabled by configuration.
    NotReady,
    /// Malformed request from an external caller.
    BadArgument,
}

impl fmt::Display for XeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            XeError::NullMapping => "register window not mapped",
            XeError::OutOfRange => "register offset out of range",
            XeError::AllocationFailed => "backing allocation failed",
            XeError::RingFull => "ring buffer full",
            XeError::Timeout => "timed out",
            XeError::InvalidCookie => "invalid buffer-object cookie",
            XeError::NotReady => "not ready",
            XeError::BadArgument => "bad argument",
        };
        write!(f, "{}", msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages_are_distinct() {
        use alloc::format;
        let all = [
            XeError::NullMapping,
            XeError::OutOfRange,
            XeError::AllocationFailed,
            XeError::RingFull,
            XeError::Timeout,
            XeError::InvalidCookie,
            XeError::NotReady,
            XeError::BadArgument,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(format!("{}", a), format!("{}", b));
            }
        }
    }
}
