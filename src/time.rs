//! Bounded busy-wait delays.
//!
//! The bring-up core never blocks on an interrupt or a scheduler; every wait
//! is a counted spin so worst-case latency stays provable. The per-iteration
//! pacing is coarse and calibration-free, which is fine: callers only rely on
//! the iteration bound, not on wall-clock accuracy.

/// Spin iterations per nominal millisecond.
const SPIN_PER_MS: u32 = 10_000;

/// Busy-wait for roughly `ms` milliseconds.
pub fn delay_ms(ms: u32) {
    for _ in 0..ms {
        for _ in 0..SPIN_PER_MS {
            core::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_zero_returns_immediately() {
        delay_ms(0);
    }

    #[test]
    fn test_delay_small_completes() {
        delay_ms(2);
    }
}
