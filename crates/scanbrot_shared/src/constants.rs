//! # Frame & Timing Constants
//!
//! Reference configuration of the renderer. Every value here is only a
//! default: `RenderConfig` may override it at startup.

/// Reference frame width in pixels (`FB_W`). Also the row byte-width.
pub const FB_W: usize = 960;

/// Reference frame height in rows (`FB_H`).
pub const FB_H: usize = 544;

/// Reference engine count.
pub const ENGINE_COUNT: usize = 16;

/// Reference row period in ticks.
pub const TICKS_PER_ROW: u32 = 2048;

/// Reference total scanlines per frame, blanking included.
pub const TOTAL_ROWS: usize = 560;

/// Ticks a read request spends in flight on the storage channel.
pub const READ_LATENCY: usize = 2;

/// Non-burst ticks of one row period: latch, flush (2), prime, turnaround.
pub const MIN_ROW_OVERHEAD: u32 = 5;

/// Capacity of the input event channel.
pub const INPUT_QUEUE_CAPACITY: usize = 64;

/// Shortest row period that fits one read and one write burst of `width`.
///
/// `None` when that period does not fit in a `u32`.
#[inline]
#[must_use]
pub fn min_ticks_per_row(width: usize) -> Option<u32> {
    u32::try_from(width)
        .ok()?
        .checked_mul(2)?
        .checked_add(MIN_ROW_OVERHEAD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_period_fits_both_bursts() {
        assert_eq!(min_ticks_per_row(FB_W), Some(1925));
        assert!(Some(TICKS_PER_ROW) >= min_ticks_per_row(FB_W));
        assert!(TOTAL_ROWS > FB_H);
    }

    #[test]
    fn test_oversized_width_has_no_row_period() {
        let widest = (u32::MAX - MIN_ROW_OVERHEAD) / 2;
        assert_eq!(min_ticks_per_row(widest as usize), Some(u32::MAX - 1));
        assert_eq!(min_ticks_per_row(widest as usize + 1), None);
        assert_eq!(min_ticks_per_row(usize::MAX), None);
    }
}
