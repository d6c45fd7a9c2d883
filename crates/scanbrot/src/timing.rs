//! # Scan Timing
//!
//! Stand-in for the display timing generator: counts ticks into row periods
//! and row periods into frames, and reports the cadence pulses.
//!
//! ```text
//!   row:   0   1   ...   H-1 | H ... T-1 | 0
//!          ^frame_start      |  blanking | ^frame_start
//!          ^row_start on tick 0 of every row period
//! ```

/// Cadence observed during one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ScanPulse {
    /// First tick of a row period.
    pub row_start: bool,
    /// First tick of a frame (also a row start).
    pub frame_start: bool,
    /// Current scanout row, blanking included.
    pub row: usize,
    /// True while `row` is visible.
    pub visible: bool,
    /// Tick index within the row period.
    pub tick_in_row: u32,
}

/// Display timing generator.
#[derive(Clone, Debug)]
pub struct ScanTiming {
    ticks_per_row: u32,
    visible_rows: usize,
    total_rows: usize,
    row: usize,
    tick_in_row: u32,
    frames: u64,
}

impl ScanTiming {
    /// Creates a generator positioned on tick 0 of row 0.
    #[must_use]
    pub fn new(ticks_per_row: u32, visible_rows: usize, total_rows: usize) -> Self {
        Self {
            ticks_per_row: ticks_per_row.max(1),
            visible_rows,
            total_rows: total_rows.max(visible_rows).max(1),
            row: 0,
            tick_in_row: 0,
            frames: 0,
        }
    }

    /// Ticks per row period.
    #[inline]
    #[must_use]
    pub const fn ticks_per_row(&self) -> u32 {
        self.ticks_per_row
    }

    /// Visible rows per frame.
    #[inline]
    #[must_use]
    pub const fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    /// Row periods per frame.
    #[inline]
    #[must_use]
    pub const fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Ticks per display frame.
    #[must_use]
    pub fn ticks_per_frame(&self) -> u64 {
        u64::from(self.ticks_per_row) * self.total_rows as u64
    }

    /// Frames started so far.
    #[inline]
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Reports the current tick's pulse and moves to the next tick.
    pub fn advance(&mut self) -> ScanPulse {
        let row_start = self.tick_in_row == 0;
        let frame_start = row_start && self.row == 0;
        if frame_start {
            self.frames += 1;
        }
        let pulse = ScanPulse {
            row_start,
            frame_start,
            row: self.row,
            visible: self.row < self.visible_rows,
            tick_in_row: self.tick_in_row,
        };

        self.tick_in_row += 1;
        if self.tick_in_row == self.ticks_per_row {
            self.tick_in_row = 0;
            self.row += 1;
            if self.row == self.total_rows {
                self.row = 0;
            }
        }
        pulse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pulses_over_one_frame() {
        let mut timing = ScanTiming::new(3, 2, 3);
        let pulses: Vec<ScanPulse> = (0..10).map(|_| timing.advance()).collect();

        assert!(pulses[0].frame_start && pulses[0].row_start && pulses[0].visible);
        assert!(!pulses[1].row_start);
        assert!(pulses[3].row_start && !pulses[3].frame_start);
        assert_eq!(pulses[3].row, 1);
        assert!(pulses[6].row_start && !pulses[6].visible);
        assert_eq!(pulses[6].row, 2);
        assert!(pulses[9].frame_start);
        assert_eq!(pulses[9].row, 0);
        assert_eq!(pulses[8].tick_in_row, 2);
        assert_eq!(timing.frames(), 2);
    }

    #[test]
    fn test_ticks_per_frame() {
        let timing = ScanTiming::new(2048, 544, 560);
        assert_eq!(timing.ticks_per_frame(), 2048 * 560);
    }
}
