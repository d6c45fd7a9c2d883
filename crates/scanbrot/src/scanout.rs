//! Display reader: samples the row cache at every visible row start and keeps
//! the picture it would have shown.

use crate::row_cache::RowCache;
use crate::timing::ScanPulse;

/// What the display reader saw.
#[derive(Clone, Debug)]
pub struct ScanoutReader {
    width: usize,
    height: usize,
    frame: Box<[u8]>,
    rows_shown: u64,
    stale_rows: u64,
    frames: u64,
}

impl ScanoutReader {
    /// Creates a reader with a blank `width x height` picture.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            frame: vec![0; width * height].into_boxed_slice(),
            rows_shown: 0,
            stale_rows: 0,
            frames: 0,
        }
    }

    /// Samples the cache if this tick starts a visible row.
    ///
    /// A row whose line does not hold it is counted stale and the previous
    /// picture row is kept.
    pub fn sample(&mut self, pulse: ScanPulse, cache: &RowCache) {
        if pulse.frame_start {
            self.frames += 1;
        }
        if !pulse.row_start || !pulse.visible || pulse.row >= self.height {
            return;
        }
        match cache.row(pulse.row) {
            Some(line) => {
                let start = pulse.row * self.width;
                self.frame[start..start + self.width].copy_from_slice(line);
                self.rows_shown += 1;
            }
            None => self.stale_rows += 1,
        }
    }

    /// The picture, row-major.
    #[inline]
    #[must_use]
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    /// Rows shown fresh.
    #[inline]
    #[must_use]
    pub const fn rows_shown(&self) -> u64 {
        self.rows_shown
    }

    /// Rows whose cache line was not ready.
    #[inline]
    #[must_use]
    pub const fn stale_rows(&self) -> u64 {
        self.stale_rows
    }

    /// Display frames started.
    #[inline]
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_start(row: usize) -> ScanPulse {
        ScanPulse {
            row_start: true,
            frame_start: row == 0,
            row,
            visible: row < 2,
            tick_in_row: 0,
        }
    }

    #[test]
    fn test_copies_fresh_rows_only() {
        let mut cache = RowCache::new(2);
        let mut reader = ScanoutReader::new(2, 2);

        reader.sample(row_start(0), &cache);
        assert_eq!(reader.stale_rows(), 1);

        cache.write(1, 0, 5);
        cache.write(1, 1, 6);
        cache.mark_loaded(1);
        reader.sample(row_start(1), &cache);
        reader.sample(row_start(2), &cache);
        assert_eq!(reader.frame(), &[0, 0, 5, 6]);
        assert_eq!(reader.rows_shown(), 1);
        assert_eq!(reader.frames(), 1);
    }
}
