//! # Row Cache
//!
//! Double-buffered line store between the storage controller and the display
//! reader, addressed by `(row & 1, column)`.
//!
//! ```text
//!   period r:   controller fills line (r+1)&1   reader shows line r&1
//!   period r+1: controller fills line r&1       reader shows line (r+1)&1
//! ```
//!
//! The two sides never touch the same line in the same period.

/// Number of cache lines.
pub const LINE_COUNT: usize = 2;

/// Two row-wide lines plus the row each last finished loading.
#[derive(Clone, Debug)]
pub struct RowCache {
    lines: [Box<[u8]>; LINE_COUNT],
    loaded: [Option<usize>; LINE_COUNT],
}

impl RowCache {
    /// Creates two cold lines of `width` bytes.
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            lines: [vec![0; width].into_boxed_slice(), vec![0; width].into_boxed_slice()],
            loaded: [None; LINE_COUNT],
        }
    }

    /// Line index holding `row`.
    #[inline]
    #[must_use]
    pub const fn line_of(row: usize) -> usize {
        row & 1
    }

    /// Stores one byte delivered by the channel.
    ///
    /// Marks the line as loading until [`Self::mark_loaded`].
    #[inline]
    pub fn write(&mut self, line: usize, col: usize, value: u8) {
        self.loaded[line] = None;
        self.lines[line][col] = value;
    }

    /// Records that `row` finished loading into its line.
    pub fn mark_loaded(&mut self, row: usize) {
        self.loaded[Self::line_of(row)] = Some(row);
    }

    /// Row last fully loaded into `line`.
    #[inline]
    #[must_use]
    pub const fn loaded_row(&self, line: usize) -> Option<usize> {
        self.loaded[line]
    }

    /// Raw line contents.
    #[inline]
    #[must_use]
    pub fn line(&self, line: usize) -> &[u8] {
        &self.lines[line]
    }

    /// Contents of `row`, if its line holds it.
    #[must_use]
    pub fn row(&self, row: usize) -> Option<&[u8]> {
        let line = Self::line_of(row);
        (self.loaded[line] == Some(row)).then(|| &self.lines[line][..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cold_until_marked() {
        let mut cache = RowCache::new(3);
        assert_eq!(cache.row(0), None);
        for col in 0..3 {
            cache.write(1, col, col as u8 + 1);
        }
        assert_eq!(cache.row(5), None);
        cache.mark_loaded(5);
        assert_eq!(cache.row(5), Some(&[1, 2, 3][..]));
        assert_eq!(cache.row(3), None);
        assert_eq!(cache.loaded_row(1), Some(5));
    }

    #[test]
    fn test_reload_invalidates_line() {
        let mut cache = RowCache::new(2);
        cache.write(0, 0, 9);
        cache.write(0, 1, 9);
        cache.mark_loaded(2);
        cache.write(0, 0, 4);
        assert_eq!(cache.row(2), None);
        assert_eq!(cache.loaded_row(1), None);
    }
}
