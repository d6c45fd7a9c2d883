//! Row addressing without a general multiply.
//!
//! The row width is fixed at startup, so `row * width` decomposes into a sum
//! of shifts, one per set bit of the width. 960 is 512 + 256 + 128 + 64.

/// Shift/add address generator for rows of a fixed byte-width.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowAddresser {
    width: usize,
    shifts: Box<[u32]>,
}

impl RowAddresser {
    /// Decomposes `width` into its shift terms.
    #[must_use]
    pub fn new(width: usize) -> Self {
        let shifts: Vec<u32> = (0..usize::BITS).filter(|bit| (width >> bit) & 1 == 1).collect();
        Self {
            width,
            shifts: shifts.into_boxed_slice(),
        }
    }

    /// Row byte-width.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of shift terms (adds per address).
    #[inline]
    #[must_use]
    pub fn terms(&self) -> usize {
        self.shifts.len()
    }

    /// First address of `row`.
    #[inline]
    #[must_use]
    pub fn base(&self, row: usize) -> usize {
        self.shifts.iter().fold(0, |acc, &shift| acc + (row << shift))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_width_terms() {
        let addresser = RowAddresser::new(960);
        assert_eq!(addresser.terms(), 4);
        assert_eq!(addresser.base(543), 543 * 960);
        assert_eq!(addresser.base(5) + 959, 5 * 960 + 959);
    }

    #[test]
    fn test_matches_multiply() {
        for width in [1, 3, 16, 17, 640, 960, 1023] {
            let addresser = RowAddresser::new(width);
            for row in [0, 1, 2, 7, 100, 543] {
                assert_eq!(addresser.base(row), row * width, "width {width} row {row}");
            }
        }
    }
}
