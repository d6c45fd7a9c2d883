//! # Viewport Parameters
//!
//! What the input collaborator hands the scheduler: where to look, how far
//! apart pixels are, and how hard to try.

use crate::engine::clamp_iters;
use crate::fixed_point::Coord;

/// Viewport center, per-pixel step and iteration cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ViewParams {
    /// Center, real part.
    pub center_re: Coord,
    /// Center, imaginary part.
    pub center_im: Coord,
    /// Distance between adjacent pixels, both axes.
    pub scale: Coord,
    /// Iteration cap (12-bit, expected in `[16, 4095]`).
    pub max_iters: u16,
}

impl ViewParams {
    /// Creates parameters with the cap clamped into range.
    #[must_use]
    pub const fn new(center_re: Coord, center_im: Coord, scale: Coord, max_iters: u16) -> Self {
        Self {
            center_re,
            center_im,
            scale,
            max_iters: clamp_iters(max_iters),
        }
    }

    /// The complex constant of pixel (0, 0):
    /// `center - scale * (width / 2, height / 2)`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn origin(&self, width: usize, height: usize) -> (Coord, Coord) {
        let half_w = (width / 2) as i32;
        let half_h = (height / 2) as i32;
        (
            self.center_re - self.scale.mul_int(half_w),
            self.center_im - self.scale.mul_int(half_h),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_is_top_left() {
        let view = ViewParams::new(Coord::from_f64(-0.5), Coord::ZERO, Coord::from_f64(0.25), 64);
        let (re, im) = view.origin(8, 4);
        assert_eq!(re.to_f64(), -1.5);
        assert_eq!(im.to_f64(), -0.5);
    }

    #[test]
    fn test_cap_clamped_on_construction() {
        let view = ViewParams::new(Coord::ZERO, Coord::ZERO, Coord::ONE, 2);
        assert_eq!(view.max_iters, 16);
    }
}
