//! # Fixed-Point Coordinates
//!
//! **NO FLOATING POINT IN THE ITERATION.**
//!
//! Every position, step and intermediate term of the escape-time iteration is
//! a signed Q3.22 value: 3 integer bits (sign included) and 22 fractional bits,
//! 25 bits in total, the ARM Q-format convention.
//!
//! ## Widths
//!
//! - `Coord` - Q3.22 as an `i32`. Constructors saturate into the 25-bit
//!   range [-4.0, 4.0). Arithmetic on the `i32` is wrapping and may leave the
//!   25-bit range, which is how engine intermediates are carried (Q9.22).
//! - `Wide` - a product of two `Coord`s held in `i64` (Q18.44). Squares and
//!   cross terms stay at this width until they are shifted back down, so the
//!   escape test never sees a rounded magnitude.
//!
//! ## Why Fixed-Point?
//!
//! - Deterministic: same view = same picture on every host
//! - Bit-exact against the reference output, including the `|z|^2 == 4`
//!   boundary

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Number of fractional bits.
pub const FRAC_BITS: u32 = 22;

/// Total width of a stored coordinate, sign included.
pub const COORD_BITS: u32 = 25;

/// Raw value of 1.0.
const ONE_RAW: i32 = 1 << FRAC_BITS;

/// Largest raw Q3.22 value (just below 4.0).
const MAX_RAW: i32 = (1 << (COORD_BITS - 1)) - 1;

/// Smallest raw Q3.22 value (-4.0).
const MIN_RAW: i32 = -(1 << (COORD_BITS - 1));

// =============================================================================
// Coord - Q3.22
// =============================================================================

/// Signed Q3.22 fixed-point coordinate.
///
/// Internally stores `value * 2^22` as an `i32`.
///
/// # Range
///
/// - Minimum: -4.0
/// - Maximum: 3.999999761581421 (4.0 - 2^-22)
///
/// # Example
///
/// ```rust,ignore
/// let step = Coord::from_f64(3.0 / 960.0);
/// let left = Coord::from_f64(-0.5) - step.mul_int(480);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Coord(i32);

impl Coord {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// One (1.0).
    pub const ONE: Self = Self(ONE_RAW);

    /// Two (2.0).
    pub const TWO: Self = Self(2 * ONE_RAW);

    /// Largest representable Q3.22 value.
    pub const MAX: Self = Self(MAX_RAW);

    /// Smallest representable Q3.22 value.
    pub const MIN: Self = Self(MIN_RAW);

    /// Creates a coordinate from a raw `value * 2^22`, saturating into Q3.22.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        if raw > MAX_RAW {
            Self(MAX_RAW)
        } else if raw < MIN_RAW {
            Self(MIN_RAW)
        } else {
            Self(raw)
        }
    }

    /// Creates a coordinate from a whole number, saturating into Q3.22.
    #[inline]
    #[must_use]
    pub const fn from_int(whole: i32) -> Self {
        Self::from_raw(whole.saturating_mul(ONE_RAW))
    }

    /// Converts from `f64`, rounding to nearest and saturating into Q3.22.
    ///
    /// Only used at the configuration boundary, never in the iteration.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_f64(value: f64) -> Self {
        let scaled = (value * f64::from(ONE_RAW)).round();
        if scaled.is_nan() {
            return Self::ZERO;
        }
        Self::from_raw(scaled.clamp(f64::from(MIN_RAW), f64::from(MAX_RAW)) as i32)
    }

    /// Converts to `f64` (diagnostics and reports only).
    #[inline]
    #[must_use]
    pub fn to_f64(self) -> f64 {
        f64::from(self.0) / f64::from(ONE_RAW)
    }

    /// Returns the raw internal value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// True when the value lies inside the 25-bit Q3.22 range.
    #[inline]
    #[must_use]
    pub const fn in_q3_22(self) -> bool {
        self.0 >= MIN_RAW && self.0 <= MAX_RAW
    }

    /// Full-width product, no truncation.
    #[inline]
    #[must_use]
    pub const fn wide_mul(self, rhs: Self) -> Wide {
        Wide(self.0 as i64 * rhs.0 as i64)
    }

    /// Full-width square, no truncation.
    #[inline]
    #[must_use]
    pub const fn wide_square(self) -> Wide {
        self.wide_mul(self)
    }

    /// Multiplies by a small integer (pixel offsets), wrapping.
    #[inline]
    #[must_use]
    pub const fn mul_int(self, rhs: i32) -> Self {
        Self(self.0.wrapping_mul(rhs))
    }
}

impl Add for Coord {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl AddAssign for Coord {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

impl Sub for Coord {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl SubAssign for Coord {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self.0.wrapping_sub(rhs.0);
    }
}

impl Neg for Coord {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self::Output {
        Self(self.0.wrapping_neg())
    }
}

/// Truncating Q3.22 multiply (`(a * b) >> 22`).
impl Mul for Coord {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self::Output {
        self.wide_mul(rhs).truncate()
    }
}

impl fmt::Debug for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coord({:.7})", self.to_f64())
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.7}", self.to_f64())
    }
}

// =============================================================================
// Wide - Q18.44 products
// =============================================================================

/// Double-width product of two coordinates, 44 fractional bits.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
#[repr(transparent)]
pub struct Wide(i64);

impl Wide {
    /// 4.0 at double width: the escape threshold.
    pub const FOUR: Self = Self(4_i64 << (2 * FRAC_BITS));

    /// Returns the raw internal value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Shifts back down to 22 fractional bits (arithmetic shift, rounds
    /// toward negative infinity).
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn truncate(self) -> Coord {
        Coord((self.0 >> FRAC_BITS) as i32)
    }

    /// Doubles the value (`2 * zr * zi`).
    #[inline]
    #[must_use]
    pub const fn double(self) -> Self {
        Self(self.0.wrapping_mul(2))
    }
}

impl Add for Wide {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Wide {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_and_two() {
        assert_eq!(Coord::ONE.raw(), 1 << 22);
        assert_eq!(Coord::TWO.to_f64(), 2.0);
        assert_eq!(Coord::from_int(-3).to_f64(), -3.0);
    }

    #[test]
    fn test_saturates_into_range() {
        assert_eq!(Coord::from_f64(10.0), Coord::MAX);
        assert_eq!(Coord::from_f64(-10.0), Coord::MIN);
        assert_eq!(Coord::from_int(4), Coord::MAX);
        assert_eq!(Coord::from_f64(-4.0), Coord::MIN);
        assert!(Coord::from_f64(3.5).in_q3_22());
    }

    #[test]
    fn test_from_f64_rounds() {
        let step = Coord::from_f64(3.0 / 960.0);
        assert_eq!(step.raw(), 13107); // 0.003125 * 2^22 = 13107.2
        assert_eq!(Coord::from_f64(f64::NAN), Coord::ZERO);
    }

    #[test]
    fn test_truncating_multiply() {
        let half = Coord::from_f64(0.5);
        assert_eq!((half * half).to_f64(), 0.25);
        let neg = Coord::from_f64(-1.5);
        assert_eq!((neg * Coord::TWO).to_f64(), -3.0);
    }

    #[test]
    fn test_wide_square_is_exact() {
        // 2^-22 squared is 2^-44: representable only at double width.
        let lsb = Coord::from_raw(1);
        assert_eq!(lsb.wide_square().raw(), 1);
        assert_eq!(lsb.wide_square().truncate(), Coord::ZERO);
    }

    #[test]
    fn test_escape_threshold() {
        assert_eq!(Coord::TWO.wide_square(), Wide::FOUR);
        let just_over = Coord::from_raw(Coord::TWO.raw() + 1);
        assert!(just_over.wide_square() > Wide::FOUR);
    }

    #[test]
    fn test_mul_int_offsets() {
        let step = Coord::from_f64(0.25);
        assert_eq!(step.mul_int(6).to_f64(), 1.5);
        assert_eq!((-step.mul_int(2)).to_f64(), -0.5);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Coord::from_f64(-0.5)), "-0.5000000");
    }
}
