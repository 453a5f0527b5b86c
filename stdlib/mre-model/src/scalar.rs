//! Scalar conversions and the fuzzy numeric rules shared by every container.
//!
//! Numeric values compare by value across kinds: `true == 1 == 1.0 == 1+0i`.
//! [`NumericKey`] is the canonical form used to hash such values
//! consistently with that equality.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use num_complex::Complex64;

/// Scalar type of Boolean values.
pub type Boolean = bool;
/// Scalar type of Integer values.
pub type Integer = i64;
/// Scalar type of Real values.
pub type Real = f64;
/// Scalar type of Complex values.
pub type Complex = Complex64;

/// `2^63` as a float; the first value above the Integer range.
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

/// Exact Real to Integer conversion.
///
/// Succeeds iff `x` is finite, integral and inside the Integer range.
#[must_use]
pub fn real_to_integer(x: f64) -> Option<i64> {
    if x.is_finite() && x.trunc() == x && (-TWO_POW_63..TWO_POW_63).contains(&x) {
        Some(x as i64)
    } else {
        None
    }
}

/// Exact Complex to Real conversion; the imaginary part must be zero.
#[must_use]
pub fn complex_to_real(z: Complex64) -> Option<f64> {
    (z.im == 0.0).then_some(z.re)
}

/// Saturating Real to Integer conversion. NaN maps to zero.
#[inline]
#[must_use]
pub fn clamp_to_integer(x: f64) -> i64 {
    // `as` saturates at the bounds and sends NaN to 0.
    x as i64
}

/// Order complex values by real part, then imaginary part.
#[must_use]
pub fn compare_complex(a: Complex64, b: Complex64) -> Option<Ordering> {
    match a.re.partial_cmp(&b.re)? {
        Ordering::Equal => a.im.partial_cmp(&b.im),
        other => Some(other),
    }
}

/// Canonical representative of a numeric value for hashing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum NumericKey {
    Integer(i64),
    Real(u64),
    Complex(u64, u64),
}

impl NumericKey {
    pub(crate) fn of_integer(i: i64) -> Self {
        Self::Integer(i)
    }

    pub(crate) fn of_real(x: f64) -> Self {
        match real_to_integer(x) {
            Some(i) => Self::Integer(i),
            // Every NaN payload shares one key.
            None if x.is_nan() => Self::Real(f64::NAN.to_bits()),
            None => Self::Real(x.to_bits()),
        }
    }

    pub(crate) fn of_complex(z: Complex64) -> Self {
        match complex_to_real(z) {
            Some(x) => Self::of_real(x),
            None if z.is_nan() => Self::of_real(f64::NAN),
            // -0.0 and 0.0 compare equal, so fold the sign away.
            None => Self::Complex((z.re + 0.0).to_bits(), (z.im + 0.0).to_bits()),
        }
    }
}

impl Hash for NumericKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match *self {
            Self::Integer(i) => {
                0u8.hash(state);
                i.hash(state);
            }
            Self::Real(bits) => {
                1u8.hash(state);
                bits.hash(state);
            }
            Self::Complex(re, im) => {
                2u8.hash(state);
                re.hash(state);
                im.hash(state);
            }
        }
    }
}

/// Exact ordering of an Integer against a Real, without rounding `i`.
pub(crate) fn compare_integer_real(i: i64, x: f64) -> Option<Ordering> {
    if x.is_nan() {
        return None;
    }
    if x >= TWO_POW_63 {
        return Some(Ordering::Less);
    }
    if x < -TWO_POW_63 {
        return Some(Ordering::Greater);
    }
    let t = x.trunc();
    // `t` is inside the Integer range here.
    match i.cmp(&(t as i64)) {
        Ordering::Equal if x > t => Some(Ordering::Less),
        Ordering::Equal if x < t => Some(Ordering::Greater),
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_to_integer() {
        assert_eq!(real_to_integer(3.0), Some(3));
        assert_eq!(real_to_integer(-0.0), Some(0));
        assert_eq!(real_to_integer(3.5), None);
        assert_eq!(real_to_integer(f64::NAN), None);
        assert_eq!(real_to_integer(f64::INFINITY), None);
        assert_eq!(real_to_integer(TWO_POW_63), None);
        assert_eq!(real_to_integer(-TWO_POW_63), Some(i64::MIN));
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp_to_integer(f64::NAN), 0);
        assert_eq!(clamp_to_integer(1e300), i64::MAX);
        assert_eq!(clamp_to_integer(-1e300), i64::MIN);
        assert_eq!(clamp_to_integer(-2.7), -2);
    }

    #[test]
    fn test_complex_order() {
        let a = Complex64::new(1.0, 5.0);
        let b = Complex64::new(2.0, -5.0);
        let c = Complex64::new(1.0, 6.0);
        assert_eq!(compare_complex(a, b), Some(Ordering::Less));
        assert_eq!(compare_complex(a, c), Some(Ordering::Less));
        assert_eq!(compare_complex(a, a), Some(Ordering::Equal));
    }

    #[test]
    fn test_keys_agree_across_kinds() {
        assert_eq!(NumericKey::of_integer(5), NumericKey::of_real(5.0));
        assert_eq!(NumericKey::of_real(5.0), NumericKey::of_complex(Complex64::new(5.0, 0.0)));
        assert_eq!(
            NumericKey::of_complex(Complex64::new(-0.0, 1.0)),
            NumericKey::of_complex(Complex64::new(0.0, 1.0))
        );
        assert_ne!(NumericKey::of_real(5.5), NumericKey::of_integer(5));
        assert_eq!(
            NumericKey::of_real(-f64::NAN),
            NumericKey::of_complex(Complex64::new(0.0, f64::NAN))
        );
    }

    #[test]
    fn test_integer_real_order() {
        assert_eq!(compare_integer_real(3, 3.5), Some(Ordering::Less));
        assert_eq!(compare_integer_real(3, 2.5), Some(Ordering::Greater));
        assert_eq!(compare_integer_real(-3, -3.5), Some(Ordering::Greater));
        assert_eq!(compare_integer_real(i64::MAX, 9.3e18), Some(Ordering::Less));
        assert_eq!(compare_integer_real(1, f64::NAN), None);
        assert_eq!(compare_integer_real(4, 4.0), Some(Ordering::Equal));
        assert_eq!(compare_integer_real(i64::MAX, TWO_POW_63), Some(Ordering::Less));
    }
}
