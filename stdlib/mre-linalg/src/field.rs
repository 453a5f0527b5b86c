//! Scalar fields the provider operates over.
//!
//! [`Field`] abstracts the handful of operations the factorisations need
//! beyond ordinary arithmetic: conjugation, modulus and construction from a
//! real value. It is implemented for `f64` and `Complex<f64>`.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_complex::Complex64;
use num_traits::{One, Zero};

/// A real or complex double-precision scalar.
pub trait Field:
    Copy
    + Debug
    + PartialEq
    + Send
    + Sync
    + 'static
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
{
    /// True for the complex field.
    const IS_COMPLEX: bool;

    /// Embed a real value.
    fn from_real(re: f64) -> Self;

    /// Build from real and imaginary parts; the real field drops `im`.
    fn from_parts(re: f64, im: f64) -> Self;

    /// Real part.
    fn re(self) -> f64;

    /// Imaginary part (zero for reals).
    fn im(self) -> f64;

    /// Complex conjugate (identity for reals).
    fn conj(self) -> Self;

    /// Absolute value / modulus.
    fn modulus(self) -> f64;

    /// Squared modulus.
    fn modulus_sqr(self) -> f64;

    /// True if every component is finite.
    fn is_finite(self) -> bool;

    /// Multiply by a real factor.
    #[inline]
    fn scale(self, k: f64) -> Self {
        self * Self::from_real(k)
    }

    /// `self / |self|`, or one when `self` is zero.
    #[inline]
    fn unit_phase(self) -> Self {
        let m = self.modulus();
        if m == 0.0 {
            Self::one()
        } else {
            self.scale(1.0 / m)
        }
    }
}

impl Field for f64 {
    const IS_COMPLEX: bool = false;

    #[inline]
    fn from_real(re: f64) -> Self {
        re
    }

    #[inline]
    fn from_parts(re: f64, _im: f64) -> Self {
        re
    }

    #[inline]
    fn re(self) -> f64 {
        self
    }

    #[inline]
    fn im(self) -> f64 {
        0.0
    }

    #[inline]
    fn conj(self) -> Self {
        self
    }

    #[inline]
    fn modulus(self) -> f64 {
        self.abs()
    }

    #[inline]
    fn modulus_sqr(self) -> f64 {
        self * self
    }

    #[inline]
    fn is_finite(self) -> bool {
        f64::is_finite(self)
    }

    #[inline]
    fn scale(self, k: f64) -> Self {
        self * k
    }
}

impl Field for Complex64 {
    const IS_COMPLEX: bool = true;

    #[inline]
    fn from_real(re: f64) -> Self {
        Complex64::new(re, 0.0)
    }

    #[inline]
    fn from_parts(re: f64, im: f64) -> Self {
        Complex64::new(re, im)
    }

    #[inline]
    fn re(self) -> f64 {
        self.re
    }

    #[inline]
    fn im(self) -> f64 {
        self.im
    }

    #[inline]
    fn conj(self) -> Self {
        Complex64::conj(&self)
    }

    #[inline]
    fn modulus(self) -> f64 {
        self.norm()
    }

    #[inline]
    fn modulus_sqr(self) -> f64 {
        self.norm_sqr()
    }

    #[inline]
    fn is_finite(self) -> bool {
        Complex64::is_finite(self)
    }

    #[inline]
    fn scale(self, k: f64) -> Self {
        Complex64::new(self.re * k, self.im * k)
    }
}

/// Euclidean norm of a strided vector, scaled to avoid overflow.
pub(crate) fn norm2<T: Field>(x: impl Iterator<Item = T>) -> f64 {
    let mut scale = 0.0_f64;
    let mut ssq = 1.0_f64;
    for v in x {
        for part in [v.re(), v.im()] {
            if part != 0.0 {
                let a = part.abs();
                if scale < a {
                    ssq = 1.0 + ssq * (scale / a).powi(2);
                    scale = a;
                } else {
                    ssq += (a / scale).powi(2);
                }
            }
        }
    }
    scale * ssq.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_field() {
        assert_eq!(<f64 as Field>::conj(-2.0), -2.0);
        assert_eq!(Field::modulus(-3.0_f64), 3.0);
        assert_eq!((-4.0_f64).unit_phase(), -1.0);
        assert_eq!(0.0_f64.unit_phase(), 1.0);
    }

    #[test]
    fn test_complex_field() {
        let z = Complex64::new(3.0, 4.0);
        assert_eq!(Field::conj(z), Complex64::new(3.0, -4.0));
        assert_eq!(Field::modulus(z), 5.0);
        assert_eq!(z.unit_phase(), Complex64::new(0.6, 0.8));
        assert!(<Complex64 as Field>::IS_COMPLEX);
    }

    #[test]
    fn test_norm2() {
        assert_eq!(norm2([3.0, 4.0].into_iter()), 5.0);
        assert_eq!(norm2(std::iter::empty::<f64>()), 0.0);
        let big = 1e200;
        assert!((norm2([big, big].into_iter()) / (big * 2f64.sqrt()) - 1.0).abs() < 1e-15);
        let z = [Complex64::new(1.0, 1.0), Complex64::new(1.0, -1.0)];
        assert!((norm2(z.into_iter()) - 2.0).abs() < 1e-15);
    }
}
