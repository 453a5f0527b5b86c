//! Norms, equilibration and structural predicates.

use num_complex::Complex64;

use super::{Coefficient, Matrix, MatrixComplex, MatrixReal};
use crate::config::config;
use crate::error::{invalid, Result};

/// Row and column scalers from [`Matrix::equilibrate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Equilibration {
    /// Diagonal `rows x rows` matrix `R`.
    pub row_scale: MatrixReal,
    /// Diagonal `cols x cols` matrix `C`.
    pub column_scale: MatrixReal,
    /// False when a row or a column is entirely zero.
    pub success: bool,
}

#[inline]
fn modulus<T: Coefficient>(v: T) -> f64 {
    v.to_complex().norm()
}

impl<T: Coefficient> Matrix<T> {
    /// Entry-wise p-norm; `p` may be infinite
    ///
    /// # Errors
    ///
    /// Returns [`crate::ModelError::InvalidParameterValue`] unless `p >= 1`.
    pub fn p_norm(&self, p: f64) -> Result<f64> {
        if p.is_nan() || p < 1.0 {
            return Err(invalid(format!("p-norm needs p >= 1, got {p}")));
        }
        if p == f64::INFINITY {
            return Ok(self.iter().map(modulus).fold(0.0, f64::max));
        }
        let sum: f64 = self.iter().map(|v| modulus(v).powf(p)).sum();
        Ok(sum.powf(p.recip()))
    }

    /// Maximum absolute column sum
    #[must_use]
    pub fn one_norm(&self) -> f64 {
        (0..self.cols)
            .map(|j| self.column(j).iter().map(|&v| modulus(v)).sum::<f64>())
            .fold(0.0, f64::max)
    }

    /// Maximum absolute row sum
    #[must_use]
    pub fn infinity_norm(&self) -> f64 {
        (0..self.rows)
            .map(|i| (0..self.cols).map(|j| modulus(self.get(i, j))).sum::<f64>())
            .fold(0.0, f64::max)
    }

    /// Frobenius norm
    #[must_use]
    pub fn euclidean_norm(&self) -> f64 {
        self.iter()
            .map(|v| v.to_complex().norm_sqr())
            .sum::<f64>()
            .sqrt()
    }

    /// Row and column scalings that equilibrate the matrix
    ///
    /// `R * A * C` has its largest absolute entry in every row and column
    /// equal to one. A zero row or column keeps the scale 1 and clears
    /// [`Equilibration::success`].
    #[must_use]
    pub fn equilibrate(&self) -> Equilibration {
        let mut success = true;
        let r: Vec<f64> = (0..self.rows)
            .map(|i| {
                let big = (0..self.cols)
                    .map(|j| modulus(self.get(i, j)))
                    .fold(0.0, f64::max);
                if big > 0.0 {
                    big.recip()
                } else {
                    success = false;
                    1.0
                }
            })
            .collect();
        let c: Vec<f64> = (0..self.cols)
            .map(|j| {
                let big = (0..self.rows)
                    .map(|i| r[i] * modulus(self.get(i, j)))
                    .fold(0.0, f64::max);
                if big > 0.0 {
                    big.recip()
                } else {
                    success = false;
                    1.0
                }
            })
            .collect();
        Equilibration {
            row_scale: Matrix::from_diagonal(&r),
            column_scale: Matrix::from_diagonal(&c),
            success,
        }
    }

    // ------------------------------------------------------------
    // Structure predicates
    // ------------------------------------------------------------

    fn mirrored(&self, f: impl Fn(Complex64) -> Complex64) -> bool {
        if !self.is_square() {
            return false;
        }
        let tol = config().symmetry_tolerance;
        (0..self.cols).all(|j| {
            (0..=j).all(|i| {
                let a = self.get(i, j).to_complex();
                let b = f(self.get(j, i).to_complex());
                (a - b).norm() <= tol
            })
        })
    }

    /// `A == A^T`
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        self.mirrored(|z| z)
    }

    /// `A == A^H`
    #[must_use]
    pub fn is_hermitian(&self) -> bool {
        self.mirrored(|z| z.conj())
    }

    /// `A == -A^T`
    #[must_use]
    pub fn is_skew_symmetric(&self) -> bool {
        self.mirrored(|z| -z)
    }

    /// `A == -A^H`
    #[must_use]
    pub fn is_skew_hermitian(&self) -> bool {
        self.mirrored(|z| -z.conj())
    }

    /// `A A^H == A^H A`
    ///
    /// The comparison allows `max(symmetry_tolerance, 16 eps ||A||_F^2)` per
    /// coefficient.
    #[must_use]
    pub fn is_normal(&self) -> bool {
        if !self.is_square() {
            return false;
        }
        let a: MatrixComplex = self.map(T::to_complex);
        let ah = a.adjoint();
        let (Ok(left), Ok(right)) = (a.matmul(&ah), ah.matmul(&a)) else {
            return false;
        };
        let scale = a.euclidean_norm();
        let tol = config()
            .symmetry_tolerance
            .max(16.0 * f64::EPSILON * scale * scale);
        left.iter().zip(right.iter()).all(|(x, y)| (x - y).norm() <= tol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{MatrixBoolean, MatrixInteger};

    #[test]
    fn test_norms() {
        let m = MatrixReal::from_rows(&[vec![1.0, -2.0], vec![-3.0, 4.0]]).unwrap();
        assert_eq!(m.one_norm(), 6.0);
        assert_eq!(m.infinity_norm(), 7.0);
        assert!((m.euclidean_norm() - 30f64.sqrt()).abs() < 1e-15);
        assert_eq!(m.p_norm(1.0).unwrap(), 10.0);
        assert_eq!(m.p_norm(f64::INFINITY).unwrap(), 4.0);
        assert!((m.p_norm(2.0).unwrap() - m.euclidean_norm()).abs() < 1e-14);
        assert!(m.p_norm(0.5).is_err());
        assert!(m.p_norm(f64::NAN).is_err());
    }

    #[test]
    fn test_equilibrate() {
        let m = MatrixReal::from_rows(&[vec![100.0, 1.0], vec![2.0, 0.5]]).unwrap();
        let e = m.equilibrate();
        assert!(e.success);
        let scaled = e.row_scale.matmul(&m).unwrap().matmul(&e.column_scale).unwrap();
        for i in 0..2 {
            let row_max = (0..2).map(|j| scaled.get(i, j).abs()).fold(0.0, f64::max);
            assert!(row_max <= 1.0 + 1e-15);
        }
        for j in 0..2 {
            let col_max = (0..2).map(|i| scaled.get(i, j).abs()).fold(0.0, f64::max);
            assert!((col_max - 1.0).abs() < 1e-15);
        }

        let zero_row = MatrixInteger::from_rows(&[vec![1, 2], vec![0, 0]]).unwrap();
        assert!(!zero_row.equilibrate().success);
    }

    #[test]
    fn test_symmetry_predicates() {
        let s = MatrixInteger::from_rows(&[vec![1, 2], vec![2, 3]]).unwrap();
        assert!(s.is_symmetric());
        assert!(s.is_hermitian());
        assert!(!s.is_skew_symmetric());

        let k = MatrixInteger::from_rows(&[vec![0, 2], vec![-2, 0]]).unwrap();
        assert!(k.is_skew_symmetric());
        assert!(k.is_normal());

        let i = Complex64::new(0.0, 1.0);
        let one = Complex64::new(1.0, 0.0);
        let h = MatrixComplex::from_rows(&[vec![one, i], vec![-i, one]]).unwrap();
        assert!(h.is_hermitian());
        assert!(!h.is_symmetric());
        assert!(h.is_normal());
        let sh = MatrixComplex::from_rows(&[vec![i, one], vec![-one, i]]).unwrap();
        assert!(sh.is_skew_hermitian());

        let b = MatrixBoolean::identity(3);
        assert!(b.is_symmetric());
        assert!(!MatrixReal::zero(2, 3).is_symmetric());
    }

    #[test]
    fn test_non_normal() {
        let m = MatrixReal::from_rows(&[vec![1.0, 1.0], vec![0.0, 1.0]]).unwrap();
        assert!(!m.is_normal());
    }
}
