//! Spectral transforms and rounding.

use mre_linalg::transform;
use mre_linalg::Field;
use num_complex::Complex64;

use super::{Coefficient, FieldCoefficient, Matrix, MatrixComplex, MatrixInteger, MatrixReal};
use crate::scalar::clamp_to_integer;

/// Apply `f` to every column and then to every row of a packed matrix.
fn separable(rows: usize, cols: usize, mut data: Vec<f64>, f: fn(&[f64]) -> Vec<f64>) -> Vec<f64> {
    for j in 0..cols {
        let column = f(&data[j * rows..(j + 1) * rows]);
        data[j * rows..(j + 1) * rows].copy_from_slice(&column);
    }
    for i in 0..rows {
        let row: Vec<f64> = (0..cols).map(|j| data[i + j * rows]).collect();
        for (j, v) in f(&row).into_iter().enumerate() {
            data[i + j * rows] = v;
        }
    }
    data
}

/// 2-D transform of a matrix; the real and imaginary parts are independent.
fn spectral<F: FieldCoefficient>(m: &Matrix<F>, f: fn(&[f64]) -> Vec<f64>) -> Matrix<F> {
    let (rows, cols) = m.shape();
    let re = separable(rows, cols, m.iter().map(Field::re).collect(), f);
    let im = if F::IS_COMPLEX {
        separable(rows, cols, m.iter().map(Field::im).collect(), f)
    } else {
        vec![0.0; re.len()]
    };
    Matrix::from_fn(rows, cols, |i, j| F::from_parts(re[i + j * rows], im[i + j * rows]))
}

impl<T: Coefficient> Matrix<T> {
    /// Orthonormal DCT-II, columns first and then rows
    #[must_use]
    pub fn dct(&self) -> Matrix<T::Field> {
        spectral(&self.to_field(), transform::dct)
    }

    /// Orthonormal DCT-III, the inverse of [`Matrix::dct`]
    #[must_use]
    pub fn idct(&self) -> Matrix<T::Field> {
        spectral(&self.to_field(), transform::idct)
    }
}

impl<T: Coefficient<Field = f64>> Matrix<T> {
    /// Analytic signal
    ///
    /// The real part of the result is the input; the imaginary part is its
    /// discrete Hilbert transform, taken along a row vector or down every
    /// column otherwise.
    #[must_use]
    pub fn hilbert_transform(&self) -> MatrixComplex {
        let (rows, cols) = self.shape();
        if rows == 1 {
            let z = transform::hilbert(&self.to_field().to_vec());
            return Matrix::from_packed(1, cols, &z);
        }
        let mut out = Vec::with_capacity(rows * cols);
        for j in 0..cols {
            let column: Vec<f64> = self.column(j).iter().map(|&v| v.to_field()).collect();
            out.extend(transform::hilbert(&column));
        }
        Matrix::from_packed(rows, cols, &out)
    }
}

// ============================================================
// Rounding
// ============================================================

impl Matrix<f64> {
    /// Round toward negative infinity
    #[must_use]
    pub fn floor(&self) -> Self {
        self.map(f64::floor)
    }

    /// Round toward positive infinity
    #[must_use]
    pub fn ceil(&self) -> Self {
        self.map(f64::ceil)
    }

    /// Round to nearest, ties to even
    #[must_use]
    pub fn nint(&self) -> Self {
        self.map(f64::round_ties_even)
    }

    /// Truncate toward zero, saturating at the Integer range
    #[must_use]
    pub fn truncate_to_integer(&self) -> MatrixInteger {
        self.map(|x| clamp_to_integer(x.trunc()))
    }

    /// Floor, saturating at the Integer range
    #[must_use]
    pub fn floor_to_integer(&self) -> MatrixInteger {
        self.map(|x| clamp_to_integer(x.floor()))
    }

    /// Ceiling, saturating at the Integer range
    #[must_use]
    pub fn ceil_to_integer(&self) -> MatrixInteger {
        self.map(|x| clamp_to_integer(x.ceil()))
    }

    /// Nearest integer, ties to even, saturating at the Integer range
    #[must_use]
    pub fn nint_to_integer(&self) -> MatrixInteger {
        self.map(|x| clamp_to_integer(x.round_ties_even()))
    }
}

impl Matrix<Complex64> {
    /// Round both components toward negative infinity
    #[must_use]
    pub fn floor(&self) -> Self {
        self.map(|z| Complex64::new(z.re.floor(), z.im.floor()))
    }

    /// Round both components toward positive infinity
    #[must_use]
    pub fn ceil(&self) -> Self {
        self.map(|z| Complex64::new(z.re.ceil(), z.im.ceil()))
    }

    /// Round both components to nearest, ties to even
    #[must_use]
    pub fn nint(&self) -> Self {
        self.map(|z| Complex64::new(z.re.round_ties_even(), z.im.round_ties_even()))
    }
}

/// Real part of every coefficient.
#[must_use]
pub fn real_part(m: &MatrixComplex) -> MatrixReal {
    m.map(|z| z.re)
}

/// Imaginary part of every coefficient.
#[must_use]
pub fn imaginary_part(m: &MatrixComplex) -> MatrixReal {
    m.map(|z| z.im)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn rel_err(a: &MatrixReal, b: &MatrixReal) -> f64 {
        a.try_sub(b).unwrap().euclidean_norm() / b.euclidean_norm()
    }

    #[test]
    fn test_dct_round_trip() {
        let m = MatrixReal::from_fn(5, 4, |i, j| ((i * 4 + j) as f64 * 0.37).sin() + 1.0);
        assert!(rel_err(&m.dct().idct(), &m) <= 1e-15 * 20.0);
    }

    #[test]
    fn test_dct_of_constant_matrix() {
        let m = MatrixInteger::ones(2, 2);
        let d = m.dct();
        assert!((d.at(1, 1).unwrap() - 2.0).abs() < 1e-15);
        assert!(d.iter().skip(1).all(|v| v.abs() < 1e-15));
    }

    #[test]
    fn test_complex_dct_is_componentwise() {
        let z = MatrixComplex::from_fn(3, 2, |i, j| Complex64::new(i as f64, j as f64 - 0.5));
        let d = z.dct();
        let re = real_part(&z).dct();
        let im = imaginary_part(&z).dct();
        for (k, v) in d.iter().enumerate() {
            let k = k as i64 + 1;
            assert!((v.re - re.at_linear(k).unwrap()).abs() < 1e-14);
            assert!((v.im - im.at_linear(k).unwrap()).abs() < 1e-14);
        }
    }

    #[test]
    fn test_hilbert_of_row_vector() {
        let n = 16;
        let m = MatrixReal::from_fn(1, n, |_, j| (2.0 * PI * 2.0 * j as f64 / n as f64).cos());
        let z = m.hilbert_transform();
        assert_eq!(z.shape(), (1, n));
        for j in 0..n {
            let v = z.get(0, j);
            assert_eq!(v.re, m.get(0, j));
            let expected = (2.0 * PI * 2.0 * j as f64 / n as f64).sin();
            assert!((v.im - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_hilbert_columns() {
        let n = 8;
        let col = MatrixReal::from_fn(n, 1, |i, _| (2.0 * PI * i as f64 / n as f64).cos());
        let two = MatrixReal::from_fn(n, 2, |i, _| col.get(i, 0));
        let z = two.hilbert_transform();
        let single = col.hilbert_transform();
        for i in 0..n {
            assert_eq!(z.get(i, 0), single.get(i, 0));
            assert_eq!(z.get(i, 1), single.get(i, 0));
        }
    }

    #[test]
    fn test_hilbert_twice_negates_imaginary_part() {
        // Zero mean and no Nyquist component, so the transform is invertible.
        let n = 12;
        let x = MatrixReal::from_fn(n, 1, |i, _| {
            let t = 2.0 * PI * i as f64 / n as f64;
            t.sin() + 0.5 * (2.0 * t).cos() - 0.25 * (3.0 * t).sin()
        });
        let once = x.hilbert_transform();
        assert_eq!(real_part(&once), x);
        let twice = imaginary_part(&once).hilbert_transform();
        for i in 0..n {
            assert!((twice.get(i, 0).im + x.get(i, 0)).abs() < 1e-12, "i = {i}");
        }
    }

    #[test]
    fn test_rounding() {
        let m = MatrixReal::build(1, 5, &[-1.5, -0.5, 0.5, 2.5, 2.7]).unwrap();
        assert_eq!(m.nint().to_vec(), vec![-2.0, -0.0, 0.0, 2.0, 3.0]);
        assert_eq!(m.floor().to_vec(), vec![-2.0, -1.0, 0.0, 2.0, 2.0]);
        assert_eq!(m.ceil_to_integer().to_vec(), vec![-1, 0, 1, 3, 3]);
        assert_eq!(m.truncate_to_integer().to_vec(), vec![-1, 0, 0, 2, 2]);
        assert_eq!(m.nint_to_integer().to_vec(), vec![-2, 0, 0, 2, 3]);
    }

    #[test]
    fn test_rounding_saturates() {
        let m = MatrixReal::build(1, 3, &[1e300, -1e300, f64::NAN]).unwrap();
        assert_eq!(m.floor_to_integer().to_vec(), vec![i64::MAX, i64::MIN, 0]);
    }

    #[test]
    fn test_complex_rounding() {
        let z = MatrixComplex::build(1, 1, &[Complex64::new(1.5, -1.5)]).unwrap();
        assert_eq!(z.nint().to_vec(), vec![Complex64::new(2.0, -2.0)]);
        assert_eq!(z.floor().to_vec(), vec![Complex64::new(1.0, -2.0)]);
    }
}
