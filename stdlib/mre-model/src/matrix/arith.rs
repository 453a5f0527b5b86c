//! Element-wise and algebraic matrix operators.

use mre_linalg::{DenseProvider, Op};
use num_complex::Complex64;

use super::{Coefficient, FieldCoefficient, Matrix};
use crate::config::config;
use crate::error::{ModelError, Result};

/// Ring operations on a coefficient kind.
///
/// Integer operations wrap on overflow.
pub trait Numeric: Coefficient {
    /// `self + rhs`
    fn plus(self, rhs: Self) -> Self;
    /// `self - rhs`
    fn minus(self, rhs: Self) -> Self;
    /// `self * rhs`
    fn times(self, rhs: Self) -> Self;
    /// `-self`
    fn negated(self) -> Self;

    /// Packed column-major product of an `m x k` and a `k x n` matrix.
    fn product(m: usize, n: usize, k: usize, a: &[Self], b: &[Self]) -> Result<Vec<Self>> {
        let mut c = vec![Self::ZERO; m * n];
        for j in 0..n {
            for p in 0..k {
                let bpj = b[p + j * k];
                for i in 0..m {
                    c[i + j * m] = c[i + j * m].plus(a[i + p * m].times(bpj));
                }
            }
        }
        Ok(c)
    }
}

impl Numeric for i64 {
    fn plus(self, rhs: Self) -> Self {
        self.wrapping_add(rhs)
    }

    fn minus(self, rhs: Self) -> Self {
        self.wrapping_sub(rhs)
    }

    fn times(self, rhs: Self) -> Self {
        self.wrapping_mul(rhs)
    }

    fn negated(self) -> Self {
        self.wrapping_neg()
    }
}

fn gemm<T: FieldCoefficient>(m: usize, n: usize, k: usize, a: &[T], b: &[T]) -> Result<Vec<T>> {
    let mut c = vec![T::ZERO; m * n];
    if m == 0 || n == 0 {
        return Ok(c);
    }
    config().provider().gemm(
        Op::NoTrans,
        Op::NoTrans,
        m,
        n,
        k,
        T::ONE,
        a,
        m,
        b,
        k.max(1),
        T::ZERO,
        &mut c,
        m,
    )?;
    Ok(c)
}

impl Numeric for f64 {
    fn plus(self, rhs: Self) -> Self {
        self + rhs
    }

    fn minus(self, rhs: Self) -> Self {
        self - rhs
    }

    fn times(self, rhs: Self) -> Self {
        self * rhs
    }

    fn negated(self) -> Self {
        -self
    }

    fn product(m: usize, n: usize, k: usize, a: &[Self], b: &[Self]) -> Result<Vec<Self>> {
        gemm(m, n, k, a, b)
    }
}

impl Numeric for Complex64 {
    fn plus(self, rhs: Self) -> Self {
        self + rhs
    }

    fn minus(self, rhs: Self) -> Self {
        self - rhs
    }

    fn times(self, rhs: Self) -> Self {
        self * rhs
    }

    fn negated(self) -> Self {
        -self
    }

    fn product(m: usize, n: usize, k: usize, a: &[Self], b: &[Self]) -> Result<Vec<Self>> {
        gemm(m, n, k, a, b)
    }
}

impl<T: Coefficient> Matrix<T> {
    fn same_shape(&self, other: &Self) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(ModelError::IncompatibleMatrixDimensions {
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(())
    }

    fn zip_with(&self, other: &Self, mut f: impl FnMut(T, T) -> T) -> Result<Self> {
        self.same_shape(other)?;
        Ok(Self::from_fn(self.rows, self.cols, |i, j| {
            f(self.get(i, j), other.get(i, j))
        }))
    }
}

impl<T: Numeric> Matrix<T> {
    /// Element-wise sum
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IncompatibleMatrixDimensions`] if the shapes
    /// differ.
    pub fn try_add(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, T::plus)
    }

    /// Element-wise difference
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IncompatibleMatrixDimensions`] if the shapes
    /// differ.
    pub fn try_sub(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, T::minus)
    }

    /// Element-wise (Hadamard) product
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IncompatibleMatrixDimensions`] if the shapes
    /// differ.
    pub fn hadamard(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, T::times)
    }

    /// Matrix product
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IncompatibleMatrixDimensions`] unless
    /// `self.cols() == other.rows()`.
    pub fn matmul(&self, other: &Self) -> Result<Self> {
        if self.cols != other.rows {
            return Err(ModelError::IncompatibleMatrixDimensions {
                left: self.shape(),
                right: other.shape(),
            });
        }
        let (m, k, n) = (self.rows, self.cols, other.cols);
        let c = T::product(m, n, k, &self.to_vec(), &other.to_vec())?;
        Ok(Self::from_packed(m, n, &c))
    }

    /// Multiply every coefficient by `k`
    #[must_use]
    pub fn scale(&self, k: T) -> Self {
        self.map(|v| v.times(k))
    }

    /// Unary minus
    #[must_use]
    pub fn negate(&self) -> Self {
        self.map(T::negated)
    }

    /// Kronecker product
    #[must_use]
    pub fn kronecker(&self, other: &Self) -> Self {
        let (p, q) = other.shape();
        Self::from_fn(self.rows * p, self.cols * q, |i, j| {
            self.get(i / p, j / q).times(other.get(i % p, j % q))
        })
    }

    /// Sum of the main diagonal
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidMatrixDimensions`] for a non-square
    /// matrix.
    pub fn trace(&self) -> Result<T> {
        if !self.is_square() {
            return Err(ModelError::InvalidMatrixDimensions {
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok((0..self.rows).fold(T::ZERO, |acc, i| acc.plus(self.get(i, i))))
    }

    /// Row vector of column sums
    #[must_use]
    pub fn column_sums(&self) -> Self {
        Self::from_fn(1, self.cols, |_, j| {
            self.column(j).iter().fold(T::ZERO, |acc, &v| acc.plus(v))
        })
    }

    /// Column vector of row sums
    #[must_use]
    pub fn row_sums(&self) -> Self {
        Self::from_fn(self.rows, 1, |i, _| {
            (0..self.cols).fold(T::ZERO, |acc, j| acc.plus(self.get(i, j)))
        })
    }
}

impl<T: FieldCoefficient> Matrix<T> {
    /// Divide every coefficient by `k`
    ///
    /// Division by zero follows IEEE semantics.
    #[must_use]
    pub fn divide(&self, k: T) -> Self {
        self.map(|v| v / k)
    }
}

impl Matrix<bool> {
    /// Element-wise logical and
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IncompatibleMatrixDimensions`] if the shapes
    /// differ.
    pub fn logical_and(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a && b)
    }

    /// Element-wise logical or
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IncompatibleMatrixDimensions`] if the shapes
    /// differ.
    pub fn logical_or(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a || b)
    }

    /// Element-wise exclusive or
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IncompatibleMatrixDimensions`] if the shapes
    /// differ.
    pub fn logical_xor(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a != b)
    }

    /// Element-wise negation
    #[must_use]
    pub fn logical_not(&self) -> Self {
        self.map(|a| !a)
    }
}
