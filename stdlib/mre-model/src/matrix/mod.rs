//! Dense matrices
//!
//! `Matrix<T>` is a rows x columns table over one of four coefficient kinds:
//! `bool`, `i64`, `f64` and `Complex64`. Indices are 1-based at the public
//! surface.
//!
//! # Storage
//!
//! Coefficients are stored column-major in a copy-on-write [`Shared`]
//! buffer. Every column is padded with zeros to a multiple of the 256-bit
//! register width ([`Alignment::COLUMN`]); [`Matrix::stride`] reports the
//! padded column length and [`Matrix::raw_data`] exposes the padded buffer.
//!
//! # Modules
//!
//! - `arith` - element-wise and algebraic operators, boolean logic
//! - `decomp` - PLU, SVD, QR, LQ, Cholesky, Hessenberg and the solvers
//! - `norms` - norms, equilibration and structural predicates
//! - `transform` - DCT, Hilbert transform and rounding

mod arith;
mod decomp;
mod norms;
mod transform;

pub use arith::Numeric;
pub use decomp::{Hessenberg, Lq, Plu, Qr, Svd};
pub use norms::Equilibration;
pub use transform::{imaginary_part, real_part};

use std::fmt;

use mre_linalg::Field;
use mre_rts_cow::{padded_len, Alignment, Generation, Shared};
use num_complex::Complex64;

use crate::error::{invalid, ModelError, Result};
use crate::index::{offset, Index};
use crate::kind::ValueKind;
use crate::scalar::{complex_to_real, real_to_integer};
use crate::variant::Variant;

/// Matrix of booleans.
pub type MatrixBoolean = Matrix<bool>;
/// Matrix of integers.
pub type MatrixInteger = Matrix<i64>;
/// Matrix of reals.
pub type MatrixReal = Matrix<f64>;
/// Matrix of complex values.
pub type MatrixComplex = Matrix<Complex64>;

// ============================================================
// Coefficient kinds
// ============================================================

/// A scalar kind that can be stored in a [`Matrix`].
pub trait Coefficient: Copy + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Scalar kind of the coefficient.
    const KIND: ValueKind;

    /// Kind of a matrix of this coefficient.
    const MATRIX_KIND: ValueKind;

    /// Field the decompositions of this kind work in.
    type Field: FieldCoefficient;

    /// Additive identity.
    const ZERO: Self;

    /// Multiplicative identity.
    const ONE: Self;

    /// Lossless embedding into [`Self::Field`].
    fn to_field(self) -> Self::Field;

    /// Lossless embedding into the complex numbers.
    fn to_complex(self) -> Complex64;

    /// Complex conjugate; the identity except for complex coefficients.
    #[inline]
    fn conjugate(self) -> Self {
        self
    }

    /// Wrap as a scalar variant.
    fn to_variant(self) -> Variant;

    /// Exact conversion from a scalar variant.
    fn from_variant(v: &Variant) -> Option<Self>;

    /// Wrap a matrix of this kind as a variant.
    fn wrap(m: Matrix<Self>) -> Variant;
}

/// A coefficient kind the dense provider can factorise.
pub trait FieldCoefficient: Coefficient<Field = Self> + Field + Numeric {}

impl FieldCoefficient for f64 {}
impl FieldCoefficient for Complex64 {}

impl Coefficient for bool {
    const KIND: ValueKind = ValueKind::Boolean;
    const MATRIX_KIND: ValueKind = ValueKind::MatrixBoolean;
    type Field = f64;

    const ZERO: Self = false;
    const ONE: Self = true;

    fn to_field(self) -> f64 {
        f64::from(u8::from(self))
    }

    fn to_complex(self) -> Complex64 {
        Complex64::new(self.to_field(), 0.0)
    }

    fn to_variant(self) -> Variant {
        Variant::Boolean(self)
    }

    fn from_variant(v: &Variant) -> Option<Self> {
        match i64::from_variant(v)? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }

    fn wrap(m: Matrix<Self>) -> Variant {
        Variant::MatrixBoolean(m)
    }
}

impl Coefficient for i64 {
    const KIND: ValueKind = ValueKind::Integer;
    const MATRIX_KIND: ValueKind = ValueKind::MatrixInteger;
    type Field = f64;

    const ZERO: Self = 0;
    const ONE: Self = 1;

    fn to_field(self) -> f64 {
        self as f64
    }

    fn to_complex(self) -> Complex64 {
        Complex64::new(self as f64, 0.0)
    }

    fn to_variant(self) -> Variant {
        Variant::Integer(self)
    }

    fn from_variant(v: &Variant) -> Option<Self> {
        match v {
            Variant::Boolean(b) => Some(i64::from(*b)),
            Variant::Integer(i) => Some(*i),
            Variant::Real(x) => real_to_integer(*x),
            Variant::Complex(z) => complex_to_real(*z).and_then(real_to_integer),
            _ => None,
        }
    }

    fn wrap(m: Matrix<Self>) -> Variant {
        Variant::MatrixInteger(m)
    }
}

impl Coefficient for f64 {
    const KIND: ValueKind = ValueKind::Real;
    const MATRIX_KIND: ValueKind = ValueKind::MatrixReal;
    type Field = f64;

    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    fn to_field(self) -> f64 {
        self
    }

    fn to_complex(self) -> Complex64 {
        Complex64::new(self, 0.0)
    }

    fn to_variant(self) -> Variant {
        Variant::Real(self)
    }

    fn from_variant(v: &Variant) -> Option<Self> {
        match v {
            Variant::Boolean(b) => Some(f64::from(u8::from(*b))),
            Variant::Integer(i) => Some(*i as f64),
            Variant::Real(x) => Some(*x),
            Variant::Complex(z) => complex_to_real(*z),
            _ => None,
        }
    }

    fn wrap(m: Matrix<Self>) -> Variant {
        Variant::MatrixReal(m)
    }
}

impl Coefficient for Complex64 {
    const KIND: ValueKind = ValueKind::Complex;
    const MATRIX_KIND: ValueKind = ValueKind::MatrixComplex;
    type Field = Complex64;

    const ZERO: Self = Complex64::new(0.0, 0.0);
    const ONE: Self = Complex64::new(1.0, 0.0);

    fn to_field(self) -> Complex64 {
        self
    }

    fn to_complex(self) -> Complex64 {
        self
    }

    fn conjugate(self) -> Self {
        self.conj()
    }

    fn to_variant(self) -> Variant {
        Variant::Complex(self)
    }

    fn from_variant(v: &Variant) -> Option<Self> {
        match v {
            Variant::Complex(z) => Some(*z),
            other => f64::from_variant(other).map(|x| Complex64::new(x, 0.0)),
        }
    }

    fn wrap(m: Matrix<Self>) -> Variant {
        Variant::MatrixComplex(m)
    }
}

// ============================================================
// Core Matrix Type
// ============================================================

/// A dense, column-major, copy-on-write matrix.
#[derive(Clone)]
pub struct Matrix<T: Coefficient> {
    rows: usize,
    cols: usize,
    stride: usize,
    data: Shared<Vec<T>>,
}

/// Padded column length for `rows` coefficients of type `T`.
fn stride_for<T>(rows: usize) -> usize {
    padded_len::<T>(rows.max(1), Alignment::COLUMN)
}

impl<T: Coefficient> Matrix<T> {
    /// Create a matrix of zeros
    #[must_use]
    pub fn zero(rows: usize, cols: usize) -> Self {
        let stride = stride_for::<T>(rows);
        Self {
            rows,
            cols,
            stride,
            data: Shared::new(vec![T::ZERO; stride * cols]),
        }
    }

    /// Zero matrix whose storage is reserved fallibly.
    fn try_zero(rows: usize, cols: usize) -> Result<Self> {
        let too_large = || ModelError::InvalidMatrixDimensions { rows, cols };
        if rows > isize::MAX as usize {
            return Err(too_large());
        }
        let stride = stride_for::<T>(rows);
        let len = stride.checked_mul(cols).ok_or_else(too_large)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| too_large())?;
        data.resize(len, T::ZERO);
        Ok(Self {
            rows,
            cols,
            stride,
            data: Shared::new(data),
        })
    }

    /// Create a matrix of ones
    #[must_use]
    pub fn ones(rows: usize, cols: usize) -> Self {
        Self::from_fn(rows, cols, |_, _| T::ONE)
    }

    /// Create an `n x n` identity matrix
    #[must_use]
    pub fn identity(n: usize) -> Self {
        Self::identity_rect(n, n)
    }

    /// Create a rectangular identity: ones on the main diagonal
    #[must_use]
    pub fn identity_rect(rows: usize, cols: usize) -> Self {
        Self::from_fn(rows, cols, |i, j| if i == j { T::ONE } else { T::ZERO })
    }

    /// Create from a function of the 0-based `(row, col)`
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut m = Self::zero(rows, cols);
        let stride = m.stride;
        let data = Shared::make_mut(&mut m.data);
        for j in 0..cols {
            for i in 0..rows {
                data[i + j * stride] = f(i, j);
            }
        }
        m
    }

    /// Create from column-major coefficients
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidParameterValue`] if `values` does not
    /// hold exactly `rows * cols` coefficients and
    /// [`ModelError::InvalidMatrixDimensions`] if that product overflows.
    pub fn build(rows: usize, cols: usize, values: &[T]) -> Result<Self> {
        let len = rows
            .checked_mul(cols)
            .ok_or(ModelError::InvalidMatrixDimensions { rows, cols })?;
        if values.len() != len {
            return Err(invalid(format!(
                "{rows}x{cols} matrix needs {len} coefficients, got {}",
                values.len()
            )));
        }
        Ok(Self::from_fn(rows, cols, |i, j| values[i + j * rows]))
    }

    /// Create from a list of rows
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidParameterValue`] for ragged rows.
    pub fn from_rows(rows: &[Vec<T>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return Err(invalid("rows have different lengths"));
        }
        Ok(Self::from_fn(rows.len(), cols, |i, j| rows[i][j]))
    }

    /// Column-major coefficients without padding
    pub(crate) fn from_packed(rows: usize, cols: usize, packed: &[T]) -> Self {
        Self::from_fn(rows, cols, |i, j| packed[i + j * rows])
    }

    /// Get the number of rows
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Get the number of columns
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Get the shape as (rows, cols)
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of coefficients, `rows * cols`
    #[must_use]
    pub fn coefficients(&self) -> usize {
        self.rows * self.cols
    }

    /// Check if the matrix has no coefficients
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coefficients() == 0
    }

    /// Check if the matrix is square
    #[must_use]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Padded column length of the store
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The padded column-major store
    #[must_use]
    pub fn raw_data(&self) -> &[T] {
        self.data.get()
    }

    /// Coefficients of 0-based column `j`
    ///
    /// # Panics
    ///
    /// Panics if `j >= cols`.
    #[must_use]
    pub fn column(&self, j: usize) -> &[T] {
        assert!(j < self.cols, "column {j} out of bounds");
        &self.data[j * self.stride..j * self.stride + self.rows]
    }

    /// Mutation generation of this handle
    #[must_use]
    pub fn generation(&self) -> Generation {
        Shared::generation(&self.data)
    }

    /// True if both matrices share one store
    #[must_use]
    pub fn shares_payload_with(&self, other: &Self) -> bool {
        Shared::ptr_eq(&self.data, &other.data)
    }

    #[inline]
    pub(crate) fn get(&self, i: usize, j: usize) -> T {
        self.data[i + j * self.stride]
    }

    #[inline]
    pub(crate) fn set(&mut self, i: usize, j: usize, v: T) {
        let stride = self.stride;
        Shared::make_mut(&mut self.data)[i + j * stride] = v;
    }

    /// Coefficient at 0-based column-major position `k`
    #[inline]
    pub(crate) fn get_linear(&self, k: usize) -> T {
        self.get(k % self.rows, k / self.rows)
    }

    /// Coefficients in column-major order without padding
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Iterate coefficients in column-major order, skipping the padding
    #[must_use]
    pub fn iter(&self) -> MatrixIter<'_, T> {
        MatrixIter {
            matrix: self,
            front: 0,
            back: self.coefficients(),
        }
    }

    /// Cursor on the first coefficient
    #[must_use]
    pub fn cursor(&self) -> MatrixCursor {
        MatrixCursor {
            index: 0,
            generation: self.generation(),
        }
    }

    /// Map a function over all coefficients
    pub fn map<U: Coefficient>(&self, mut f: impl FnMut(T) -> U) -> Matrix<U> {
        Matrix::from_fn(self.rows, self.cols, |i, j| f(self.get(i, j)))
    }

    /// Lossless conversion into the decomposition field
    #[must_use]
    pub fn to_field(&self) -> Matrix<T::Field> {
        self.map(T::to_field)
    }

    /// Exact conversion to another coefficient kind
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRuntimeConversion`] if a coefficient is
    /// not representable in `U`.
    pub fn convert<U: Coefficient>(&self) -> Result<Matrix<U>> {
        let mut out = Matrix::<U>::zero(self.rows, self.cols);
        for j in 0..self.cols {
            for i in 0..self.rows {
                let v = U::from_variant(&self.get(i, j).to_variant()).ok_or(
                    ModelError::InvalidRuntimeConversion {
                        from: T::MATRIX_KIND,
                        to: U::MATRIX_KIND,
                    },
                )?;
                out.set(i, j, v);
            }
        }
        Ok(out)
    }

    // ------------------------------------------------------------
    // Element access
    // ------------------------------------------------------------

    /// Coefficient at 1-based `(row, col)`
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidIndex`] when out of bounds.
    pub fn at(&self, row: i64, col: i64) -> Result<T> {
        let i = offset(row, self.rows)?;
        let j = offset(col, self.cols)?;
        Ok(self.get(i, j))
    }

    /// Coefficient at 1-based column-major position `index`
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidIndex`] when out of bounds.
    pub fn at_linear(&self, index: i64) -> Result<T> {
        let k = offset(index, self.coefficients())?;
        Ok(self.get_linear(k))
    }

    /// Coefficient or submatrix named by a variant index
    ///
    /// A scalar index returns one coefficient. A matrix index returns a
    /// matrix of the index's shape; any other container returns a row
    /// vector when `self` is a row vector and a column vector otherwise.
    ///
    /// # Errors
    ///
    /// Fails for an unusable index or a position out of bounds.
    pub fn at_index(&self, index: &Variant) -> Result<Variant> {
        match Index::from_variant(index)? {
            Index::Scalar(k) => Ok(self.at_linear(k)?.to_variant()),
            Index::List { positions, shape } => {
                let values = positions
                    .iter()
                    .map(|&k| self.at_linear(k))
                    .collect::<Result<Vec<T>>>()?;
                let (rows, cols) = match shape {
                    Some(s) => s,
                    None if self.rows == 1 => (1, values.len()),
                    None => (values.len(), 1),
                };
                Ok(T::wrap(Self::from_packed(rows, cols, &values)))
            }
        }
    }

    /// Coefficient or submatrix named by a row and a column index
    ///
    /// Two scalar indices return one coefficient; otherwise the result is
    /// the submatrix gathered from the named rows and columns.
    ///
    /// # Errors
    ///
    /// Fails for an unusable index or a position out of bounds.
    pub fn at_index2(&self, row: &Variant, col: &Variant) -> Result<Variant> {
        match (Index::from_variant(row)?, Index::from_variant(col)?) {
            (Index::Scalar(r), Index::Scalar(c)) => Ok(self.at(r, c)?.to_variant()),
            (ri, ci) => {
                let rows = positions_of(ri)
                    .into_iter()
                    .map(|r| offset(r, self.rows))
                    .collect::<Result<Vec<_>>>()?;
                let cols = positions_of(ci)
                    .into_iter()
                    .map(|c| offset(c, self.cols))
                    .collect::<Result<Vec<_>>>()?;
                Ok(T::wrap(Self::from_fn(rows.len(), cols.len(), |i, j| {
                    self.get(rows[i], cols[j])
                })))
            }
        }
    }

    /// Store `v` at 1-based `(row, col)`, growing the matrix as needed
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidIndex`] for a position below 1 or one
    /// too large to allocate.
    pub fn update(&mut self, row: i64, col: i64, v: T) -> Result<()> {
        let r = positive(row, self.rows)?;
        let c = positive(col, self.cols)?;
        if r > self.rows || c > self.cols {
            let index = if r > self.rows { row } else { col };
            let size = self.coefficients() as u64;
            self.resize(r.max(self.rows), c.max(self.cols))
                .map_err(|_| ModelError::InvalidIndex { index, size })?;
        }
        self.set(r - 1, c - 1, v);
        Ok(())
    }

    /// Store `v` at 1-based column-major position `index`
    ///
    /// Writing past the end grows a column vector (or an empty matrix) by
    /// rows and a row vector by columns.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidIndex`] for a position below 1, past
    /// the end of a matrix that is not a vector, or too large to allocate.
    pub fn update_linear(&mut self, index: i64, v: T) -> Result<()> {
        let k = positive(index, self.coefficients())?;
        if k > self.coefficients() {
            let out_of_range = ModelError::InvalidIndex {
                index,
                size: self.coefficients() as u64,
            };
            let grown = if self.cols == 1 || self.is_empty() {
                self.resize(k, 1)
            } else if self.rows == 1 {
                self.resize(1, k)
            } else {
                return Err(out_of_range);
            };
            grown.map_err(|_| out_of_range)?;
        }
        let k = k - 1;
        self.set(k % self.rows, k / self.rows, v);
        Ok(())
    }

    /// Resize, keeping coefficients at their `(row, col)` positions
    ///
    /// New positions hold zero.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidMatrixDimensions`] when the new storage
    /// cannot be allocated; `self` is left unchanged.
    pub fn resize(&mut self, rows: usize, cols: usize) -> Result<()> {
        if (rows, cols) == self.shape() {
            return Ok(());
        }
        let old = std::mem::replace(self, Self::try_zero(rows, cols)?);
        let keep_r = rows.min(old.rows);
        let keep_c = cols.min(old.cols);
        if keep_r == 0 || keep_c == 0 {
            return Ok(());
        }
        let stride = self.stride;
        let data = Shared::make_mut(&mut self.data);
        for j in 0..keep_c {
            data[j * stride..j * stride + keep_r].copy_from_slice(&old.column(j)[..keep_r]);
        }
        Ok(())
    }

    // ------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------

    /// Transpose the matrix
    #[must_use]
    pub fn transpose(&self) -> Self {
        Self::from_fn(self.cols, self.rows, |i, j| self.get(j, i))
    }

    /// Complex conjugate of every coefficient
    #[must_use]
    pub fn conj(&self) -> Self {
        self.map(T::conjugate)
    }

    /// Conjugate transpose
    #[must_use]
    pub fn adjoint(&self) -> Self {
        Self::from_fn(self.cols, self.rows, |i, j| self.get(j, i).conjugate())
    }

    /// Reinterpret the column-major coefficients with a new shape
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidMatrixDimensions`] if the coefficient
    /// count changes.
    pub fn reshape(&self, rows: usize, cols: usize) -> Result<Self> {
        if rows.checked_mul(cols) != Some(self.coefficients()) {
            return Err(ModelError::InvalidMatrixDimensions { rows, cols });
        }
        let values = self.to_vec();
        Ok(Self::from_packed(rows, cols, &values))
    }

    /// Main diagonal as a column vector
    #[must_use]
    pub fn diagonal(&self) -> Self {
        let n = self.rows.min(self.cols);
        Self::from_fn(n, 1, |i, _| self.get(i, i))
    }

    /// Square matrix with `values` on the diagonal
    #[must_use]
    pub fn from_diagonal(values: &[T]) -> Self {
        let n = values.len();
        Self::from_fn(n, n, |i, j| if i == j { values[i] } else { T::ZERO })
    }
}

fn positions_of(index: Index) -> Vec<i64> {
    match index {
        Index::Scalar(i) => vec![i],
        Index::List { positions, .. } => positions,
    }
}

fn positive(index: i64, size: usize) -> Result<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i >= 1)
        .ok_or(ModelError::InvalidIndex {
            index,
            size: size as u64,
        })
}

impl<T: Coefficient> Default for Matrix<T> {
    fn default() -> Self {
        Self::zero(0, 0)
    }
}

impl<T: Coefficient> PartialEq for Matrix<T> {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.iter().eq(other.iter())
    }
}

impl<T: Coefficient> fmt::Debug for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matrix")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("data", &self.to_vec())
            .finish()
    }
}

impl<T: Coefficient> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for i in 0..self.rows {
            if i > 0 {
                f.write_str("; ")?;
            }
            for j in 0..self.cols {
                if j > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", self.get(i, j).to_variant())?;
            }
        }
        f.write_str("]")
    }
}

// ============================================================
// Iteration
// ============================================================

/// Column-major iterator over the coefficients of a [`Matrix`].
#[derive(Debug, Clone)]
pub struct MatrixIter<'a, T: Coefficient> {
    matrix: &'a Matrix<T>,
    front: usize,
    back: usize,
}

impl<T: Coefficient> Iterator for MatrixIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.front >= self.back {
            return None;
        }
        let v = self.matrix.get_linear(self.front);
        self.front += 1;
        Some(v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<T: Coefficient> DoubleEndedIterator for MatrixIter<'_, T> {
    fn next_back(&mut self) -> Option<T> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.matrix.get_linear(self.back))
    }
}

impl<T: Coefficient> ExactSizeIterator for MatrixIter<'_, T> {}

/// Column-major position inside a [`Matrix`].
///
/// Like the tuple cursor, it records the matrix generation and refuses to
/// read after the matrix was mutated through another path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixCursor {
    index: usize,
    generation: Generation,
}

impl MatrixCursor {
    /// Coefficient under the cursor, `None` at the end.
    ///
    /// # Errors
    ///
    /// Fails if the matrix was mutated since the cursor was created.
    pub fn get<T: Coefficient>(&self, matrix: &Matrix<T>) -> Result<Option<T>> {
        if matrix.generation() != self.generation {
            return Err(invalid("matrix was modified after the cursor was created"));
        }
        Ok((self.index < matrix.coefficients()).then(|| matrix.get_linear(self.index)))
    }

    /// Overwrite the coefficient under the cursor.
    ///
    /// # Errors
    ///
    /// Fails if the cursor is stale or at the end.
    pub fn set<T: Coefficient>(&mut self, matrix: &mut Matrix<T>, v: T) -> Result<()> {
        if self.get(matrix)?.is_none() {
            return Err(ModelError::InvalidIndex {
                index: self.index as i64 + 1,
                size: matrix.coefficients() as u64,
            });
        }
        let rows = matrix.rows;
        matrix.set(self.index % rows, self.index / rows, v);
        self.generation = matrix.generation();
        Ok(())
    }

    /// Move forward by `d` coefficients.
    pub fn advance(&mut self, d: usize) {
        self.index = self.index.saturating_add(d);
    }

    /// Move backward by `d` coefficients.
    pub fn backup(&mut self, d: usize) {
        self.index = self.index.saturating_sub(d);
    }

    /// Coefficient distance `self - other`, ignoring padding.
    #[must_use]
    pub fn distance(&self, other: &Self) -> isize {
        self.index as isize - other.index as isize
    }

    /// 0-based column-major position.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}
