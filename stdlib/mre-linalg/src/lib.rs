//! MRE dense linear algebra.
//!
//! This crate is the dense-matrix provider consumed by the modelling
//! runtime's matrix kernel. All routines work on column-major buffers with an
//! explicit leading dimension, in the shape of the classic LAPACK interface:
//!
//! - [`DenseProvider`] - `gemm`, `getrf`/`getrs`, `gesdd`, `geqrf`/`ungqr`,
//!   `gelqf`/`unglq`, `potrf`, `gehrd`/`unghr`
//! - [`PureRustProvider`] - portable implementation for `f64` and
//!   `Complex<f64>`
//! - [`transform`] - FFT, orthonormal DCT-II/III and the discrete Hilbert
//!   transform
//!
//! # Layout
//!
//! Element `(i, j)` of an `m x n` matrix with leading dimension `ld >= m`
//! lives at index `i + j * ld`. Rows `m..ld` of every column are padding and
//! are never read.

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod blas;
mod cholesky;
pub mod field;
mod householder;
mod lu;
mod provider;
mod svd;
pub mod transform;

pub use field::Field;
pub use provider::{default_provider, DenseProvider, Op, PureRustProvider, Uplo};

use thiserror::Error;

/// Errors reported by the dense provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinalgError {
    /// Cholesky factorisation met a non-positive leading minor.
    #[error("matrix is not positive definite (leading minor {index})")]
    NotPositiveDefinite {
        /// Zero-based index of the failing diagonal entry.
        index: usize,
    },
    /// A buffer or leading dimension does not fit the stated shape.
    #[error("dimension mismatch: expected {expected:?}, got {got:?}")]
    DimensionMismatch {
        /// Required `(rows, cols)`.
        expected: (usize, usize),
        /// Provided `(rows, cols)`.
        got: (usize, usize),
    },
    /// The Jacobi SVD did not converge.
    #[error("singular value decomposition did not converge after {sweeps} sweeps")]
    NoConvergence {
        /// Sweeps performed.
        sweeps: usize,
    },
}

/// Result type for provider routines.
pub type LinalgResult<T> = Result<T, LinalgError>;

/// Index of element `(i, j)` in a column-major buffer with leading dimension
/// `ld`.
#[inline]
pub(crate) const fn at(i: usize, j: usize, ld: usize) -> usize {
    i + j * ld
}

/// Check that `buf` can hold an `rows x cols` matrix with leading dimension
/// `ld`.
pub(crate) fn check_buffer<T>(buf: &[T], rows: usize, cols: usize, ld: usize) -> LinalgResult<()> {
    let needed = if cols == 0 { 0 } else { ld * (cols - 1) + rows };
    if ld < rows.max(1) || buf.len() < needed {
        return Err(LinalgError::DimensionMismatch {
            expected: (rows, cols),
            got: (ld, if ld == 0 { 0 } else { buf.len() / ld }),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_buffer() {
        let buf = [0.0; 12];
        assert!(check_buffer(&buf, 3, 4, 3).is_ok());
        assert!(check_buffer(&buf, 3, 3, 4).is_ok());
        assert!(check_buffer(&buf, 4, 4, 4).is_err());
        assert!(check_buffer(&buf, 3, 2, 2).is_err());
        assert!(check_buffer::<f64>(&[], 0, 0, 1).is_ok());
    }
}
