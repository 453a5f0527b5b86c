//! Dense provider abstraction
//!
//! The matrix kernel talks to linear algebra exclusively through
//! [`DenseProvider`]. [`PureRustProvider`] is the portable implementation;
//! a vendor-backed provider only has to meet the same contracts.

use crate::field::Field;
use crate::{blas, cholesky, householder, lu, svd, LinalgResult};

/// Operand transformation for [`DenseProvider::gemm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Use the operand as stored.
    NoTrans,
    /// Use the transpose.
    Trans,
    /// Use the conjugate transpose.
    ConjTrans,
}

/// Which triangle a symmetric routine reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uplo {
    /// Upper triangle.
    Upper,
    /// Lower triangle.
    Lower,
}

/// Dense linear-algebra provider over the field `T`.
///
/// All matrices are column-major with an explicit leading dimension; see the
/// crate documentation for the layout.
pub trait DenseProvider<T: Field> {
    /// Matrix-matrix multiply: `C = alpha * op(A) * op(B) + beta * C`.
    #[allow(clippy::too_many_arguments)]
    fn gemm(
        &self,
        op_a: Op,
        op_b: Op,
        m: usize,
        n: usize,
        k: usize,
        alpha: T,
        a: &[T],
        lda: usize,
        b: &[T],
        ldb: usize,
        beta: T,
        c: &mut [T],
        ldc: usize,
    ) -> LinalgResult<()>;

    /// LU factorisation with partial pivoting, in place.
    ///
    /// Returns the first elimination step with an exactly zero pivot.
    fn getrf(
        &self,
        m: usize,
        n: usize,
        a: &mut [T],
        lda: usize,
        ipiv: &mut [usize],
    ) -> LinalgResult<Option<usize>>;

    /// Solve `A X = B` with the factors from [`getrf`](Self::getrf).
    #[allow(clippy::too_many_arguments)]
    fn getrs(
        &self,
        n: usize,
        nrhs: usize,
        a: &[T],
        lda: usize,
        ipiv: &[usize],
        b: &mut [T],
        ldb: usize,
    ) -> LinalgResult<()>;

    /// Full singular value decomposition `A = U S V^H`.
    #[allow(clippy::too_many_arguments)]
    fn gesdd(
        &self,
        m: usize,
        n: usize,
        a: &[T],
        lda: usize,
        s: &mut [f64],
        u: &mut [T],
        ldu: usize,
        vt: &mut [T],
        ldvt: usize,
    ) -> LinalgResult<()>;

    /// Householder QR factorisation, in place.
    fn geqrf(&self, m: usize, n: usize, a: &mut [T], lda: usize, tau: &mut [T]) -> LinalgResult<()>;

    /// Generate the first `n` columns of `Q` from [`geqrf`](Self::geqrf).
    fn ungqr(
        &self,
        m: usize,
        n: usize,
        k: usize,
        a: &mut [T],
        lda: usize,
        tau: &[T],
    ) -> LinalgResult<()>;

    /// Householder LQ factorisation, in place.
    fn gelqf(&self, m: usize, n: usize, a: &mut [T], lda: usize, tau: &mut [T]) -> LinalgResult<()>;

    /// Generate the first `m` rows of `Q` from [`gelqf`](Self::gelqf).
    fn unglq(
        &self,
        m: usize,
        n: usize,
        k: usize,
        a: &mut [T],
        lda: usize,
        tau: &[T],
    ) -> LinalgResult<()>;

    /// Cholesky factorisation of a Hermitian positive-definite matrix.
    fn potrf(&self, uplo: Uplo, n: usize, a: &mut [T], lda: usize) -> LinalgResult<()>;

    /// Reduction to upper Hessenberg form, in place.
    fn gehrd(&self, n: usize, a: &mut [T], lda: usize, tau: &mut [T]) -> LinalgResult<()>;

    /// Generate the unitary `Q` from [`gehrd`](Self::gehrd).
    fn unghr(&self, n: usize, a: &mut [T], lda: usize, tau: &[T]) -> LinalgResult<()>;
}

/// Portable provider for `f64` and `Complex<f64>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PureRustProvider {
    svd_max_sweeps: usize,
}

impl PureRustProvider {
    /// Default bound on Jacobi sweeps.
    pub const DEFAULT_SVD_SWEEPS: usize = 60;

    /// Create a provider with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            svd_max_sweeps: Self::DEFAULT_SVD_SWEEPS,
        }
    }

    /// Set the bound on Jacobi sweeps used by `gesdd`.
    #[must_use]
    pub const fn with_svd_max_sweeps(mut self, sweeps: usize) -> Self {
        self.svd_max_sweeps = sweeps;
        self
    }
}

impl Default for PureRustProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Field> DenseProvider<T> for PureRustProvider {
    fn gemm(
        &self,
        op_a: Op,
        op_b: Op,
        m: usize,
        n: usize,
        k: usize,
        alpha: T,
        a: &[T],
        lda: usize,
        b: &[T],
        ldb: usize,
        beta: T,
        c: &mut [T],
        ldc: usize,
    ) -> LinalgResult<()> {
        blas::gemm(op_a, op_b, m, n, k, alpha, a, lda, b, ldb, beta, c, ldc)
    }

    fn getrf(
        &self,
        m: usize,
        n: usize,
        a: &mut [T],
        lda: usize,
        ipiv: &mut [usize],
    ) -> LinalgResult<Option<usize>> {
        lu::getrf(m, n, a, lda, ipiv)
    }

    fn getrs(
        &self,
        n: usize,
        nrhs: usize,
        a: &[T],
        lda: usize,
        ipiv: &[usize],
        b: &mut [T],
        ldb: usize,
    ) -> LinalgResult<()> {
        lu::getrs(n, nrhs, a, lda, ipiv, b, ldb)
    }

    fn gesdd(
        &self,
        m: usize,
        n: usize,
        a: &[T],
        lda: usize,
        s: &mut [f64],
        u: &mut [T],
        ldu: usize,
        vt: &mut [T],
        ldvt: usize,
    ) -> LinalgResult<()> {
        svd::gesdd(m, n, a, lda, s, u, ldu, vt, ldvt, self.svd_max_sweeps)
    }

    fn geqrf(&self, m: usize, n: usize, a: &mut [T], lda: usize, tau: &mut [T]) -> LinalgResult<()> {
        householder::geqrf(m, n, a, lda, tau)
    }

    fn ungqr(
        &self,
        m: usize,
        n: usize,
        k: usize,
        a: &mut [T],
        lda: usize,
        tau: &[T],
    ) -> LinalgResult<()> {
        householder::ungqr(m, n, k, a, lda, tau)
    }

    fn gelqf(&self, m: usize, n: usize, a: &mut [T], lda: usize, tau: &mut [T]) -> LinalgResult<()> {
        householder::gelqf(m, n, a, lda, tau)
    }

    fn unglq(
        &self,
        m: usize,
        n: usize,
        k: usize,
        a: &mut [T],
        lda: usize,
        tau: &[T],
    ) -> LinalgResult<()> {
        householder::unglq(m, n, k, a, lda, tau)
    }

    fn potrf(&self, uplo: Uplo, n: usize, a: &mut [T], lda: usize) -> LinalgResult<()> {
        cholesky::potrf(uplo, n, a, lda)
    }

    fn gehrd(&self, n: usize, a: &mut [T], lda: usize, tau: &mut [T]) -> LinalgResult<()> {
        householder::gehrd(n, a, lda, tau)
    }

    fn unghr(&self, n: usize, a: &mut [T], lda: usize, tau: &[T]) -> LinalgResult<()> {
        householder::unghr(n, a, lda, tau)
    }
}

/// Get the default provider.
pub fn default_provider() -> PureRustProvider {
    PureRustProvider::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_is_object_safe_per_field() {
        let p: &dyn DenseProvider<f64> = &PureRustProvider::new();
        let a = [2.0];
        let mut c = [0.0];
        p.gemm(Op::NoTrans, Op::NoTrans, 1, 1, 1, 1.0, &a, 1, &a, 1, 0.0, &mut c, 1)
            .unwrap();
        assert_eq!(c[0], 4.0);
    }

    #[test]
    fn test_sweep_bound_is_reported() {
        let p = PureRustProvider::new().with_svd_max_sweeps(0);
        let a = [1.0, 1.0, 0.0, 1.0];
        let mut s = [0.0; 2];
        let mut u = [0.0; 4];
        let mut vt = [0.0; 4];
        let err = DenseProvider::<f64>::gesdd(&p, 2, 2, &a, 2, &mut s, &mut u, 2, &mut vt, 2);
        assert!(err.is_err());
    }
}
