//! Matrix factorisations and the solvers built on them.
//!
//! Every entry point converts the matrix into its decomposition field
//! (`f64` for Boolean, Integer and Real matrices, `Complex64` for Complex
//! ones) and hands packed column-major copies to the dense provider
//! selected by the engine configuration.

use mre_linalg::{DenseProvider, LinalgError, LinalgResult, Uplo};
use tracing::{debug, instrument};

use super::{Coefficient, FieldCoefficient, Matrix};
use crate::config::config;
use crate::error::{invalid, ModelError, Result};

// ============================================================
// Result Types
// ============================================================

/// Result of PLU decomposition.
///
/// `P * L * U = A` where `P` is a permutation matrix, `L` is unit lower
/// triangular (`rows x min(rows, cols)`) and `U` is upper triangular
/// (`min(rows, cols) x cols`).
#[derive(Debug, Clone, PartialEq)]
pub struct Plu<F: FieldCoefficient> {
    /// Row permutation.
    pub p: Matrix<F>,
    /// Unit lower-triangular factor.
    pub l: Matrix<F>,
    /// Upper-triangular factor.
    pub u: Matrix<F>,
    /// False when a pivot of `U` is zero within the pivot tolerance.
    pub non_singular: bool,
    /// Packed `L` and `U` as returned by the provider.
    factors: Vec<F>,
    /// Pivot indices: row `k` was swapped with row `pivots[k]`.
    pivots: Vec<usize>,
}

impl<F: FieldCoefficient> Plu<F> {
    /// Compute the determinant from the factors.
    ///
    /// `det(A) = (-1)^swaps * prod(U_kk)`
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidMatrixDimensions`] for a non-square
    /// factorisation.
    pub fn determinant(&self) -> Result<F> {
        let n = self.l.rows();
        if n != self.u.cols() {
            return Err(ModelError::InvalidMatrixDimensions {
                rows: n,
                cols: self.u.cols(),
            });
        }
        let swaps = self
            .pivots
            .iter()
            .enumerate()
            .filter(|&(k, &p)| p != k)
            .count();
        let product = (0..n).fold(F::ONE, |acc, k| acc * self.factors[k + k * n]);
        Ok(if swaps % 2 == 1 { -product } else { product })
    }

    /// Solve `A x = b` using the factors; `b` may have several columns.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MatrixIsSingular`] if the factorisation found a
    /// zero pivot, [`ModelError::IncompatibleMatrixDimensions`] if `b` has
    /// the wrong number of rows.
    pub fn solve(&self, b: &Matrix<F>) -> Result<Matrix<F>> {
        let n = self.l.rows();
        if n != self.u.cols() {
            return Err(ModelError::InvalidMatrixDimensions {
                rows: n,
                cols: self.u.cols(),
            });
        }
        if b.rows() != n {
            return Err(ModelError::IncompatibleMatrixDimensions {
                left: (n, n),
                right: b.shape(),
            });
        }
        if !self.non_singular {
            return Err(ModelError::MatrixIsSingular);
        }
        let nrhs = b.cols();
        let mut x = b.to_vec();
        if nrhs > 0 {
            config()
                .provider()
                .getrs(n, nrhs, &self.factors, n, &self.pivots, &mut x, n)?;
        }
        Ok(Matrix::from_packed(n, nrhs, &x))
    }
}

/// Result of singular value decomposition.
///
/// `U * S * Vh = A` with `U` (`rows x rows`) and `Vh` (`cols x cols`)
/// unitary and `S` (`rows x cols`) diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct Svd<F: FieldCoefficient> {
    /// Left singular vectors.
    pub u: Matrix<F>,
    /// Singular values on the diagonal, non-increasing.
    pub s: Matrix<F>,
    /// Conjugate transpose of the right singular vectors.
    pub vh: Matrix<F>,
    /// The `min(rows, cols)` singular values.
    pub singular_values: Vec<f64>,
    /// False when the Jacobi iteration did not converge; the factors are
    /// then zero.
    pub success: bool,
}

/// Result of QR decomposition: `Q * R = A`.
#[derive(Debug, Clone, PartialEq)]
pub struct Qr<F: FieldCoefficient> {
    /// Unitary factor, `rows x rows`.
    pub q: Matrix<F>,
    /// Upper-triangular factor, `rows x cols`.
    pub r: Matrix<F>,
    /// False when the factors contain non-finite values.
    pub success: bool,
}

/// Result of LQ decomposition: `L * Q = A`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lq<F: FieldCoefficient> {
    /// Lower-triangular factor, `rows x cols`.
    pub l: Matrix<F>,
    /// Unitary factor, `cols x cols`.
    pub q: Matrix<F>,
    /// False when the factors contain non-finite values.
    pub success: bool,
}

/// Result of Hessenberg reduction: `Q * H * Q^H = A`.
#[derive(Debug, Clone, PartialEq)]
pub struct Hessenberg<F: FieldCoefficient> {
    /// Unitary similarity.
    pub q: Matrix<F>,
    /// Upper Hessenberg matrix.
    pub h: Matrix<F>,
}

// ============================================================
// Entry Points
// ============================================================

impl<T: Coefficient> Matrix<T> {
    pub(crate) fn require_square(&self) -> Result<()> {
        if self.is_square() {
            Ok(())
        } else {
            Err(ModelError::InvalidMatrixDimensions {
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    fn require_nonempty(&self) -> Result<()> {
        if self.is_empty() {
            Err(ModelError::InvalidMatrixDimensions {
                rows: self.rows,
                cols: self.cols,
            })
        } else {
            Ok(())
        }
    }

    /// PLU decomposition with partial pivoting
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidMatrixDimensions`] for an empty matrix.
    #[instrument(skip_all, fields(rows = self.rows, cols = self.cols))]
    pub fn plu(&self) -> Result<Plu<T::Field>> {
        self.require_nonempty()?;
        factor_lu(&self.to_field())
    }

    /// Singular value decomposition
    ///
    /// Non-convergence is reported through [`Svd::success`].
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidMatrixDimensions`] for an empty matrix.
    #[instrument(skip_all, fields(rows = self.rows, cols = self.cols))]
    pub fn svd(&self) -> Result<Svd<T::Field>> {
        self.require_nonempty()?;
        let a = self.to_field();
        let (m, n) = a.shape();
        match svd_parts(&a) {
            Ok(parts) => {
                let k = m.min(n);
                let s = &parts.singular_values;
                Ok(Svd {
                    u: Matrix::from_packed(m, m, &parts.u),
                    s: Matrix::from_fn(m, n, |i, j| {
                        if i == j && i < k {
                            <T::Field as mre_linalg::Field>::from_real(s[i])
                        } else {
                            <T::Field as Coefficient>::ZERO
                        }
                    }),
                    vh: Matrix::from_packed(n, n, &parts.vt),
                    singular_values: parts.singular_values,
                    success: true,
                })
            }
            Err(LinalgError::NoConvergence { .. }) => Ok(Svd {
                u: Matrix::zero(m, m),
                s: Matrix::zero(m, n),
                vh: Matrix::zero(n, n),
                singular_values: vec![0.0; m.min(n)],
                success: false,
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// QR decomposition; requires `rows >= cols`
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidMatrixDimensions`] for an empty or wide
    /// matrix.
    #[instrument(skip_all, fields(rows = self.rows, cols = self.cols))]
    pub fn qr(&self) -> Result<Qr<T::Field>> {
        self.require_nonempty()?;
        if self.rows < self.cols {
            return Err(ModelError::InvalidMatrixDimensions {
                rows: self.rows,
                cols: self.cols,
            });
        }
        factor_qr(&self.to_field())
    }

    /// LQ decomposition; requires `rows <= cols`
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidMatrixDimensions`] for an empty or tall
    /// matrix.
    #[instrument(skip_all, fields(rows = self.rows, cols = self.cols))]
    pub fn lq(&self) -> Result<Lq<T::Field>> {
        self.require_nonempty()?;
        if self.rows > self.cols {
            return Err(ModelError::InvalidMatrixDimensions {
                rows: self.rows,
                cols: self.cols,
            });
        }
        factor_lq(&self.to_field())
    }

    /// Lower Cholesky factor `L` with `L * L^H = A`
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidMatrixDimensions`] for an empty or
    /// non-square matrix and [`ModelError::InvalidParameterValue`] unless
    /// the matrix is Hermitian positive definite.
    #[instrument(skip_all, fields(rows = self.rows, cols = self.cols))]
    pub fn cholesky(&self) -> Result<Matrix<T::Field>> {
        self.factor_cholesky(Uplo::Lower)
    }

    /// Upper Cholesky factor `U` with `U^H * U = A`
    ///
    /// # Errors
    ///
    /// Same as [`Matrix::cholesky`].
    #[instrument(skip_all, fields(rows = self.rows, cols = self.cols))]
    pub fn upper_cholesky(&self) -> Result<Matrix<T::Field>> {
        self.factor_cholesky(Uplo::Upper)
    }

    fn factor_cholesky(&self, uplo: Uplo) -> Result<Matrix<T::Field>> {
        self.require_nonempty()?;
        self.require_square()?;
        if !self.is_hermitian() {
            return Err(invalid("cholesky factorisation needs a Hermitian matrix"));
        }
        let n = self.rows;
        let mut a = self.to_field().to_vec();
        config().provider().potrf(uplo, n, &mut a, n)?;
        Ok(Matrix::from_packed(n, n, &a))
    }

    /// Reduction to upper Hessenberg form
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidMatrixDimensions`] for an empty or
    /// non-square matrix.
    #[instrument(skip_all, fields(rows = self.rows, cols = self.cols))]
    pub fn hessenberg(&self) -> Result<Hessenberg<T::Field>> {
        self.require_nonempty()?;
        self.require_square()?;
        factor_hessenberg(&self.to_field())
    }

    // ------------------------------------------------------------
    // Solvers and derived quantities
    // ------------------------------------------------------------

    /// Solve `A x = b` through PLU; `b` may have several columns
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidMatrixDimensions`] for a non-square
    /// matrix, [`ModelError::IncompatibleMatrixDimensions`] if `b` has the
    /// wrong number of rows and [`ModelError::MatrixIsSingular`] if `A` is
    /// singular.
    #[instrument(skip_all, fields(rows = self.rows, cols = self.cols))]
    pub fn solve(&self, b: &Matrix<T::Field>) -> Result<Matrix<T::Field>> {
        self.require_square()?;
        if b.rows() != self.rows {
            return Err(ModelError::IncompatibleMatrixDimensions {
                left: self.shape(),
                right: b.shape(),
            });
        }
        if self.is_empty() {
            return Ok(Matrix::zero(0, b.cols()));
        }
        factor_lu(&self.to_field())?.solve(b)
    }

    /// Minimum-norm least-squares solution of `A x = b`
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IncompatibleMatrixDimensions`] if `b` has the
    /// wrong number of rows.
    #[instrument(skip_all, fields(rows = self.rows, cols = self.cols))]
    pub fn least_squares(&self, b: &Matrix<T::Field>) -> Result<Matrix<T::Field>> {
        if b.rows() != self.rows {
            return Err(ModelError::IncompatibleMatrixDimensions {
                left: self.shape(),
                right: b.shape(),
            });
        }
        self.pseudo_inverse()?.matmul(b)
    }

    /// Inverse through PLU
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidMatrixDimensions`] for a non-square
    /// matrix and [`ModelError::MatrixIsSingular`] if it is singular.
    #[instrument(skip_all, fields(rows = self.rows, cols = self.cols))]
    pub fn inverse(&self) -> Result<Matrix<T::Field>> {
        self.require_square()?;
        if self.is_empty() {
            return Ok(Matrix::zero(0, 0));
        }
        factor_lu(&self.to_field())?.solve(&Matrix::identity(self.rows))
    }

    /// Determinant through PLU; the empty matrix has determinant one
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidMatrixDimensions`] for a non-square
    /// matrix.
    #[instrument(skip_all, fields(rows = self.rows, cols = self.cols))]
    pub fn determinant(&self) -> Result<T::Field> {
        self.require_square()?;
        determinant_of(&self.to_field())
    }

    /// Moore-Penrose pseudo-inverse through the SVD
    ///
    /// # Errors
    ///
    /// Fails if the SVD does not converge.
    #[instrument(skip_all, fields(rows = self.rows, cols = self.cols))]
    pub fn pseudo_inverse(&self) -> Result<Matrix<T::Field>> {
        pseudo_inverse_of(&self.to_field())
    }

    /// Number of singular values above `tolerance`
    ///
    /// Without an explicit tolerance the configured `rank_tolerance` is
    /// used, and failing that `max(rows, cols) * sigma_max * eps`.
    ///
    /// # Errors
    ///
    /// Fails if the SVD does not converge.
    pub fn rank(&self, tolerance: Option<f64>) -> Result<usize> {
        if self.is_empty() {
            return Ok(0);
        }
        let parts = svd_parts(&self.to_field())?;
        let s = &parts.singular_values;
        let smax = s.first().copied().unwrap_or(0.0);
        let tol = tolerance
            .or(config().rank_tolerance)
            .unwrap_or(self.rows.max(self.cols) as f64 * smax * f64::EPSILON);
        Ok(s.iter().filter(|&&x| x > tol).count())
    }

    /// 2-norm condition number `sigma_max / sigma_min`
    ///
    /// Infinite for a rank-deficient matrix.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidMatrixDimensions`] for an empty matrix.
    pub fn condition_number(&self) -> Result<f64> {
        self.require_nonempty()?;
        let parts = svd_parts(&self.to_field())?;
        let s = &parts.singular_values;
        let smax = s.first().copied().unwrap_or(0.0);
        let smin = s.last().copied().unwrap_or(0.0);
        Ok(if smin == 0.0 { f64::INFINITY } else { smax / smin })
    }
}

// ============================================================
// Field Kernels
// ============================================================

fn factor_lu<F: FieldCoefficient>(a: &Matrix<F>) -> Result<Plu<F>> {
    let cfg = config();
    let (m, n) = a.shape();
    let k = m.min(n);
    let mut lu = a.to_vec();
    let mut pivots = vec![0; k];
    cfg.provider().getrf(m, n, &mut lu, m, &mut pivots)?;

    let amax = a.iter().map(|v| v.modulus()).fold(0.0, f64::max);
    let tolerance = cfg.pivot_tolerance * m.max(n) as f64 * amax;
    let mut non_singular = true;
    for i in 0..k {
        let pivot = lu[i + i * m].modulus();
        if pivot <= tolerance {
            debug!(index = i, pivot, tolerance, "plu pivot under tolerance");
            non_singular = false;
        }
    }

    let mut perm: Vec<usize> = (0..m).collect();
    for (step, &p) in pivots.iter().enumerate() {
        perm.swap(step, p);
    }
    let mut p = Matrix::zero(m, m);
    for (i, &row) in perm.iter().enumerate() {
        p.set(row, i, F::ONE);
    }

    Ok(Plu {
        p,
        l: Matrix::from_fn(m, k, |i, j| match i.cmp(&j) {
            std::cmp::Ordering::Greater => lu[i + j * m],
            std::cmp::Ordering::Equal => F::ONE,
            std::cmp::Ordering::Less => F::ZERO,
        }),
        u: Matrix::from_fn(k, n, |i, j| if i <= j { lu[i + j * m] } else { F::ZERO }),
        non_singular,
        factors: lu,
        pivots,
    })
}

fn determinant_of<F: FieldCoefficient>(a: &Matrix<F>) -> Result<F> {
    if a.is_empty() {
        return Ok(F::ONE);
    }
    factor_lu(a)?.determinant()
}

struct SvdParts<F> {
    singular_values: Vec<f64>,
    u: Vec<F>,
    vt: Vec<F>,
}

fn svd_parts<F: FieldCoefficient>(a: &Matrix<F>) -> LinalgResult<SvdParts<F>> {
    let (m, n) = a.shape();
    let mut singular_values = vec![0.0; m.min(n)];
    let mut u = vec![F::ZERO; m * m];
    let mut vt = vec![F::ZERO; n * n];
    config()
        .provider()
        .gesdd(m, n, &a.to_vec(), m, &mut singular_values, &mut u, m, &mut vt, n)?;
    Ok(SvdParts {
        singular_values,
        u,
        vt,
    })
}

fn pseudo_inverse_of<F: FieldCoefficient>(a: &Matrix<F>) -> Result<Matrix<F>> {
    let (m, n) = a.shape();
    if a.is_empty() {
        return Ok(Matrix::zero(n, m));
    }
    let parts = svd_parts(a)?;
    let s = &parts.singular_values;
    let smax = s.first().copied().unwrap_or(0.0);
    let cutoff = m.max(n) as f64 * smax * f64::EPSILON;
    let inverted: Vec<(usize, f64)> = s
        .iter()
        .enumerate()
        .filter(|&(_, &x)| x > cutoff)
        .map(|(k, &x)| (k, 1.0 / x))
        .collect();
    // A+ = V S+ U^H, with V[i, k] = conj(Vt[k, i]).
    Ok(Matrix::from_fn(n, m, |i, j| {
        inverted.iter().fold(F::ZERO, |acc, &(k, r)| {
            acc + (parts.vt[k + i * n].conj() * parts.u[j + k * m].conj()).scale(r)
        })
    }))
}

fn all_finite<F: FieldCoefficient>(m: &Matrix<F>) -> bool {
    m.iter().all(|v| v.is_finite())
}

fn factor_qr<F: FieldCoefficient>(a: &Matrix<F>) -> Result<Qr<F>> {
    let provider = config().provider();
    let (m, n) = a.shape();
    let mut f = a.to_vec();
    let mut tau = vec![F::ZERO; n];
    provider.geqrf(m, n, &mut f, m, &mut tau)?;
    let r = Matrix::from_fn(m, n, |i, j| if i <= j { f[i + j * m] } else { F::ZERO });

    let mut q = vec![F::ZERO; m * m];
    q[..m * n].copy_from_slice(&f);
    provider.ungqr(m, m, n, &mut q, m, &tau)?;
    let q = Matrix::from_packed(m, m, &q);

    let success = all_finite(&q) && all_finite(&r);
    Ok(Qr { q, r, success })
}

fn factor_lq<F: FieldCoefficient>(a: &Matrix<F>) -> Result<Lq<F>> {
    let provider = config().provider();
    let (m, n) = a.shape();
    let mut f = a.to_vec();
    let mut tau = vec![F::ZERO; m];
    provider.gelqf(m, n, &mut f, m, &mut tau)?;
    let l = Matrix::from_fn(m, n, |i, j| if j <= i { f[i + j * m] } else { F::ZERO });

    // The reflectors are rows of f; embed them in an n x n buffer.
    let mut q = vec![F::ZERO; n * n];
    for j in 0..n {
        for i in 0..m {
            q[i + j * n] = f[i + j * m];
        }
    }
    provider.unglq(n, n, m, &mut q, n, &tau)?;
    let q = Matrix::from_packed(n, n, &q);

    let success = all_finite(&l) && all_finite(&q);
    Ok(Lq { l, q, success })
}

fn factor_hessenberg<F: FieldCoefficient>(a: &Matrix<F>) -> Result<Hessenberg<F>> {
    let provider = config().provider();
    let n = a.rows();
    let mut h = a.to_vec();
    let mut tau = vec![F::ZERO; n.saturating_sub(2)];
    provider.gehrd(n, &mut h, n, &mut tau)?;
    let mut q = h.clone();
    provider.unghr(n, &mut q, n, &tau)?;
    Ok(Hessenberg {
        q: Matrix::from_packed(n, n, &q),
        h: Matrix::from_fn(n, n, |i, j| if i <= j + 1 { h[i + j * n] } else { F::ZERO }),
    })
}
