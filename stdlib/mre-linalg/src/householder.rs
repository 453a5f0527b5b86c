//! Householder reflectors and the factorisations built on them.
//!
//! Every reflector has the form `H = I - tau * v * v^H` with `v[0] = 1` and a
//! real `tau`, so `H` is Hermitian as well as unitary. The target entry is
//! mapped to `beta = -phase(alpha) * ||x||`, which keeps `tau` real for
//! complex data.
//!
//! Reflector vectors are stored below the diagonal (QR, Hessenberg) or right
//! of the diagonal (LQ) of the factored matrix, without the implicit leading
//! one.

use crate::field::{norm2, Field};
use crate::{at, check_buffer, LinalgError, LinalgResult};

/// A generated reflector.
struct Reflector<T> {
    tau: f64,
    beta: T,
}

/// Generate a reflector annihilating `x[1..]`; `x` is overwritten with `v`
/// (including `v[0] = 1`).
fn generate<T: Field>(x: &mut [T]) -> Reflector<T> {
    let alpha = x[0];
    let tail = norm2(x[1..].iter().copied());
    if tail == 0.0 {
        x[0] = T::one();
        return Reflector {
            tau: 0.0,
            beta: alpha,
        };
    }
    let norm = norm2(x.iter().copied());
    let beta = -alpha.unit_phase().scale(norm);
    let tau = 1.0 + alpha.modulus() / norm;
    let denom = alpha - beta;
    for v in x[1..].iter_mut() {
        *v /= denom;
    }
    x[0] = T::one();
    Reflector { tau, beta }
}

/// Apply `H = I - tau v v^H` from the left to rows `r0..r0 + v.len()` of
/// columns `cols` of `a`.
fn apply_left<T: Field>(
    v: &[T],
    tau: f64,
    a: &mut [T],
    lda: usize,
    r0: usize,
    cols: std::ops::Range<usize>,
) {
    if tau == 0.0 {
        return;
    }
    for j in cols {
        let mut w = T::zero();
        for (i, &vi) in v.iter().enumerate() {
            w += vi.conj() * a[at(r0 + i, j, lda)];
        }
        let w = w.scale(tau);
        for (i, &vi) in v.iter().enumerate() {
            a[at(r0 + i, j, lda)] -= vi * w;
        }
    }
}

/// Apply `H` from the right to columns `c0..c0 + v.len()` of rows `rows` of
/// `a`.
fn apply_right<T: Field>(
    v: &[T],
    tau: f64,
    a: &mut [T],
    lda: usize,
    c0: usize,
    rows: std::ops::Range<usize>,
) {
    if tau == 0.0 {
        return;
    }
    for i in rows {
        let mut w = T::zero();
        for (j, &vj) in v.iter().enumerate() {
            w += a[at(i, c0 + j, lda)] * vj;
        }
        let w = w.scale(tau);
        for (j, &vj) in v.iter().enumerate() {
            a[at(i, c0 + j, lda)] -= w * vj.conj();
        }
    }
}

fn identity<T: Field>(n: usize) -> Vec<T> {
    let mut q = vec![T::zero(); n * n];
    for i in 0..n {
        q[at(i, i, n)] = T::one();
    }
    q
}

fn copy_out<T: Field>(src: &[T], rows: usize, cols: usize, lds: usize, dst: &mut [T], ldd: usize) {
    for j in 0..cols {
        for i in 0..rows {
            dst[at(i, j, ldd)] = src[at(i, j, lds)];
        }
    }
}

// ============================================================
// QR
// ============================================================

/// Householder QR. On return the upper triangle holds `R`, the reflectors
/// sit below the diagonal and `tau[k]` holds their scales.
pub(crate) fn geqrf<T: Field>(
    m: usize,
    n: usize,
    a: &mut [T],
    lda: usize,
    tau: &mut [T],
) -> LinalgResult<()> {
    check_buffer(a, m, n, lda)?;
    let steps = m.min(n);
    check_buffer(tau, steps, 1, steps.max(1))?;

    let mut v = Vec::with_capacity(m);
    for k in 0..steps {
        v.clear();
        v.extend((k..m).map(|i| a[at(i, k, lda)]));
        let r = generate(&mut v);
        apply_left(&v, r.tau, a, lda, k, k + 1..n);
        a[at(k, k, lda)] = r.beta;
        for (i, &vi) in v.iter().enumerate().skip(1) {
            a[at(k + i, k, lda)] = vi;
        }
        tau[k] = T::from_real(r.tau);
    }
    Ok(())
}

/// Overwrite `a` (`m x n`, `m >= n >= k`) with the first `n` columns of
/// `Q = H_0 H_1 ... H_{k-1}` from [`geqrf`].
pub(crate) fn ungqr<T: Field>(
    m: usize,
    n: usize,
    k: usize,
    a: &mut [T],
    lda: usize,
    tau: &[T],
) -> LinalgResult<()> {
    if n > m || k > n {
        return Err(LinalgError::DimensionMismatch {
            expected: (m, m.min(n)),
            got: (m, n),
        });
    }
    check_buffer(a, m, n, lda)?;
    check_buffer(tau, k, 1, k.max(1))?;

    let reflectors: Vec<Vec<T>> = (0..k)
        .map(|j| {
            std::iter::once(T::one())
                .chain((j + 1..m).map(|i| a[at(i, j, lda)]))
                .collect()
        })
        .collect();

    let mut q = vec![T::zero(); m * n];
    for i in 0..n {
        q[at(i, i, m)] = T::one();
    }
    for j in (0..k).rev() {
        apply_left(&reflectors[j], tau[j].re(), &mut q, m, j, 0..n);
    }
    copy_out(&q, m, n, m, a, lda);
    Ok(())
}

// ============================================================
// LQ
// ============================================================

/// Householder LQ. On return the lower triangle holds `L`, the reflectors
/// sit right of the diagonal.
pub(crate) fn gelqf<T: Field>(
    m: usize,
    n: usize,
    a: &mut [T],
    lda: usize,
    tau: &mut [T],
) -> LinalgResult<()> {
    check_buffer(a, m, n, lda)?;
    let steps = m.min(n);
    check_buffer(tau, steps, 1, steps.max(1))?;

    let mut v = Vec::with_capacity(n);
    for k in 0..steps {
        // Reflect the conjugated row so that row * H = conj(beta) e_k.
        v.clear();
        v.extend((k..n).map(|j| a[at(k, j, lda)].conj()));
        let r = generate(&mut v);
        apply_right(&v, r.tau, a, lda, k, k + 1..m);
        a[at(k, k, lda)] = r.beta.conj();
        for (j, &vj) in v.iter().enumerate().skip(1) {
            a[at(k, k + j, lda)] = vj;
        }
        tau[k] = T::from_real(r.tau);
    }
    Ok(())
}

/// Overwrite `a` (`m x n`, `n >= m >= k`) with the first `m` rows of
/// `Q = H_{k-1} ... H_1 H_0` from [`gelqf`].
pub(crate) fn unglq<T: Field>(
    m: usize,
    n: usize,
    k: usize,
    a: &mut [T],
    lda: usize,
    tau: &[T],
) -> LinalgResult<()> {
    if m > n || k > m {
        return Err(LinalgError::DimensionMismatch {
            expected: (m.min(n), n),
            got: (m, n),
        });
    }
    check_buffer(a, m, n, lda)?;
    check_buffer(tau, k, 1, k.max(1))?;

    let reflectors: Vec<Vec<T>> = (0..k)
        .map(|j| {
            std::iter::once(T::one())
                .chain((j + 1..n).map(|c| a[at(j, c, lda)]))
                .collect()
        })
        .collect();

    let mut q = identity::<T>(n);
    for (j, v) in reflectors.iter().enumerate() {
        apply_left(v, tau[j].re(), &mut q, n, j, 0..n);
    }
    copy_out(&q, m, n, n, a, lda);
    Ok(())
}

// ============================================================
// Hessenberg
// ============================================================

/// Reduce the square matrix to upper Hessenberg form `Q^H A Q`. Reflectors
/// are stored below the first subdiagonal.
pub(crate) fn gehrd<T: Field>(n: usize, a: &mut [T], lda: usize, tau: &mut [T]) -> LinalgResult<()> {
    check_buffer(a, n, n, lda)?;
    let steps = n.saturating_sub(2);
    check_buffer(tau, steps, 1, steps.max(1))?;

    let mut v = Vec::with_capacity(n);
    for k in 0..steps {
        v.clear();
        v.extend((k + 1..n).map(|i| a[at(i, k, lda)]));
        let r = generate(&mut v);
        apply_left(&v, r.tau, a, lda, k + 1, k + 1..n);
        apply_right(&v, r.tau, a, lda, k + 1, 0..n);
        a[at(k + 1, k, lda)] = r.beta;
        for (i, &vi) in v.iter().enumerate().skip(1) {
            a[at(k + 1 + i, k, lda)] = vi;
        }
        tau[k] = T::from_real(r.tau);
    }
    Ok(())
}

/// Overwrite `a` with the unitary `Q` accumulated by [`gehrd`].
pub(crate) fn unghr<T: Field>(n: usize, a: &mut [T], lda: usize, tau: &[T]) -> LinalgResult<()> {
    check_buffer(a, n, n, lda)?;
    let steps = n.saturating_sub(2);
    check_buffer(tau, steps, 1, steps.max(1))?;

    let reflectors: Vec<Vec<T>> = (0..steps)
        .map(|k| {
            std::iter::once(T::one())
                .chain((k + 2..n).map(|i| a[at(i, k, lda)]))
                .collect()
        })
        .collect();

    let mut q = identity::<T>(n);
    for k in (0..steps).rev() {
        apply_left(&reflectors[k], tau[k].re(), &mut q, n, k + 1, 0..n);
    }
    copy_out(&q, n, n, n, a, lda);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_reflector_maps_to_beta() {
        let x = [3.0, 4.0];
        let mut v = x;
        let r = generate(&mut v);
        assert_eq!(r.beta, -5.0);
        let mut y = x.to_vec();
        apply_left(&v, r.tau, &mut y, 2, 0, 0..1);
        assert!((y[0] + 5.0).abs() < 1e-14);
        assert!(y[1].abs() < 1e-14);
    }

    #[test]
    fn test_complex_reflector_maps_to_beta() {
        let x = [Complex64::new(1.0, 1.0), Complex64::new(0.0, 2.0), Complex64::new(-1.0, 0.5)];
        let mut v = x;
        let r = generate(&mut v);
        let mut y = x.to_vec();
        apply_left(&v, r.tau, &mut y, 3, 0, 0..1);
        assert!((y[0] - r.beta).norm() < 1e-14);
        assert!(y[1].norm() < 1e-14 && y[2].norm() < 1e-14);
    }

    #[test]
    fn test_qr_square() {
        // A = [2 -1; 1 3]
        let a0 = [2.0, 1.0, -1.0, 3.0];
        let mut a = a0;
        let mut tau = [0.0; 2];
        geqrf(2, 2, &mut a, 2, &mut tau).unwrap();
        let r = [a[0], 0.0, a[2], a[3]];
        let mut q = a;
        ungqr(2, 2, 2, &mut q, 2, &tau).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                let qr: f64 = (0..2).map(|l| q[at(i, l, 2)] * r[at(l, j, 2)]).sum();
                assert!((qr - a0[at(i, j, 2)]).abs() < 1e-14);
            }
        }
    }

    #[test]
    fn test_ungqr_shape_check() {
        let mut a = [0.0; 6];
        assert!(ungqr(2, 3, 2, &mut a, 2, &[0.0; 2]).is_err());
    }
}
