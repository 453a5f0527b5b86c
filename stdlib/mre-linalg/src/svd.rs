//! Singular value decomposition by one-sided Jacobi rotations.
//!
//! Hestenes' method orthogonalises the columns of `W = A V` by plane
//! rotations accumulated into `V`. When it converges the column norms of `W`
//! are the singular values and the normalised columns are the left singular
//! vectors. Wide matrices are handled through their adjoint.

use tracing::debug;

use crate::field::{norm2, Field};
use crate::{at, check_buffer, LinalgError, LinalgResult};

/// Full SVD `A = U S V^H` of an `m x n` matrix.
///
/// `s` receives the `min(m, n)` singular values in non-increasing order, `u`
/// the `m x m` left factor and `vt` the `n x n` right factor `V^H`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn gesdd<T: Field>(
    m: usize,
    n: usize,
    a: &[T],
    lda: usize,
    s: &mut [f64],
    u: &mut [T],
    ldu: usize,
    vt: &mut [T],
    ldvt: usize,
    max_sweeps: usize,
) -> LinalgResult<()> {
    check_buffer(a, m, n, lda)?;
    check_buffer(s, m.min(n), 1, m.min(n).max(1))?;
    check_buffer(u, m, m, ldu)?;
    check_buffer(vt, n, n, ldvt)?;

    if m >= n {
        let mut w = vec![T::zero(); m * n];
        for j in 0..n {
            for i in 0..m {
                w[at(i, j, m)] = a[at(i, j, lda)];
            }
        }
        let (sigma, left, right) = tall(m, n, w, max_sweeps)?;
        s[..n].copy_from_slice(&sigma);
        for j in 0..m {
            for i in 0..m {
                u[at(i, j, ldu)] = left[at(i, j, m)];
            }
        }
        for j in 0..n {
            for i in 0..n {
                vt[at(i, j, ldvt)] = right[at(j, i, n)].conj();
            }
        }
    } else {
        // A^H = U' S V'^H  =>  A = V' S U'^H
        let mut w = vec![T::zero(); n * m];
        for j in 0..n {
            for i in 0..m {
                w[at(j, i, n)] = a[at(i, j, lda)].conj();
            }
        }
        let (sigma, left, right) = tall(n, m, w, max_sweeps)?;
        s[..m].copy_from_slice(&sigma);
        for j in 0..m {
            for i in 0..m {
                u[at(i, j, ldu)] = right[at(i, j, m)];
            }
        }
        for j in 0..n {
            for i in 0..n {
                vt[at(i, j, ldvt)] = left[at(j, i, n)].conj();
            }
        }
    }
    Ok(())
}

/// SVD of a tall `m x n` (`m >= n`) matrix held in `w` with leading
/// dimension `m`. Returns `(sigma, U (m x m), V (n x n))`.
fn tall<T: Field>(
    m: usize,
    n: usize,
    mut w: Vec<T>,
    max_sweeps: usize,
) -> LinalgResult<(Vec<f64>, Vec<T>, Vec<T>)> {
    let mut v = vec![T::zero(); n * n];
    for i in 0..n {
        v[at(i, i, n)] = T::one();
    }

    let tol = f64::EPSILON * (m.max(1) as f64);
    let mut converged = n < 2;
    let mut sweeps = 0;
    while !converged && sweeps < max_sweeps {
        sweeps += 1;
        converged = true;
        for p in 0..n - 1 {
            for q in p + 1..n {
                let mut alpha = 0.0;
                let mut beta = 0.0;
                let mut gamma = T::zero();
                for i in 0..m {
                    let wp = w[at(i, p, m)];
                    let wq = w[at(i, q, m)];
                    alpha += wp.modulus_sqr();
                    beta += wq.modulus_sqr();
                    gamma += wp.conj() * wq;
                }
                let g = gamma.modulus();
                if g == 0.0 || g <= tol * (alpha * beta).sqrt() {
                    continue;
                }
                converged = false;

                // Rotate the pair (w_p, phase^-1 w_q), whose inner product
                // is the real value |gamma|.
                let phase_inv = gamma.unit_phase().conj();
                let zeta = (beta - alpha) / (2.0 * g);
                let t = zeta.signum() / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
                let c = 1.0 / (1.0 + t * t).sqrt();
                let sn = c * t;
                rotate(&mut w, m, m, p, q, c, sn, phase_inv);
                rotate(&mut v, n, n, p, q, c, sn, phase_inv);
            }
        }
    }
    if !converged {
        debug!(sweeps, rows = m, cols = n, "jacobi svd did not converge");
        return Err(LinalgError::NoConvergence { sweeps });
    }

    let mut sigma: Vec<f64> = (0..n)
        .map(|j| norm2((0..m).map(|i| w[at(i, j, m)])))
        .collect();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&x, &y| sigma[y].total_cmp(&sigma[x]));

    let smax = order.first().map_or(0.0, |&j| sigma[j]);
    let cutoff = smax * f64::EPSILON * (m as f64);
    let mut left = vec![T::zero(); m * m];
    let mut right = vec![T::zero(); n * n];
    let mut filled = vec![false; m];
    for (dst, &src) in order.iter().enumerate() {
        let sj = sigma[src];
        if sj > cutoff && sj > 0.0 {
            for i in 0..m {
                left[at(i, dst, m)] = w[at(i, src, m)].scale(1.0 / sj);
            }
            filled[dst] = true;
        }
        for i in 0..n {
            right[at(i, dst, n)] = v[at(i, src, n)];
        }
    }
    sigma = order.iter().map(|&j| sigma[j]).collect();
    complete_basis(&mut left, m, &filled);
    Ok((sigma, left, right))
}

/// Apply the rotation to columns `p`, `q` of an `rows`-row matrix:
/// `x_p' = c x_p - s e x_q`, `x_q' = s x_p + c e x_q` with `e = phase_inv`.
#[allow(clippy::too_many_arguments)]
fn rotate<T: Field>(
    x: &mut [T],
    rows: usize,
    ld: usize,
    p: usize,
    q: usize,
    c: f64,
    s: f64,
    phase_inv: T,
) {
    for i in 0..rows {
        let xp = x[at(i, p, ld)];
        let xq = x[at(i, q, ld)] * phase_inv;
        x[at(i, p, ld)] = xp.scale(c) - xq.scale(s);
        x[at(i, q, ld)] = xp.scale(s) + xq.scale(c);
    }
}

/// Fill the columns of `u` not marked in `filled` with an orthonormal
/// completion, by Gram-Schmidt (twice) against the canonical basis.
fn complete_basis<T: Field>(u: &mut [T], m: usize, filled: &[bool]) {
    let mut done: Vec<usize> = (0..m).filter(|&j| filled[j]).collect();
    let mut candidate = 0;
    for j in 0..m {
        if filled[j] {
            continue;
        }
        while candidate < m {
            let mut x = vec![T::zero(); m];
            x[candidate] = T::one();
            candidate += 1;
            for _ in 0..2 {
                for &k in &done {
                    let mut dot = T::zero();
                    for i in 0..m {
                        dot += u[at(i, k, m)].conj() * x[i];
                    }
                    for (i, xi) in x.iter_mut().enumerate() {
                        *xi -= u[at(i, k, m)] * dot;
                    }
                }
            }
            let norm = norm2(x.iter().copied());
            if norm > 0.5 {
                for (i, xi) in x.into_iter().enumerate() {
                    u[at(i, j, m)] = xi.scale(1.0 / norm);
                }
                done.push(j);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn reconstruct<T: Field>(m: usize, n: usize, s: &[f64], u: &[T], vt: &[T]) -> Vec<T> {
        let mut out = vec![T::zero(); m * n];
        for j in 0..n {
            for i in 0..m {
                let mut acc = T::zero();
                for (k, &sk) in s.iter().enumerate() {
                    acc += u[at(i, k, m)].scale(sk) * vt[at(k, j, n)];
                }
                out[at(i, j, m)] = acc;
            }
        }
        out
    }

    #[test]
    fn test_diagonal() {
        let a = [3.0, 0.0, 0.0, 5.0];
        let mut s = [0.0; 2];
        let mut u = [0.0; 4];
        let mut vt = [0.0; 4];
        gesdd(2, 2, &a, 2, &mut s, &mut u, 2, &mut vt, 2, 60).unwrap();
        assert_eq!(s, [5.0, 3.0]);
    }

    #[test]
    fn test_tall_and_wide_reconstruct() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        for &(m, n) in &[(3, 2), (2, 3)] {
            let mut s = vec![0.0; 2];
            let mut u = vec![0.0; m * m];
            let mut vt = vec![0.0; n * n];
            gesdd(m, n, &a, m, &mut s, &mut u, m, &mut vt, n, 60).unwrap();
            assert!(s[0] >= s[1]);
            let back = reconstruct(m, n, &s, &u, &vt);
            for (x, y) in back.iter().zip(a.iter()) {
                assert!((x - y).abs() < 1e-12, "m = {m}, n = {n}");
            }
        }
    }

    #[test]
    fn test_rank_deficient_completes_u() {
        // Rank one: every column is a multiple of [1, 1, 1].
        let a = [1.0, 1.0, 1.0, 2.0, 2.0, 2.0];
        let mut s = [0.0; 2];
        let mut u = [0.0; 9];
        let mut vt = [0.0; 4];
        gesdd(3, 2, &a, 3, &mut s, &mut u, 3, &mut vt, 2, 60).unwrap();
        assert!(s[1].abs() < 1e-12);
        for p in 0..3 {
            for q in 0..3 {
                let d: f64 = (0..3).map(|i| u[at(i, p, 3)] * u[at(i, q, 3)]).sum();
                let expected = if p == q { 1.0 } else { 0.0 };
                assert!((d - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_complex_reconstruct() {
        let a = [
            Complex64::new(1.0, 1.0),
            Complex64::new(0.0, -2.0),
            Complex64::new(3.0, 0.5),
            Complex64::new(-1.0, 0.0),
        ];
        let mut s = [0.0; 2];
        let mut u = [Complex64::new(0.0, 0.0); 4];
        let mut vt = [Complex64::new(0.0, 0.0); 4];
        gesdd(2, 2, &a, 2, &mut s, &mut u, 2, &mut vt, 2, 60).unwrap();
        let back = reconstruct(2, 2, &s, &u, &vt);
        for (x, y) in back.iter().zip(a.iter()) {
            assert!((x - y).norm() < 1e-12);
        }
    }
}
