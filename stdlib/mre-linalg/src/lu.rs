//! LU factorisation with partial pivoting.

use crate::field::Field;
use crate::{at, check_buffer, LinalgResult};

/// Factor the `m x n` matrix in place as `P * L * U`.
///
/// On return the strict lower part holds `L` (unit diagonal implied) and the
/// upper part holds `U`. `ipiv[k]` is the row swapped with row `k` at step
/// `k`. Returns the first step whose pivot was exactly zero; elimination
/// skips that column and continues so the factors stay meaningful.
pub(crate) fn getrf<T: Field>(
    m: usize,
    n: usize,
    a: &mut [T],
    lda: usize,
    ipiv: &mut [usize],
) -> LinalgResult<Option<usize>> {
    check_buffer(a, m, n, lda)?;
    let steps = m.min(n);
    check_buffer(ipiv, steps, 1, steps.max(1))?;

    let mut first_zero = None;
    for k in 0..steps {
        let mut p = k;
        let mut best = a[at(k, k, lda)].modulus();
        for i in k + 1..m {
            let v = a[at(i, k, lda)].modulus();
            if v > best {
                best = v;
                p = i;
            }
        }
        ipiv[k] = p;
        if p != k {
            for j in 0..n {
                a.swap(at(k, j, lda), at(p, j, lda));
            }
        }

        let pivot = a[at(k, k, lda)];
        if pivot == T::zero() {
            first_zero.get_or_insert(k);
            continue;
        }
        for i in k + 1..m {
            a[at(i, k, lda)] /= pivot;
        }
        for j in k + 1..n {
            let akj = a[at(k, j, lda)];
            if akj == T::zero() {
                continue;
            }
            for i in k + 1..m {
                let lik = a[at(i, k, lda)];
                a[at(i, j, lda)] -= lik * akj;
            }
        }
    }
    Ok(first_zero)
}

/// Solve `A * X = B` for square `A` factored by [`getrf`]; `B` (`n x nrhs`)
/// is overwritten by `X`.
pub(crate) fn getrs<T: Field>(
    n: usize,
    nrhs: usize,
    a: &[T],
    lda: usize,
    ipiv: &[usize],
    b: &mut [T],
    ldb: usize,
) -> LinalgResult<()> {
    check_buffer(a, n, n, lda)?;
    check_buffer(b, n, nrhs, ldb)?;
    check_buffer(ipiv, n, 1, n.max(1))?;

    for (k, &p) in ipiv.iter().enumerate().take(n) {
        if p != k {
            for j in 0..nrhs {
                b.swap(at(k, j, ldb), at(p, j, ldb));
            }
        }
    }
    for j in 0..nrhs {
        // Forward substitution with unit L.
        for k in 0..n {
            let bk = b[at(k, j, ldb)];
            if bk == T::zero() {
                continue;
            }
            for i in k + 1..n {
                b[at(i, j, ldb)] -= a[at(i, k, lda)] * bk;
            }
        }
        // Back substitution with U.
        for k in (0..n).rev() {
            let idx = at(k, j, ldb);
            b[idx] /= a[at(k, k, lda)];
            let bk = b[idx];
            for i in 0..k {
                b[at(i, j, ldb)] -= a[at(i, k, lda)] * bk;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_getrf_2x2() {
        // A = [1 2; 3 4] column-major
        let mut a = [1.0, 3.0, 2.0, 4.0];
        let mut ipiv = [0; 2];
        let zero = getrf(2, 2, &mut a, 2, &mut ipiv).unwrap();
        assert_eq!(zero, None);
        assert_eq!(ipiv, [1, 1]);
        // U = [3 4; 0 2/3], L21 = 1/3
        assert_eq!(a[0], 3.0);
        assert!((a[1] - 1.0 / 3.0).abs() < 1e-15);
        assert_eq!(a[2], 4.0);
        assert!((a[3] - 2.0 / 3.0).abs() < 1e-15);
    }

    #[test]
    fn test_getrf_reports_exact_zero_pivot() {
        let mut a = [0.0, 0.0, 1.0, 1.0];
        let mut ipiv = [0; 2];
        assert_eq!(getrf(2, 2, &mut a, 2, &mut ipiv).unwrap(), Some(0));
    }

    #[test]
    fn test_getrs_solves() {
        // [2 1; 1 3] x = [3; 5] => x = [0.8; 1.4]
        let mut a = [2.0, 1.0, 1.0, 3.0];
        let mut ipiv = [0; 2];
        getrf(2, 2, &mut a, 2, &mut ipiv).unwrap();
        let mut b = [3.0, 5.0];
        getrs(2, 1, &a, 2, &ipiv, &mut b, 2).unwrap();
        assert!((b[0] - 0.8).abs() < 1e-15);
        assert!((b[1] - 1.4).abs() < 1e-15);
    }

    #[test]
    fn test_getrf_rectangular() {
        let mut a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut ipiv = [0; 2];
        assert!(getrf(3, 2, &mut a, 3, &mut ipiv).is_ok());
        assert_eq!(ipiv[0], 2);
    }
}
