//! Level-3 multiply.

use crate::field::Field;
use crate::provider::Op;
use crate::{at, check_buffer, LinalgResult};

#[inline]
fn op_at<T: Field>(op: Op, a: &[T], i: usize, j: usize, ld: usize) -> T {
    match op {
        Op::NoTrans => a[at(i, j, ld)],
        Op::Trans => a[at(j, i, ld)],
        Op::ConjTrans => a[at(j, i, ld)].conj(),
    }
}

/// `C = alpha * op(A) * op(B) + beta * C` with `op(A)` `m x k` and `op(B)`
/// `k x n`. When `beta` is zero `C` is not read.
#[allow(clippy::too_many_arguments)]
pub(crate) fn gemm<T: Field>(
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
    let (ar, ac) = if op_a == Op::NoTrans { (m, k) } else { (k, m) };
    let (br, bc) = if op_b == Op::NoTrans { (k, n) } else { (n, k) };
    check_buffer(a, ar, ac, lda)?;
    check_buffer(b, br, bc, ldb)?;
    check_buffer(c, m, n, ldc)?;

    for j in 0..n {
        for i in 0..m {
            let mut sum = T::zero();
            for l in 0..k {
                sum += op_at(op_a, a, i, l, lda) * op_at(op_b, b, l, j, ldb);
            }
            let idx = at(i, j, ldc);
            c[idx] = if beta == T::zero() {
                alpha * sum
            } else {
                alpha * sum + beta * c[idx]
            };
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_gemm_plain() {
        // A = [1 3; 2 4], B = [5 7; 6 8]
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let mut c = [0.0; 4];
        gemm(Op::NoTrans, Op::NoTrans, 2, 2, 2, 1.0, &a, 2, &b, 2, 0.0, &mut c, 2).unwrap();
        assert_eq!(c, [23.0, 34.0, 31.0, 46.0]);
    }

    #[test]
    fn test_gemm_transposed_with_padding() {
        // A stored 3x2 with ld 4, op(A) = A^T is 2x3.
        let a = [1.0, 2.0, 3.0, 0.0, 4.0, 5.0, 6.0, 0.0];
        let b = [1.0, 1.0, 1.0];
        let mut c = [10.0, 10.0];
        gemm(Op::Trans, Op::NoTrans, 2, 1, 3, 1.0, &a, 4, &b, 3, 1.0, &mut c, 2).unwrap();
        assert_eq!(c, [16.0, 25.0]);
    }

    #[test]
    fn test_gemm_conj_trans() {
        let i = Complex64::new(0.0, 1.0);
        let a = [i];
        let mut c = [Complex64::new(0.0, 0.0)];
        gemm(
            Op::ConjTrans,
            Op::NoTrans,
            1,
            1,
            1,
            Complex64::new(1.0, 0.0),
            &a,
            1,
            &a,
            1,
            Complex64::new(0.0, 0.0),
            &mut c,
            1,
        )
        .unwrap();
        assert_eq!(c[0], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_gemm_rejects_short_buffer() {
        let a = [1.0; 3];
        let mut c = [0.0; 4];
        assert!(gemm(Op::NoTrans, Op::NoTrans, 2, 2, 2, 1.0, &a, 2, &a, 2, 0.0, &mut c, 2).is_err());
    }
}
