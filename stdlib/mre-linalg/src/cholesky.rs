//! Cholesky factorisation.

use tracing::debug;

use crate::field::Field;
use crate::provider::Uplo;
use crate::{at, check_buffer, LinalgError, LinalgResult};

/// Factor a Hermitian positive-definite matrix in place.
///
/// With [`Uplo::Lower`] the lower triangle is read and overwritten by `L`
/// where `A = L L^H`; with [`Uplo::Upper`] the upper triangle is read and
/// overwritten by `U` where `A = U^H U`. The other triangle is zeroed.
pub(crate) fn potrf<T: Field>(uplo: Uplo, n: usize, a: &mut [T], lda: usize) -> LinalgResult<()> {
    check_buffer(a, n, n, lda)?;

    for j in 0..n {
        let mut d = a[at(j, j, lda)].re();
        for k in 0..j {
            let l = match uplo {
                Uplo::Lower => a[at(j, k, lda)],
                Uplo::Upper => a[at(k, j, lda)],
            };
            d -= l.modulus_sqr();
        }
        if !(d > 0.0 && d.is_finite()) {
            debug!(index = j, minor = d, "cholesky rejected input");
            return Err(LinalgError::NotPositiveDefinite { index: j });
        }
        let djj = d.sqrt();
        a[at(j, j, lda)] = T::from_real(djj);

        for i in j + 1..n {
            match uplo {
                Uplo::Lower => {
                    let mut s = a[at(i, j, lda)];
                    for k in 0..j {
                        s -= a[at(i, k, lda)] * a[at(j, k, lda)].conj();
                    }
                    a[at(i, j, lda)] = s.scale(1.0 / djj);
                    a[at(j, i, lda)] = T::zero();
                }
                Uplo::Upper => {
                    let mut s = a[at(j, i, lda)];
                    for k in 0..j {
                        s -= a[at(k, j, lda)].conj() * a[at(k, i, lda)];
                    }
                    a[at(j, i, lda)] = s.scale(1.0 / djj);
                    a[at(i, j, lda)] = T::zero();
                }
            }
        }
    }
    Ok(())
}
