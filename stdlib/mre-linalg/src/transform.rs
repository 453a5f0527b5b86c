//! Discrete transforms
//!
//! - [`fft`] / [`ifft`] - discrete Fourier transform, radix-2 for power-of-two
//!   lengths and a tabulated direct DFT otherwise
//! - [`dct`] / [`idct`] - orthonormal DCT-II and its inverse DCT-III
//! - [`hilbert`] - analytic signal via the frequency-domain Hilbert transform
//!
//! All functions work on a single vector; the matrix kernel applies them
//! column by column and then row by row for 2-D data.

use std::f64::consts::PI;

use num_complex::Complex64;
use tracing::trace;

// ============================================================
// Fourier
// ============================================================

/// Forward DFT: `X_k = sum_n x_n exp(-2 pi i k n / N)`.
#[must_use]
pub fn fft(x: &[Complex64]) -> Vec<Complex64> {
    transform(x, -1.0)
}

/// Inverse DFT, scaled by `1/N` so that `ifft(fft(x)) == x`.
#[must_use]
pub fn ifft(x: &[Complex64]) -> Vec<Complex64> {
    let n = x.len();
    let mut out = transform(x, 1.0);
    if n > 0 {
        let k = 1.0 / n as f64;
        for v in &mut out {
            *v *= k;
        }
    }
    out
}

fn transform(x: &[Complex64], sign: f64) -> Vec<Complex64> {
    let n = x.len();
    if n <= 1 {
        return x.to_vec();
    }
    if n.is_power_of_two() {
        trace!(n, "radix-2 fft");
        radix2(x, sign)
    } else {
        trace!(n, "direct dft");
        direct(x, sign)
    }
}

fn radix2(x: &[Complex64], sign: f64) -> Vec<Complex64> {
    let n = x.len();
    let bits = n.trailing_zeros();
    let mut a: Vec<Complex64> = (0..n)
        .map(|i| x[i.reverse_bits() >> (usize::BITS - bits)])
        .collect();

    let mut len = 2;
    while len <= n {
        let angle = sign * 2.0 * PI / len as f64;
        let half = len / 2;
        let twiddles: Vec<Complex64> = (0..half)
            .map(|k| Complex64::from_polar(1.0, angle * k as f64))
            .collect();
        for start in (0..n).step_by(len) {
            for k in 0..half {
                let u = a[start + k];
                let t = a[start + k + half] * twiddles[k];
                a[start + k] = u + t;
                a[start + k + half] = u - t;
            }
        }
        len <<= 1;
    }
    a
}

fn direct(x: &[Complex64], sign: f64) -> Vec<Complex64> {
    let n = x.len();
    let table: Vec<Complex64> = (0..n)
        .map(|k| Complex64::from_polar(1.0, sign * 2.0 * PI * k as f64 / n as f64))
        .collect();
    (0..n)
        .map(|k| {
            x.iter()
                .enumerate()
                .map(|(j, &xj)| xj * table[(j * k) % n])
                .sum::<Complex64>()
        })
        .collect()
}

// ============================================================
// Cosine
// ============================================================

/// `cos(pi * m / (2N))` for `m` in `0..4N`.
fn cosine_table(n: usize) -> Vec<f64> {
    (0..4 * n)
        .map(|m| (PI * m as f64 / (2 * n) as f64).cos())
        .collect()
}

fn dct_scale(k: usize, n: usize) -> f64 {
    if k == 0 {
        (1.0 / n as f64).sqrt()
    } else {
        (2.0 / n as f64).sqrt()
    }
}

/// Orthonormal DCT-II.
#[must_use]
pub fn dct(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    if n == 0 {
        return Vec::new();
    }
    let table = cosine_table(n);
    (0..n)
        .map(|k| {
            let sum: f64 = x
                .iter()
                .enumerate()
                .map(|(j, &xj)| xj * table[((2 * j + 1) * k) % (4 * n)])
                .sum();
            dct_scale(k, n) * sum
        })
        .collect()
}

/// Orthonormal DCT-III, the inverse of [`dct`].
#[must_use]
pub fn idct(y: &[f64]) -> Vec<f64> {
    let n = y.len();
    if n == 0 {
        return Vec::new();
    }
    let table = cosine_table(n);
    (0..n)
        .map(|j| {
            y.iter()
                .enumerate()
                .map(|(k, &yk)| dct_scale(k, n) * yk * table[((2 * j + 1) * k) % (4 * n)])
                .sum::<f64>()
        })
        .collect()
}

// ============================================================
// Hilbert
// ============================================================

/// Analytic signal of `x`.
///
/// The real part is `x` itself; the imaginary part is the discrete Hilbert
/// transform, obtained by suppressing negative frequencies.
#[must_use]
pub fn hilbert(x: &[f64]) -> Vec<Complex64> {
    let n = x.len();
    if n == 0 {
        return Vec::new();
    }
    let spectrum = fft(&x.iter().map(|&v| Complex64::new(v, 0.0)).collect::<Vec<_>>());
    let weighted: Vec<Complex64> = spectrum
        .iter()
        .enumerate()
        .map(|(k, &c)| {
            let h = if k == 0 || (n % 2 == 0 && k == n / 2) {
                1.0
            } else if k < n.div_ceil(2) {
                2.0
            } else {
                0.0
            };
            c * h
        })
        .collect();
    ifft(&weighted)
        .into_iter()
        .zip(x)
        .map(|(z, &re)| Complex64::new(re, z.im))
        .collect()
}
