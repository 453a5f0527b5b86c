//! Matrix-valued deviates and aggregate statistics
//!
//! The scalar distribution surface lives in `mre-random`; this module fills
//! matrices from it and reduces mixed variant arguments. Aggregates unfold
//! their arguments recursively (tuples, sets, ranges and matrices) down to
//! scalar leaves; `None` contributes nothing.

use std::cmp::Ordering;

use mre_random::deviates;
use mre_random::{MersenneTwister64, RandomResult};

use crate::error::{invalid, ModelError, Result};
use crate::matrix::{Coefficient, Matrix, MatrixInteger, MatrixReal};
use crate::tuple::Tuple;
use crate::variant::{total_order, Variant};

// ============================================================
// Matrix deviates
// ============================================================

fn coefficient_count(rows: usize, cols: usize) -> Result<usize> {
    rows.checked_mul(cols)
        .ok_or(ModelError::InvalidMatrixDimensions { rows, cols })
}

fn fill_real(
    rows: usize,
    cols: usize,
    mut draw: impl FnMut() -> RandomResult<f64>,
) -> Result<MatrixReal> {
    let values = (0..coefficient_count(rows, cols)?)
        .map(|_| draw())
        .collect::<RandomResult<Vec<f64>>>()?;
    Matrix::build(rows, cols, &values)
}

fn fill_integer(
    rows: usize,
    cols: usize,
    mut draw: impl FnMut() -> RandomResult<u64>,
) -> Result<MatrixInteger> {
    let values = (0..coefficient_count(rows, cols)?)
        .map(|_| draw().map(|k| i64::try_from(k).unwrap_or(i64::MAX)))
        .collect::<RandomResult<Vec<i64>>>()?;
    Matrix::build(rows, cols, &values)
}

/// `rows x cols` uniform deviates on `[low, high]`.
///
/// # Errors
///
/// Returns [`crate::ModelError::InvalidParameterValue`] for invalid
/// parameters.
pub fn uniform_deviates(
    rng: &mut MersenneTwister64,
    rows: usize,
    cols: usize,
    low: f64,
    high: f64,
) -> Result<MatrixReal> {
    fill_real(rows, cols, || deviates::uniform_deviate(rng, low, high))
}

/// `rows x cols` normal deviates.
///
/// # Errors
///
/// Returns [`crate::ModelError::InvalidParameterValue`] for invalid
/// parameters.
pub fn normal_deviates(
    rng: &mut MersenneTwister64,
    rows: usize,
    cols: usize,
    mean: f64,
    sigma: f64,
) -> Result<MatrixReal> {
    fill_real(rows, cols, || deviates::normal_deviate(rng, mean, sigma))
}

/// `rows x cols` log-normal deviates.
///
/// # Errors
///
/// Returns [`crate::ModelError::InvalidParameterValue`] for invalid
/// parameters.
pub fn log_normal_deviates(
    rng: &mut MersenneTwister64,
    rows: usize,
    cols: usize,
    mu: f64,
    sigma: f64,
) -> Result<MatrixReal> {
    fill_real(rows, cols, || deviates::log_normal_deviate(rng, mu, sigma))
}

/// `rows x cols` gamma deviates with shape `k` and scale `theta`.
///
/// # Errors
///
/// Returns [`crate::ModelError::InvalidParameterValue`] for invalid
/// parameters.
pub fn gamma_deviates(
    rng: &mut MersenneTwister64,
    rows: usize,
    cols: usize,
    k: f64,
    theta: f64,
) -> Result<MatrixReal> {
    fill_real(rows, cols, || deviates::gamma_deviate(rng, k, theta))
}

/// `rows x cols` chi-squared deviates.
///
/// # Errors
///
/// Returns [`crate::ModelError::InvalidParameterValue`] for invalid
/// parameters.
pub fn chi_squared_deviates(
    rng: &mut MersenneTwister64,
    rows: usize,
    cols: usize,
    k: f64,
) -> Result<MatrixReal> {
    fill_real(rows, cols, || deviates::chi_squared_deviate(rng, k))
}

/// `rows x cols` exponential deviates.
///
/// # Errors
///
/// Returns [`crate::ModelError::InvalidParameterValue`] for invalid
/// parameters.
pub fn exponential_deviates(
    rng: &mut MersenneTwister64,
    rows: usize,
    cols: usize,
    lambda: f64,
) -> Result<MatrixReal> {
    fill_real(rows, cols, || deviates::exponential_deviate(rng, lambda))
}

/// `rows x cols` Weibull deviates.
///
/// # Errors
///
/// Returns [`crate::ModelError::InvalidParameterValue`] for invalid
/// parameters.
pub fn weibull_deviates(
    rng: &mut MersenneTwister64,
    rows: usize,
    cols: usize,
    shape: f64,
    scale: f64,
    delay: f64,
) -> Result<MatrixReal> {
    fill_real(rows, cols, || deviates::weibull_deviate(rng, shape, scale, delay))
}

/// `rows x cols` Rayleigh deviates.
///
/// # Errors
///
/// Returns [`crate::ModelError::InvalidParameterValue`] for invalid
/// parameters.
pub fn rayleigh_deviates(
    rng: &mut MersenneTwister64,
    rows: usize,
    cols: usize,
    sigma: f64,
) -> Result<MatrixReal> {
    fill_real(rows, cols, || deviates::rayleigh_deviate(rng, sigma))
}

/// `rows x cols` Cauchy-Lorentz deviates.
///
/// # Errors
///
/// Returns [`crate::ModelError::InvalidParameterValue`] for invalid
/// parameters.
pub fn cauchy_deviates(
    rng: &mut MersenneTwister64,
    rows: usize,
    cols: usize,
    x0: f64,
    gamma: f64,
) -> Result<MatrixReal> {
    fill_real(rows, cols, || deviates::cauchy_deviate(rng, x0, gamma))
}

/// `rows x cols` Poisson deviates.
///
/// # Errors
///
/// Returns [`crate::ModelError::InvalidParameterValue`] for invalid
/// parameters.
pub fn poisson_deviates(
    rng: &mut MersenneTwister64,
    rows: usize,
    cols: usize,
    lambda: f64,
) -> Result<MatrixInteger> {
    fill_integer(rows, cols, || deviates::poisson_deviate(rng, lambda))
}

/// `rows x cols` binomial deviates.
///
/// # Errors
///
/// Returns [`crate::ModelError::InvalidParameterValue`] for invalid
/// parameters.
pub fn binomial_deviates(
    rng: &mut MersenneTwister64,
    rows: usize,
    cols: usize,
    n: f64,
    p: f64,
) -> Result<MatrixInteger> {
    fill_integer(rows, cols, || deviates::binomial_deviate(rng, n, p))
}

/// `rows x cols` geometric deviates.
///
/// # Errors
///
/// Returns [`crate::ModelError::InvalidParameterValue`] for invalid
/// parameters.
pub fn geometric_deviates(
    rng: &mut MersenneTwister64,
    rows: usize,
    cols: usize,
    p: f64,
) -> Result<MatrixInteger> {
    fill_integer(rows, cols, || deviates::geometric_deviate(rng, p))
}

// ============================================================
// Aggregates
// ============================================================

fn collect_leaves(v: &Variant, out: &mut Vec<Variant>) -> Result<()> {
    match v {
        Variant::None => {}
        v if v.is_scalar() => out.push(v.clone()),
        container => {
            for e in container.elements()? {
                collect_leaves(&e, out)?;
            }
        }
    }
    Ok(())
}

fn leaves(values: &[Variant]) -> Result<Vec<Variant>> {
    let mut out = Vec::new();
    for v in values {
        collect_leaves(v, &mut out)?;
    }
    Ok(out)
}

fn real_leaves(values: &[Variant]) -> Result<Vec<f64>> {
    leaves(values)?.iter().map(Variant::to_real).collect()
}

/// Number of scalar leaves across all arguments.
///
/// # Errors
///
/// Fails if an argument contains an infinite universe set.
pub fn count(values: &[Variant]) -> Result<usize> {
    leaves(values).map(|l| l.len())
}

/// Sum of all scalar leaves; Integer 0 when there are none.
///
/// # Errors
///
/// Fails if an argument contains an infinite universe set.
pub fn sum(values: &[Variant]) -> Result<Variant> {
    leaves(values)?
        .iter()
        .try_fold(Variant::Integer(0), |acc, v| acc.try_add(v))
}

/// Arithmetic mean of all scalar leaves.
///
/// # Errors
///
/// Returns [`crate::ModelError::InvalidParameterValue`] when there are no
/// leaves.
pub fn avg(values: &[Variant]) -> Result<Variant> {
    let l = leaves(values)?;
    if l.is_empty() {
        return Err(invalid("average of no values"));
    }
    let total = l.iter().try_fold(Variant::Integer(0), |acc, v| acc.try_add(v))?;
    total.try_div(&Variant::Integer(l.len() as i64))
}

fn extremum(values: &[Variant], want: Ordering) -> Result<Variant> {
    let mut l = leaves(values)?.into_iter();
    let first = l.next().ok_or_else(|| invalid("extremum of no values"))?;
    l.try_fold(first, |best, v| {
        Ok(if v.relative_order(&best)? == want { v } else { best })
    })
}

/// Smallest scalar leaf.
///
/// # Errors
///
/// Fails when there are no leaves or a NaN is involved.
pub fn min(values: &[Variant]) -> Result<Variant> {
    extremum(values, Ordering::Less)
}

/// Largest scalar leaf.
///
/// # Errors
///
/// Fails when there are no leaves or a NaN is involved.
pub fn max(values: &[Variant]) -> Result<Variant> {
    extremum(values, Ordering::Greater)
}

/// Central moments `(mean, m2, m3, m4)` of real data.
fn moments(x: &[f64]) -> (f64, f64, f64, f64) {
    let n = x.len() as f64;
    let mean = x.iter().sum::<f64>() / n;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for &v in x {
        let d = v - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    (mean, m2 / n, m3 / n, m4 / n)
}

fn at_least(x: &[f64], n: usize, what: &str) -> Result<()> {
    if x.len() < n {
        return Err(invalid(format!(
            "{what} needs at least {n} values, got {}",
            x.len()
        )));
    }
    Ok(())
}

/// Population variance.
///
/// # Errors
///
/// Fails when there are no leaves or a leaf is not real.
pub fn variance(values: &[Variant]) -> Result<f64> {
    let x = real_leaves(values)?;
    at_least(&x, 1, "variance")?;
    Ok(moments(&x).1)
}

/// Population standard deviation.
///
/// # Errors
///
/// Same as [`variance`].
pub fn std_dev(values: &[Variant]) -> Result<f64> {
    variance(values).map(f64::sqrt)
}

/// Sample standard deviation (`n - 1` denominator).
///
/// # Errors
///
/// Fails for fewer than two leaves or a leaf that is not real.
pub fn sample_std_dev(values: &[Variant]) -> Result<f64> {
    let x = real_leaves(values)?;
    at_least(&x, 2, "sample standard deviation")?;
    let n = x.len() as f64;
    Ok((moments(&x).1 * n / (n - 1.0)).sqrt())
}

/// Median of real data; the mean of the two middle values for even counts.
///
/// # Errors
///
/// Fails when there are no leaves or a leaf is not real.
pub fn median(values: &[Variant]) -> Result<f64> {
    let mut x = real_leaves(values)?;
    at_least(&x, 1, "median")?;
    x.sort_by(f64::total_cmp);
    let mid = x.len() / 2;
    Ok(if x.len() % 2 == 0 {
        0.5 * (x[mid - 1] + x[mid])
    } else {
        x[mid]
    })
}

/// Most frequent scalar leaf; ties go to the smallest value.
///
/// # Errors
///
/// Returns [`crate::ModelError::InvalidParameterValue`] when there are no
/// leaves.
pub fn mode(values: &[Variant]) -> Result<Variant> {
    let mut l = leaves(values)?;
    l.sort_by(total_order);
    let mut best: Option<(&Variant, usize)> = None;
    let mut i = 0;
    while i < l.len() {
        let run = l[i..].iter().take_while(|v| **v == l[i]).count().max(1);
        if best.map_or(true, |(_, n)| run > n) {
            best = Some((&l[i], run));
        }
        i += run;
    }
    best.map(|(v, _)| v.clone())
        .ok_or_else(|| invalid("mode of no values"))
}

/// Adjusted Fisher-Pearson sample skewness.
///
/// # Errors
///
/// Fails for fewer than three leaves, zero variance or a leaf that is not
/// real.
pub fn sample_skew(values: &[Variant]) -> Result<f64> {
    let x = real_leaves(values)?;
    at_least(&x, 3, "sample skew")?;
    let (_, m2, m3, _) = moments(&x);
    if m2 == 0.0 {
        return Err(invalid("skew of data with zero variance"));
    }
    let n = x.len() as f64;
    Ok((n * (n - 1.0)).sqrt() / (n - 2.0) * m3 / m2.powf(1.5))
}

/// Excess kurtosis `m4 / m2^2 - 3`.
///
/// # Errors
///
/// Fails when there are no leaves, the variance is zero or a leaf is not
/// real.
pub fn excess_kurtosis(values: &[Variant]) -> Result<f64> {
    let x = real_leaves(values)?;
    at_least(&x, 1, "kurtosis")?;
    let (_, m2, _, m4) = moments(&x);
    if m2 == 0.0 {
        return Err(invalid("kurtosis of data with zero variance"));
    }
    Ok(m4 / (m2 * m2) - 3.0)
}

// ============================================================
// Histogram
// ============================================================

/// Bucket real data.
///
/// `first_bucket` and `last_bucket` are the centres of the outer buckets.
/// The result is the tuple `[counts, pdf, centres, below, above, lower,
/// upper]` where `counts` is an `n x 1` Integer matrix, `pdf` and `centres`
/// are `n x 1` Real matrices, `below`/`above` count values outside
/// `[lower, upper]` and `lower`/`upper` are the outer bucket edges. NaN
/// values are ignored.
///
/// # Errors
///
/// Fails for zero buckets, non-finite or decreasing bucket centres, or a
/// leaf that is not real.
pub fn histogram(
    first_bucket: f64,
    last_bucket: f64,
    number_buckets: usize,
    data: &[Variant],
) -> Result<Tuple> {
    if number_buckets == 0 {
        return Err(invalid("histogram needs at least one bucket"));
    }
    if !first_bucket.is_finite() || !last_bucket.is_finite() {
        return Err(invalid("histogram bucket centres must be finite"));
    }
    let n = number_buckets;
    let width = if n > 1 {
        (last_bucket - first_bucket) / (n - 1) as f64
    } else if last_bucket != first_bucket {
        (last_bucket - first_bucket).abs()
    } else {
        1.0
    };
    if width <= 0.0 {
        return Err(invalid(format!(
            "last bucket {last_bucket} is not above first bucket {first_bucket}"
        )));
    }
    let lower = first_bucket - width / 2.0;
    let upper = lower + width * n as f64;

    let mut counts = vec![0i64; n];
    let (mut below, mut above, mut total) = (0i64, 0i64, 0i64);
    for x in real_leaves(data)? {
        if x.is_nan() {
            continue;
        }
        total += 1;
        if x < lower {
            below += 1;
        } else if x > upper {
            above += 1;
        } else {
            let k = (((x - lower) / width).floor() as usize).min(n - 1);
            counts[k] += 1;
        }
    }

    let norm = if total > 0 { 1.0 / (total as f64 * width) } else { 0.0 };
    let pdf: Vec<f64> = counts.iter().map(|&c| c as f64 * norm).collect();
    let centres: Vec<f64> = (0..n).map(|k| first_bucket + width * k as f64).collect();
    Ok(Tuple::from_vec(vec![
        Matrix::build(n, 1, &counts)?.into(),
        Matrix::build(n, 1, &pdf)?.into(),
        Matrix::build(n, 1, &centres)?.into(),
        Variant::Integer(below),
        Variant::Integer(above),
        Variant::Real(lower),
        Variant::Real(upper),
    ]))
}

// ============================================================
// Sorting
// ============================================================

fn sort_matrix<T: Coefficient>(m: &Matrix<T>, descending: bool) -> Result<Variant> {
    let mut values: Vec<Variant> = m.iter().map(Coefficient::to_variant).collect();
    sort_values(&mut values, descending);
    let sorted = values
        .iter()
        .filter_map(T::from_variant)
        .collect::<Vec<T>>();
    Ok(T::wrap(Matrix::build(sorted.len(), 1, &sorted)?))
}

fn sort_values(values: &mut [Variant], descending: bool) {
    if descending {
        values.sort_by(|a, b| total_order(b, a));
    } else {
        values.sort_by(total_order);
    }
}

fn sort_with(v: &Variant, descending: bool) -> Result<Variant> {
    match v {
        Variant::MatrixBoolean(m) => sort_matrix(m, descending),
        Variant::MatrixInteger(m) => sort_matrix(m, descending),
        Variant::MatrixReal(m) => sort_matrix(m, descending),
        Variant::MatrixComplex(m) => sort_matrix(m, descending),
        Variant::Tuple(_) | Variant::Set(_) | Variant::Range(_) => {
            let mut values = v.elements()?;
            sort_values(&mut values, descending);
            Ok(Variant::Tuple(Tuple::from_vec(values)))
        }
        scalar => Ok(scalar.clone()),
    }
}

/// Sort ascending.
///
/// Tuples, sets and ranges sort into a tuple. Numbers come first (Booleans
/// as Integers), then tuples, then sets. A matrix flattens column-major into
/// an `N x 1` matrix of the same kind. Scalars and `None` return unchanged.
///
/// # Errors
///
/// Fails for an infinite universe set.
pub fn sort(v: &Variant) -> Result<Variant> {
    sort_with(v, false)
}

/// Sort descending; the exact reverse of [`sort`].
///
/// # Errors
///
/// Fails for an infinite universe set.
pub fn sort_descending(v: &Variant) -> Result<Variant> {
    sort_with(v, true)
}
