//! Discrete distributions.
//!
//! Mass functions return 0 for non-integral arguments. CDFs accept any real
//! argument and are right-continuous step functions. Quantiles return the
//! smallest support point `k` with `cdf(k) >= p`.

use super::quantile_probability;
use crate::special::{beta_inc, gamma_q, ln_choose, ln_factorial, std_normal_quantile};
use crate::{count, probability, RandomError, RandomResult};

/// Smallest `k` in `[lower, upper]` with `cdf(k) >= p`, searched outward
/// from `guess`.
fn discrete_quantile(p: f64, guess: f64, lower: f64, upper: f64, cdf: impl Fn(f64) -> f64) -> f64 {
    let mut k = if guess.is_finite() {
        guess.floor().clamp(lower, upper)
    } else {
        lower
    };
    while k < upper && cdf(k) < p {
        k += 1.0;
    }
    while k > lower && cdf(k - 1.0) >= p {
        k -= 1.0;
    }
    k
}

fn is_whole(x: f64) -> bool {
    x.is_finite() && x.fract() == 0.0
}

// ============================================================
// Poisson
// ============================================================

fn poisson_mean(lambda: f64) -> RandomResult<f64> {
    if lambda.is_finite() && lambda >= 0.0 {
        Ok(lambda)
    } else {
        Err(RandomError::InvalidParameterValue {
            name: "lambda",
            value: lambda,
        })
    }
}

/// Poisson mass function.
pub fn poisson_pmf(k: f64, lambda: f64) -> RandomResult<f64> {
    let lambda = poisson_mean(lambda)?;
    if !is_whole(k) || k < 0.0 {
        return Ok(0.0);
    }
    if lambda == 0.0 {
        return Ok(if k == 0.0 { 1.0 } else { 0.0 });
    }
    Ok((k * lambda.ln() - lambda - ln_factorial(k)).exp())
}

/// Poisson CDF.
pub fn poisson_cdf(x: f64, lambda: f64) -> RandomResult<f64> {
    let lambda = poisson_mean(lambda)?;
    if x < 0.0 {
        return Ok(0.0);
    }
    if lambda == 0.0 || x.is_infinite() {
        return Ok(1.0);
    }
    Ok(gamma_q(x.floor() + 1.0, lambda))
}

/// Poisson quantile.
pub fn poisson_quantile(p: f64, lambda: f64) -> RandomResult<f64> {
    let lambda = poisson_mean(lambda)?;
    let Some(p) = quantile_probability(p) else {
        return Ok(f64::NAN);
    };
    if lambda == 0.0 {
        return Ok(0.0);
    }
    if p == 1.0 {
        return Ok(f64::INFINITY);
    }
    let guess = lambda + lambda.sqrt() * std_normal_quantile(p);
    Ok(discrete_quantile(p, guess, 0.0, f64::INFINITY, |k| {
        gamma_q(k + 1.0, lambda)
    }))
}

// ============================================================
// Binomial
// ============================================================

fn binomial_cdf_unchecked(k: f64, n: f64, p: f64) -> f64 {
    if k < 0.0 {
        0.0
    } else if k >= n {
        1.0
    } else {
        let k = k.floor();
        beta_inc(n - k, k + 1.0, 1.0 - p)
    }
}

/// Binomial mass function for `n` trials with success probability `p`.
pub fn binomial_pmf(k: f64, n: f64, p: f64) -> RandomResult<f64> {
    let n = count("n", n)? as f64;
    let p = probability("p", p)?;
    if !is_whole(k) || k < 0.0 || k > n {
        return Ok(0.0);
    }
    if p == 0.0 {
        return Ok(if k == 0.0 { 1.0 } else { 0.0 });
    }
    if p == 1.0 {
        return Ok(if k == n { 1.0 } else { 0.0 });
    }
    Ok((ln_choose(n, k) + k * p.ln() + (n - k) * (-p).ln_1p()).exp())
}

/// Binomial CDF.
pub fn binomial_cdf(x: f64, n: f64, p: f64) -> RandomResult<f64> {
    let n = count("n", n)? as f64;
    let p = probability("p", p)?;
    Ok(binomial_cdf_unchecked(x, n, p))
}

/// Binomial quantile.
pub fn binomial_quantile(q: f64, n: f64, p: f64) -> RandomResult<f64> {
    let n = count("n", n)? as f64;
    let p = probability("p", p)?;
    let Some(q) = quantile_probability(q) else {
        return Ok(f64::NAN);
    };
    let guess = n * p + (n * p * (1.0 - p)).sqrt() * std_normal_quantile(q);
    Ok(discrete_quantile(q, guess, 0.0, n, |k| {
        binomial_cdf_unchecked(k, n, p)
    }))
}

// ============================================================
// Geometric
// ============================================================

fn geometric_probability(p: f64) -> RandomResult<f64> {
    if p > 0.0 && p <= 1.0 {
        Ok(p)
    } else {
        Err(RandomError::InvalidParameterValue {
            name: "p",
            value: p,
        })
    }
}

fn geometric_cdf_unchecked(k: f64, p: f64) -> f64 {
    if k < 1.0 {
        0.0
    } else if p == 1.0 {
        1.0
    } else {
        -(k.floor() * (-p).ln_1p()).exp_m1()
    }
}

/// Geometric mass function: probability that the first success happens on
/// trial `k` (`k >= 1`).
pub fn geometric_pmf(k: f64, p: f64) -> RandomResult<f64> {
    let p = geometric_probability(p)?;
    if !is_whole(k) || k < 1.0 {
        return Ok(0.0);
    }
    if p == 1.0 {
        return Ok(if k == 1.0 { 1.0 } else { 0.0 });
    }
    Ok(p * ((k - 1.0) * (-p).ln_1p()).exp())
}

/// Geometric CDF.
pub fn geometric_cdf(x: f64, p: f64) -> RandomResult<f64> {
    let p = geometric_probability(p)?;
    Ok(geometric_cdf_unchecked(x, p))
}

/// Geometric quantile.
pub fn geometric_quantile(q: f64, p: f64) -> RandomResult<f64> {
    let p = geometric_probability(p)?;
    let Some(q) = quantile_probability(q) else {
        return Ok(f64::NAN);
    };
    if p == 1.0 {
        return Ok(1.0);
    }
    if q == 1.0 {
        return Ok(f64::INFINITY);
    }
    let guess = ((-q).ln_1p() / (-p).ln_1p()).ceil();
    Ok(discrete_quantile(q, guess, 1.0, f64::INFINITY, |k| {
        geometric_cdf_unchecked(k, p)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol * b.abs().max(1e-300)
    }

    #[test]
    fn test_poisson_pmf_sums_to_cdf() {
        let lambda = 3.7;
        let mut acc = 0.0;
        for k in 0..15 {
            acc += poisson_pmf(k as f64, lambda).unwrap();
            assert!(close(poisson_cdf(k as f64, lambda).unwrap(), acc, 1e-12), "k = {k}");
        }
        assert_eq!(poisson_pmf(1.5, lambda), Ok(0.0));
        assert_eq!(poisson_cdf(-0.5, lambda), Ok(0.0));
    }

    #[test]
    fn test_binomial_pmf_sums_to_cdf() {
        let (n, p) = (20.0, 0.35);
        let mut acc = 0.0;
        for k in 0..=20 {
            acc += binomial_pmf(k as f64, n, p).unwrap();
            assert!(close(binomial_cdf(k as f64, n, p).unwrap(), acc, 1e-11), "k = {k}");
        }
        assert!(close(acc, 1.0, 1e-12));
    }

    #[test]
    fn test_geometric_values() {
        assert_eq!(geometric_pmf(1.0, 0.25), Ok(0.25));
        assert!(close(geometric_pmf(3.0, 0.25).unwrap(), 0.140_625, 1e-14));
        assert!(close(geometric_cdf(2.0, 0.25).unwrap(), 0.4375, 1e-14));
        assert_eq!(geometric_pmf(0.0, 0.25), Ok(0.0));
    }

    #[test]
    fn test_quantiles_are_smallest_support_points() {
        for &p in &[0.0, 0.01, 0.3, 0.5, 0.8, 0.999] {
            let k = poisson_quantile(p, 12.0).unwrap();
            assert!(poisson_cdf(k, 12.0).unwrap() >= p);
            if k > 0.0 {
                assert!(poisson_cdf(k - 1.0, 12.0).unwrap() < p);
            }

            let k = binomial_quantile(p, 40.0, 0.2).unwrap();
            assert!(binomial_cdf(k, 40.0, 0.2).unwrap() >= p);
            if k > 0.0 {
                assert!(binomial_cdf(k - 1.0, 40.0, 0.2).unwrap() < p);
            }

            let k = geometric_quantile(p, 0.1).unwrap();
            assert!(k >= 1.0);
            assert!(geometric_cdf(k, 0.1).unwrap() >= p);
            if k > 1.0 {
                assert!(geometric_cdf(k - 1.0, 0.1).unwrap() < p);
            }
        }
    }

    #[test]
    fn test_degenerate_parameters() {
        assert_eq!(poisson_pmf(0.0, 0.0), Ok(1.0));
        assert_eq!(poisson_quantile(0.7, 0.0), Ok(0.0));
        assert_eq!(binomial_pmf(5.0, 5.0, 1.0), Ok(1.0));
        assert_eq!(binomial_quantile(1.0, 5.0, 0.5), Ok(5.0));
        assert_eq!(poisson_quantile(1.0, 2.0), Ok(f64::INFINITY));
        assert!(poisson_quantile(-0.2, 2.0).unwrap().is_nan());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(poisson_pmf(1.0, -1.0).is_err());
        assert!(binomial_cdf(1.0, -3.0, 0.5).is_err());
        assert!(binomial_pmf(1.0, 3.0, 1.2).is_err());
        assert!(geometric_cdf(1.0, 0.0).is_err());
    }
}
