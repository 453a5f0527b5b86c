//! Continuous distributions.

use std::f64::consts::{PI, SQRT_2};

use super::quantile_probability;
use crate::special::{erfc, gamma_p, gamma_q, ln_gamma, std_normal_cdf, std_normal_quantile};
use crate::{finite, positive, RandomError, RandomResult};

const QUANTILE_MAX_ITER: usize = 200;

fn interval(low: f64, high: f64) -> RandomResult<(f64, f64)> {
    let low = finite("low", low)?;
    let high = finite("high", high)?;
    if high <= low {
        return Err(RandomError::InvalidParameterValue {
            name: "high",
            value: high,
        });
    }
    Ok((low, high))
}

// ============================================================
// Uniform
// ============================================================

/// Uniform density on `[low, high]`.
pub fn uniform_pdf(x: f64, low: f64, high: f64) -> RandomResult<f64> {
    let (low, high) = interval(low, high)?;
    Ok(if (low..=high).contains(&x) {
        1.0 / (high - low)
    } else {
        0.0
    })
}

/// Uniform CDF.
pub fn uniform_cdf(x: f64, low: f64, high: f64) -> RandomResult<f64> {
    let (low, high) = interval(low, high)?;
    Ok(((x - low) / (high - low)).clamp(0.0, 1.0))
}

/// Uniform quantile.
pub fn uniform_quantile(p: f64, low: f64, high: f64) -> RandomResult<f64> {
    let (low, high) = interval(low, high)?;
    Ok(quantile_probability(p).map_or(f64::NAN, |p| low + p * (high - low)))
}

// ============================================================
// Normal and log-normal
// ============================================================

/// Normal density.
pub fn normal_pdf(x: f64, mean: f64, sigma: f64) -> RandomResult<f64> {
    let mean = finite("mean", mean)?;
    let sigma = positive("sigma", sigma)?;
    let z = (x - mean) / sigma;
    Ok((-0.5 * z * z).exp() / (sigma * (2.0 * PI).sqrt()))
}

/// Normal CDF.
pub fn normal_cdf(x: f64, mean: f64, sigma: f64) -> RandomResult<f64> {
    let mean = finite("mean", mean)?;
    let sigma = positive("sigma", sigma)?;
    Ok(0.5 * erfc(-(x - mean) / (sigma * SQRT_2)))
}

/// Normal quantile.
pub fn normal_quantile(p: f64, mean: f64, sigma: f64) -> RandomResult<f64> {
    let mean = finite("mean", mean)?;
    let sigma = positive("sigma", sigma)?;
    Ok(quantile_probability(p).map_or(f64::NAN, |p| mean + sigma * std_normal_quantile(p)))
}

/// Log-normal density.
pub fn log_normal_pdf(x: f64, mu: f64, sigma: f64) -> RandomResult<f64> {
    let mu = finite("mu", mu)?;
    let sigma = positive("sigma", sigma)?;
    if x <= 0.0 {
        return Ok(0.0);
    }
    let z = (x.ln() - mu) / sigma;
    Ok((-0.5 * z * z).exp() / (x * sigma * (2.0 * PI).sqrt()))
}

/// Log-normal CDF.
pub fn log_normal_cdf(x: f64, mu: f64, sigma: f64) -> RandomResult<f64> {
    let mu = finite("mu", mu)?;
    let sigma = positive("sigma", sigma)?;
    if x <= 0.0 {
        return Ok(0.0);
    }
    Ok(std_normal_cdf((x.ln() - mu) / sigma))
}

/// Log-normal quantile.
pub fn log_normal_quantile(p: f64, mu: f64, sigma: f64) -> RandomResult<f64> {
    let mu = finite("mu", mu)?;
    let sigma = positive("sigma", sigma)?;
    Ok(quantile_probability(p).map_or(f64::NAN, |p| (mu + sigma * std_normal_quantile(p)).exp()))
}

// ============================================================
// Gamma and chi-squared
// ============================================================

/// Gamma density with shape `k` and scale `theta`.
pub fn gamma_pdf(x: f64, k: f64, theta: f64) -> RandomResult<f64> {
    let k = positive("k", k)?;
    let theta = positive("theta", theta)?;
    if x < 0.0 {
        return Ok(0.0);
    }
    if x == 0.0 {
        return Ok(match k.partial_cmp(&1.0) {
            Some(std::cmp::Ordering::Less) => f64::INFINITY,
            Some(std::cmp::Ordering::Equal) => 1.0 / theta,
            _ => 0.0,
        });
    }
    let y = x / theta;
    Ok(((k - 1.0) * y.ln() - y - ln_gamma(k)).exp() / theta)
}

/// Gamma CDF.
pub fn gamma_cdf(x: f64, k: f64, theta: f64) -> RandomResult<f64> {
    let k = positive("k", k)?;
    let theta = positive("theta", theta)?;
    Ok(gamma_p(k, x / theta))
}

/// Gamma quantile.
pub fn gamma_quantile(p: f64, k: f64, theta: f64) -> RandomResult<f64> {
    let k = positive("k", k)?;
    let theta = positive("theta", theta)?;
    Ok(quantile_probability(p).map_or(f64::NAN, |p| theta * standard_gamma_quantile(p, k)))
}

/// Invert `P(k, x) = p` by safeguarded Newton iteration.
///
/// The starting point is the Wilson-Hilferty approximation, falling back to
/// the small-`x` series `x ≈ (p Γ(k + 1))^(1/k)` when that is not positive.
/// Every step keeps a bracket `[lo, hi]` around the root and bisects when
/// Newton would leave it.
fn standard_gamma_quantile(p: f64, k: f64) -> f64 {
    if p == 0.0 {
        return 0.0;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    let z = std_normal_quantile(p);
    let t = 1.0 - 1.0 / (9.0 * k) + z / (3.0 * k.sqrt());
    let mut x = k * t * t * t;
    let small = ((p.ln() + ln_gamma(k + 1.0)) / k).exp();
    if !(x.is_finite() && x > 0.0) || (k < 1.0 && small < x) {
        x = small;
    }

    let ln_gamma_k = ln_gamma(k);
    let mut lo = 0.0_f64;
    let mut hi = f64::INFINITY;
    for _ in 0..QUANTILE_MAX_ITER {
        let residual = if p <= 0.5 {
            gamma_p(k, x) - p
        } else {
            (1.0 - p) - gamma_q(k, x)
        };
        if residual == 0.0 {
            break;
        }
        if residual < 0.0 {
            lo = x;
        } else {
            hi = x;
        }

        let density = ((k - 1.0) * x.ln() - x - ln_gamma_k).exp();
        let mut next = x - residual / density;
        if !(next.is_finite() && next > lo && next < hi) {
            next = if hi.is_finite() { 0.5 * (lo + hi) } else { 2.0 * x };
        }
        if (next - x).abs() <= 1e-15 * x {
            x = next;
            break;
        }
        x = next;
    }
    x
}

/// Chi-squared density with `k` degrees of freedom.
pub fn chi_squared_pdf(x: f64, k: f64) -> RandomResult<f64> {
    let k = positive("k", k)?;
    gamma_pdf(x, k / 2.0, 2.0)
}

/// Chi-squared CDF.
pub fn chi_squared_cdf(x: f64, k: f64) -> RandomResult<f64> {
    let k = positive("k", k)?;
    gamma_cdf(x, k / 2.0, 2.0)
}

/// Chi-squared quantile.
pub fn chi_squared_quantile(p: f64, k: f64) -> RandomResult<f64> {
    let k = positive("k", k)?;
    gamma_quantile(p, k / 2.0, 2.0)
}

// ============================================================
// Exponential, Weibull, Rayleigh
// ============================================================

/// Exponential density with rate `lambda`.
pub fn exponential_pdf(x: f64, lambda: f64) -> RandomResult<f64> {
    let lambda = positive("lambda", lambda)?;
    Ok(if x < 0.0 { 0.0 } else { lambda * (-lambda * x).exp() })
}

/// Exponential CDF.
pub fn exponential_cdf(x: f64, lambda: f64) -> RandomResult<f64> {
    let lambda = positive("lambda", lambda)?;
    Ok(if x <= 0.0 { 0.0 } else { -(-lambda * x).exp_m1() })
}

/// Exponential quantile.
pub fn exponential_quantile(p: f64, lambda: f64) -> RandomResult<f64> {
    let lambda = positive("lambda", lambda)?;
    Ok(quantile_probability(p).map_or(f64::NAN, |p| -(-p).ln_1p() / lambda))
}

fn weibull_params(shape: f64, scale: f64, delay: f64) -> RandomResult<(f64, f64, f64)> {
    Ok((
        positive("shape", shape)?,
        positive("scale", scale)?,
        finite("delay", delay)?,
    ))
}

/// Weibull density with `shape`, `scale` and location `delay`.
pub fn weibull_pdf(x: f64, shape: f64, scale: f64, delay: f64) -> RandomResult<f64> {
    let (shape, scale, delay) = weibull_params(shape, scale, delay)?;
    if x < delay {
        return Ok(0.0);
    }
    let z = (x - delay) / scale;
    Ok(shape / scale * z.powf(shape - 1.0) * (-z.powf(shape)).exp())
}

/// Weibull CDF.
pub fn weibull_cdf(x: f64, shape: f64, scale: f64, delay: f64) -> RandomResult<f64> {
    let (shape, scale, delay) = weibull_params(shape, scale, delay)?;
    if x <= delay {
        return Ok(0.0);
    }
    let z = (x - delay) / scale;
    Ok(-(-z.powf(shape)).exp_m1())
}

/// Weibull quantile.
pub fn weibull_quantile(p: f64, shape: f64, scale: f64, delay: f64) -> RandomResult<f64> {
    let (shape, scale, delay) = weibull_params(shape, scale, delay)?;
    Ok(quantile_probability(p)
        .map_or(f64::NAN, |p| delay + scale * (-(-p).ln_1p()).powf(1.0 / shape)))
}

/// Rayleigh density with scale `sigma`.
pub fn rayleigh_pdf(x: f64, sigma: f64) -> RandomResult<f64> {
    let sigma = positive("sigma", sigma)?;
    if x < 0.0 {
        return Ok(0.0);
    }
    let s2 = sigma * sigma;
    Ok(x / s2 * (-x * x / (2.0 * s2)).exp())
}

/// Rayleigh CDF.
pub fn rayleigh_cdf(x: f64, sigma: f64) -> RandomResult<f64> {
    let sigma = positive("sigma", sigma)?;
    if x <= 0.0 {
        return Ok(0.0);
    }
    Ok(-(-x * x / (2.0 * sigma * sigma)).exp_m1())
}

/// Rayleigh quantile.
pub fn rayleigh_quantile(p: f64, sigma: f64) -> RandomResult<f64> {
    let sigma = positive("sigma", sigma)?;
    Ok(quantile_probability(p).map_or(f64::NAN, |p| sigma * (-2.0 * (-p).ln_1p()).sqrt()))
}

// ============================================================
// Cauchy
// ============================================================

/// Cauchy density with location `x0` and scale `gamma`.
pub fn cauchy_pdf(x: f64, x0: f64, gamma: f64) -> RandomResult<f64> {
    let x0 = finite("x0", x0)?;
    let gamma = positive("gamma", gamma)?;
    let z = (x - x0) / gamma;
    Ok(1.0 / (PI * gamma * (1.0 + z * z)))
}

/// Cauchy CDF.
pub fn cauchy_cdf(x: f64, x0: f64, gamma: f64) -> RandomResult<f64> {
    let x0 = finite("x0", x0)?;
    let gamma = positive("gamma", gamma)?;
    Ok(0.5 + ((x - x0) / gamma).atan() / PI)
}

/// Cauchy quantile.
pub fn cauchy_quantile(p: f64, x0: f64, gamma: f64) -> RandomResult<f64> {
    let x0 = finite("x0", x0)?;
    let gamma = positive("gamma", gamma)?;
    Ok(quantile_probability(p).map_or(f64::NAN, |p| match p {
        p if p == 0.0 => f64::NEG_INFINITY,
        p if p == 1.0 => f64::INFINITY,
        p => x0 + gamma * (PI * (p - 0.5)).tan(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol * b.abs().max(1e-300)
    }

    #[test]
    fn test_normal_known_values() {
        assert!(close(normal_cdf(0.0, 0.0, 1.0).unwrap(), 0.5, 1e-15));
        assert!(close(normal_cdf(1.0, 0.0, 1.0).unwrap(), 0.841_344_746_068_542_9, 1e-12));
        assert!(close(
            normal_pdf(0.0, 0.0, 1.0).unwrap(),
            0.398_942_280_401_432_7,
            1e-14
        ));
        assert!(close(normal_quantile(0.975, 10.0, 2.0).unwrap(), 13.919_927_969_080_108, 1e-12));
    }

    #[test]
    fn test_quantile_out_of_range_is_nan() {
        assert!(normal_quantile(1.5, 0.0, 1.0).unwrap().is_nan());
        assert!(gamma_quantile(-0.1, 2.0, 1.0).unwrap().is_nan());
        assert!(exponential_quantile(f64::NAN, 1.0).unwrap().is_nan());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(normal_pdf(0.0, 0.0, 0.0).is_err());
        assert!(gamma_cdf(1.0, -1.0, 1.0).is_err());
        assert!(uniform_pdf(0.5, 1.0, 1.0).is_err());
        assert!(weibull_cdf(1.0, 1.0, 1.0, f64::NAN).is_err());
        // Parameters are validated even when the probability is out of range.
        assert!(rayleigh_quantile(2.0, -1.0).is_err());
    }

    #[test]
    fn test_gamma_quantile_inverts_cdf() {
        for &k in &[0.05, 0.5, 1.0, 2.5, 10.0, 150.0] {
            for &p in &[1e-8, 1e-3, 0.1, 0.5, 0.9, 0.999, 1.0 - 1e-9] {
                let x = gamma_quantile(p, k, 3.0).unwrap();
                let back = gamma_cdf(x, k, 3.0).unwrap();
                assert!(close(back, p, 1e-9), "k = {k}, p = {p}, back = {back}");
            }
        }
        assert_eq!(gamma_quantile(0.0, 2.0, 1.0), Ok(0.0));
        assert_eq!(gamma_quantile(1.0, 2.0, 1.0), Ok(f64::INFINITY));
    }

    #[test]
    fn test_exponential_is_gamma_one() {
        for &x in &[0.1, 1.0, 4.0] {
            assert!(close(
                exponential_cdf(x, 2.0).unwrap(),
                gamma_cdf(x, 1.0, 0.5).unwrap(),
                1e-13
            ));
        }
    }

    #[test]
    fn test_chi_squared_median() {
        // Median of chi-squared(2) is 2 ln 2.
        assert!(close(chi_squared_quantile(0.5, 2.0).unwrap(), 2.0 * 2f64.ln(), 1e-12));
    }

    #[test]
    fn test_closed_form_round_trips() {
        for &p in &[0.01, 0.25, 0.5, 0.75, 0.99] {
            let x = weibull_quantile(p, 1.5, 2.0, 1.0).unwrap();
            assert!(close(weibull_cdf(x, 1.5, 2.0, 1.0).unwrap(), p, 1e-12));
            let x = rayleigh_quantile(p, 0.7).unwrap();
            assert!(close(rayleigh_cdf(x, 0.7).unwrap(), p, 1e-12));
            let x = cauchy_quantile(p, 1.0, 2.0).unwrap();
            assert!(close(cauchy_cdf(x, 1.0, 2.0).unwrap(), p, 1e-12));
            let x = log_normal_quantile(p, 0.2, 0.4).unwrap();
            assert!(close(log_normal_cdf(x, 0.2, 0.4).unwrap(), p, 1e-12));
            let x = uniform_quantile(p, -2.0, 6.0).unwrap();
            assert!(close(uniform_cdf(x, -2.0, 6.0).unwrap(), p, 1e-12));
        }
    }

    #[test]
    fn test_supports() {
        assert_eq!(gamma_pdf(-1.0, 2.0, 1.0), Ok(0.0));
        assert_eq!(exponential_cdf(-1.0, 1.0), Ok(0.0));
        assert_eq!(weibull_pdf(0.5, 2.0, 1.0, 1.0), Ok(0.0));
        assert_eq!(log_normal_pdf(0.0, 0.0, 1.0), Ok(0.0));
        assert_eq!(uniform_pdf(3.0, 0.0, 2.0), Ok(0.0));
        assert_eq!(uniform_pdf(1.0, 0.0, 2.0), Ok(0.5));
    }
}
