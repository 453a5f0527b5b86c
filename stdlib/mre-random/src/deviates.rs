//! Random deviates
//!
//! Every deviate draws from a [`MersenneTwister64`] and validates its
//! parameters first; an out-of-domain parameter is reported as
//! [`RandomError::InvalidParameterValue`](crate::RandomError) before any bits
//! are consumed.

use std::f64::consts::PI;

use crate::mt::MersenneTwister64;
use crate::special::ln_factorial;
use crate::{count, finite, positive, probability, RandomResult};

/// Below this mean, Poisson deviates use Knuth's multiplication method.
const POISSON_SMALL_MEAN: f64 = 30.0;
/// Below this value of `n * min(p, 1 - p)`, binomial deviates use inversion.
const BINOMIAL_SMALL_MEAN: f64 = 10.0;

// ============================================================
// Uniform
// ============================================================

/// Uniform deviate on `[low, high]`.
pub fn uniform_deviate(rng: &mut MersenneTwister64, low: f64, high: f64) -> RandomResult<f64> {
    let low = finite("low", low)?;
    let high = finite("high", high)?;
    if high < low {
        return Err(crate::RandomError::InvalidParameterValue {
            name: "high",
            value: high,
        });
    }
    Ok(low + (high - low) * rng.uniform_inclusive())
}

// ============================================================
// Normal family
// ============================================================

/// Standard normal deviate by Marsaglia's polar method.
///
/// The method yields two independent deviates per accepted pair; the second
/// is cached on the generator and returned by the next call.
pub fn standard_normal(rng: &mut MersenneTwister64) -> f64 {
    if let Some(spare) = rng.spare_normal.take() {
        return spare;
    }
    loop {
        let u = 2.0 * rng.uniform_exclusive() - 1.0;
        let v = 2.0 * rng.uniform_exclusive() - 1.0;
        let s = u * u + v * v;
        if s > 0.0 && s < 1.0 {
            let factor = (-2.0 * s.ln() / s).sqrt();
            rng.spare_normal = Some(v * factor);
            return u * factor;
        }
    }
}

/// Normal deviate with mean `mean` and standard deviation `sigma`.
pub fn normal_deviate(rng: &mut MersenneTwister64, mean: f64, sigma: f64) -> RandomResult<f64> {
    let mean = finite("mean", mean)?;
    let sigma = positive("sigma", sigma)?;
    Ok(mean + sigma * standard_normal(rng))
}

/// Log-normal deviate: `exp(N(mu, sigma))`.
pub fn log_normal_deviate(rng: &mut MersenneTwister64, mu: f64, sigma: f64) -> RandomResult<f64> {
    Ok(normal_deviate(rng, mu, sigma)?.exp())
}

// ============================================================
// Gamma family
// ============================================================

/// Unit-scale gamma deviate, Marsaglia-Tsang squeeze.
fn standard_gamma(rng: &mut MersenneTwister64, shape: f64) -> f64 {
    if shape < 1.0 {
        // Boost: Γ(k) = Γ(k + 1) · U^(1/k)
        let u = rng.uniform_exclusive();
        return standard_gamma(rng, shape + 1.0) * u.powf(1.0 / shape);
    }
    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();
    loop {
        let x = standard_normal(rng);
        let v = 1.0 + c * x;
        if v <= 0.0 {
            continue;
        }
        let v = v * v * v;
        let u = rng.uniform_exclusive();
        let x2 = x * x;
        if u < 1.0 - 0.0331 * x2 * x2 {
            return d * v;
        }
        if u.ln() < 0.5 * x2 + d * (1.0 - v + v.ln()) {
            return d * v;
        }
    }
}

/// Gamma deviate with shape `k` and scale `theta`.
pub fn gamma_deviate(rng: &mut MersenneTwister64, k: f64, theta: f64) -> RandomResult<f64> {
    let k = positive("k", k)?;
    let theta = positive("theta", theta)?;
    Ok(standard_gamma(rng, k) * theta)
}

/// Chi-squared deviate with `k` degrees of freedom.
pub fn chi_squared_deviate(rng: &mut MersenneTwister64, k: f64) -> RandomResult<f64> {
    let k = positive("k", k)?;
    Ok(standard_gamma(rng, k / 2.0) * 2.0)
}

/// Exponential deviate with rate `lambda`.
pub fn exponential_deviate(rng: &mut MersenneTwister64, lambda: f64) -> RandomResult<f64> {
    let lambda = positive("lambda", lambda)?;
    Ok(-rng.uniform_exclusive().ln() / lambda)
}

/// Weibull deviate with `shape`, `scale` and location `delay`.
pub fn weibull_deviate(
    rng: &mut MersenneTwister64,
    shape: f64,
    scale: f64,
    delay: f64,
) -> RandomResult<f64> {
    let shape = positive("shape", shape)?;
    let scale = positive("scale", scale)?;
    let delay = finite("delay", delay)?;
    Ok(delay + scale * (-rng.uniform_exclusive().ln()).powf(1.0 / shape))
}

/// Rayleigh deviate with scale `sigma`.
pub fn rayleigh_deviate(rng: &mut MersenneTwister64, sigma: f64) -> RandomResult<f64> {
    let sigma = positive("sigma", sigma)?;
    Ok(sigma * (-2.0 * rng.uniform_exclusive().ln()).sqrt())
}

/// Cauchy deviate with location `x0` and scale `gamma`.
pub fn cauchy_deviate(rng: &mut MersenneTwister64, x0: f64, gamma: f64) -> RandomResult<f64> {
    let x0 = finite("x0", x0)?;
    let gamma = positive("gamma", gamma)?;
    Ok(x0 + gamma * (PI * (rng.uniform_exclusive() - 0.5)).tan())
}

// ============================================================
// Discrete
// ============================================================

/// Poisson deviate with mean `lambda`.
///
/// Knuth's product-of-uniforms method for small means, Hörmann's PTRS
/// transformed rejection otherwise.
pub fn poisson_deviate(rng: &mut MersenneTwister64, lambda: f64) -> RandomResult<u64> {
    if !(lambda.is_finite() && lambda >= 0.0) {
        return Err(crate::RandomError::InvalidParameterValue {
            name: "lambda",
            value: lambda,
        });
    }
    if lambda == 0.0 {
        return Ok(0);
    }
    if lambda < POISSON_SMALL_MEAN {
        return Ok(poisson_knuth(rng, lambda));
    }
    Ok(poisson_ptrs(rng, lambda))
}

fn poisson_knuth(rng: &mut MersenneTwister64, lambda: f64) -> u64 {
    let limit = (-lambda).exp();
    let mut k = 0;
    let mut product = rng.uniform_exclusive();
    while product > limit {
        k += 1;
        product *= rng.uniform_exclusive();
    }
    k
}

fn poisson_ptrs(rng: &mut MersenneTwister64, lambda: f64) -> u64 {
    let slam = lambda.sqrt();
    let loglam = lambda.ln();
    let b = 0.931 + 2.53 * slam;
    let a = -0.059 + 0.02483 * b;
    let inv_alpha = 1.1239 + 1.1328 / (b - 3.4);
    let vr = 0.9277 - 3.6224 / (b - 2.0);

    loop {
        let u = rng.uniform_exclusive() - 0.5;
        let v = rng.uniform_exclusive();
        let us = 0.5 - u.abs();
        let k = ((2.0 * a / us + b) * u + lambda + 0.43).floor();
        if us >= 0.07 && v <= vr {
            return k as u64;
        }
        if k < 0.0 || (us < 0.013 && v > us) {
            continue;
        }
        let lhs = v.ln() + inv_alpha.ln() - (a / (us * us) + b).ln();
        let rhs = -lambda + k * loglam - ln_factorial(k);
        if lhs <= rhs {
            return k as u64;
        }
    }
}

/// Binomial deviate: successes in `n` trials with success probability `p`.
///
/// Inversion for small expected counts, BTRS transformed rejection otherwise.
pub fn binomial_deviate(rng: &mut MersenneTwister64, n: f64, p: f64) -> RandomResult<u64> {
    let n = count("n", n)?;
    let p = probability("p", p)?;
    if n == 0 || p == 0.0 {
        return Ok(0);
    }
    if p == 1.0 {
        return Ok(n);
    }
    if p > 0.5 {
        return Ok(n - binomial_lower(rng, n, 1.0 - p));
    }
    Ok(binomial_lower(rng, n, p))
}

fn binomial_lower(rng: &mut MersenneTwister64, n: u64, p: f64) -> u64 {
    if (n as f64) * p < BINOMIAL_SMALL_MEAN {
        binomial_inversion(rng, n, p)
    } else {
        binomial_btrs(rng, n, p)
    }
}

fn binomial_inversion(rng: &mut MersenneTwister64, n: u64, p: f64) -> u64 {
    let nf = n as f64;
    let q = 1.0 - p;
    let q_n = (nf * q.ln()).exp();
    let np = nf * p;
    let bound = nf.min(np + 10.0 * (np * q + 1.0).sqrt());
    loop {
        let mut x = 0.0;
        let mut px = q_n;
        let mut u = rng.uniform_exclusive();
        let mut accepted = true;
        while u > px {
            x += 1.0;
            if x > bound {
                accepted = false;
                break;
            }
            u -= px;
            px *= (nf - x + 1.0) * p / (x * q);
        }
        if accepted {
            return x as u64;
        }
    }
}

fn binomial_btrs(rng: &mut MersenneTwister64, n: u64, p: f64) -> u64 {
    let nf = n as f64;
    let q = 1.0 - p;
    let spq = (nf * p * q).sqrt();
    let b = 1.15 + 2.53 * spq;
    let a = -0.0873 + 0.0248 * b + 0.01 * p;
    let c = nf * p + 0.5;
    let vr = 0.92 - 4.2 / b;
    let alpha = (2.83 + 5.1 / b) * spq;
    let lpq = (p / q).ln();
    let m = ((nf + 1.0) * p).floor();
    let h = ln_factorial(m) + ln_factorial(nf - m);

    loop {
        let u = rng.uniform_exclusive() - 0.5;
        let v = rng.uniform_exclusive();
        let us = 0.5 - u.abs();
        let k = ((2.0 * a / us + b) * u + c).floor();
        if k < 0.0 || k > nf {
            continue;
        }
        if us >= 0.07 && v <= vr {
            return k as u64;
        }
        let v = (v * alpha / (a / (us * us) + b)).ln();
        if v <= h - ln_factorial(k) - ln_factorial(nf - k) + (k - m) * lpq {
            return k as u64;
        }
    }
}

/// Geometric deviate: number of trials up to and including the first
/// success, so the result is always at least 1.
pub fn geometric_deviate(rng: &mut MersenneTwister64, p: f64) -> RandomResult<u64> {
    if !(p > 0.0 && p <= 1.0) {
        return Err(crate::RandomError::InvalidParameterValue {
            name: "p",
            value: p,
        });
    }
    if p == 1.0 {
        return Ok(1);
    }
    let trials = (rng.uniform_exclusive().ln() / (-p).ln_1p()).ceil();
    Ok((trials as u64).max(1))
}
