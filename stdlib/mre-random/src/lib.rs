//! MRE random number generation and distributions.
//!
//! This crate provides the pseudo-random pipeline of the modelling runtime:
//!
//! - [`mt`] - the MT19937-64 generator, seeded from a 256-bit seed plus a
//!   32-bit stream index
//! - [`stream`] - per-thread generator streams derived from a process-wide
//!   registry seed
//! - [`deviates`] - uniform, normal, gamma, Poisson, binomial and other
//!   deviates built on the uniform-bit source
//! - [`special`] - log-gamma, incomplete gamma/beta and error functions
//! - [`distributions`] - PDF/PMF, CDF and quantile functions
//!
//! # Example
//!
//! ```
//! use mre_random::{deviates, MersenneTwister64, Seed};
//!
//! let mut rng = MersenneTwister64::new(Seed::new([1, 2, 3, 4]), 0);
//! let x = deviates::normal_deviate(&mut rng, 0.0, 1.0).unwrap();
//! assert!(x.is_finite());
//! ```
//!
//! # Threading
//!
//! A generator is owned by a single thread; sharing one across threads is
//! not supported. [`stream::with_thread_rng`] hands every thread its own
//! stream so parallel workers never contend.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod deviates;
pub mod distributions;
pub mod mt;
pub mod special;
pub mod stream;

pub use mt::{MersenneTwister64, Seed};
pub use stream::{registry_seed, reseed_thread_rng, set_registry_seed, with_thread_rng};

use thiserror::Error;

/// Errors raised by deviate and distribution functions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RandomError {
    /// A distribution parameter lies outside its domain.
    #[error("invalid value {value} for parameter `{name}`")]
    InvalidParameterValue {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
}

/// Result type for deviate and distribution functions.
pub type RandomResult<T> = Result<T, RandomError>;

/// Require a finite, strictly positive parameter (scale, rate, shape).
pub(crate) fn positive(name: &'static str, value: f64) -> RandomResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(RandomError::InvalidParameterValue { name, value })
    }
}

/// Require a finite parameter (location).
pub(crate) fn finite(name: &'static str, value: f64) -> RandomResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RandomError::InvalidParameterValue { name, value })
    }
}

/// Require a probability in `[0, 1]`.
pub(crate) fn probability(name: &'static str, value: f64) -> RandomResult<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(RandomError::InvalidParameterValue { name, value })
    }
}

/// Require a non-negative whole number stored as `f64` (trial counts).
pub(crate) fn count(name: &'static str, value: f64) -> RandomResult<u64> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value < 9.007_199_254_740_992e15 {
        Ok(value as u64)
    } else {
        Err(RandomError::InvalidParameterValue { name, value })
    }
}
