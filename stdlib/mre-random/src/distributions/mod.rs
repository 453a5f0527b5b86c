//! Probability distribution functions
//!
//! Density (or mass), cumulative distribution and quantile functions for
//! the continuous and discrete families the runtime supports.
//!
//! | Family       | Parameters              | Support       |
//! |--------------|-------------------------|---------------|
//! | uniform      | low < high              | [low, high]   |
//! | normal       | mean, sigma > 0         | ℝ             |
//! | log-normal   | mu, sigma > 0           | (0, ∞)        |
//! | gamma        | k > 0, theta > 0        | (0, ∞)        |
//! | chi-squared  | k > 0                   | (0, ∞)        |
//! | exponential  | lambda > 0              | [0, ∞)        |
//! | Weibull      | shape, scale > 0, delay | [delay, ∞)    |
//! | Rayleigh     | sigma > 0               | [0, ∞)        |
//! | Cauchy       | x0, gamma > 0           | ℝ             |
//! | Poisson      | lambda ≥ 0              | 0, 1, 2, ...  |
//! | binomial     | n ≥ 0 whole, 0 ≤ p ≤ 1  | 0..=n         |
//! | geometric    | 0 < p ≤ 1               | 1, 2, 3, ...  |
//!
//! Invalid parameters yield [`RandomError`](crate::RandomError). A quantile
//! probability outside `[0, 1]` is not an error: the quantile is NaN.

mod continuous;
mod discrete;

pub use continuous::*;
pub use discrete::*;

/// Validate a quantile probability; `None` means the quantile is NaN.
fn quantile_probability(p: f64) -> Option<f64> {
    (0.0..=1.0).contains(&p).then_some(p)
}
