//! Special functions needed to turn test statistics into p-values.
//!
//! All functions are pure and stateless. The gamma family follows the Cephes dual-branch
//! algorithms and reports overflow, underflow and non-convergence as [MathError] instead of
//! silently returning `NaN` or an infinite value. A p-value computed from an `Err` must not be
//! trusted.

mod error_function;
mod gamma;

pub use error_function::{erf, erfc};
pub use gamma::{igam, igamc, ln_gamma};

use std::f64::consts::{LN_2, SQRT_2};
use thiserror::Error;

/// Failures of the special functions. The string names the function that failed.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum MathError {
    /// The result would not fit into an `f64`, e.g. the gamma function at a pole.
    #[error("Overflow in {0}.")]
    Overflow(&'static str),
    /// The result is too small to be represented meaningfully.
    #[error("Underflow in {0}.")]
    Underflow(&'static str),
    /// An iterative evaluation hit its iteration cap.
    #[error("{0} did not converge.")]
    NoConvergence(&'static str),
    /// An argument was `NaN`.
    #[error("Argument of {0} is not a number.")]
    Domain(&'static str),
}

/// Evaluates the polynomial `coef[0]·x^N + coef[1]·x^(N-1) + ... + coef[N]`, with
/// `N = coef.len() - 1`.
///
/// An empty coefficient list evaluates to `0`.
pub fn polevl(x: f64, coef: &[f64]) -> f64 {
    match coef.split_first() {
        Some((first, rest)) => rest.iter().fold(*first, |ans, c| ans * x + c),
        None => 0.0,
    }
}

/// Evaluates the polynomial `x^N + coef[0]·x^(N-1) + ... + coef[N-1]` with `N = coef.len()`,
/// i.e. like [polevl] with an implied leading coefficient of 1.
pub fn p1evl(x: f64, coef: &[f64]) -> f64 {
    coef.iter().fold(1.0, |ans, c| ans * x + c)
}

/// The cumulative distribution function of the standard normal distribution.
pub fn normal(x: f64) -> f64 {
    if x > 0.0 {
        0.5 * (1.0 + erf(x / SQRT_2))
    } else {
        0.5 * (1.0 - erf(-x / SQRT_2))
    }
}

/// Probability that an `m`-bit all-ones template occurs exactly `u` times (overlapping) in a block,
/// using the compound Poisson approximation with parameter `eta`.
///
/// `Pr(0, η) = e^(-η)` and for `u ≥ 1`:
/// `Pr(u, η) = Σ_{l=1..u} e^(-η) 2^(-u) η^l / l! · C(u - 1, l - 1)`.
pub fn poisson_bin_probability(u: usize, eta: f64) -> Result<f64, MathError> {
    if eta.is_nan() {
        return Err(MathError::Domain("poisson_bin_probability"));
    }
    if u == 0 {
        return Ok(f64::exp(-eta));
    }

    let u = u as f64;
    let mut sum = 0.0;
    for l in 1..=(u as usize) {
        let l = l as f64;
        let exponent = -eta - u * LN_2 + l * eta.ln() - ln_gamma(l + 1.0)? + ln_gamma(u)?
            - ln_gamma(l)?
            - ln_gamma(u - l + 1.0)?;
        sum += exponent.exp();
    }

    Ok(sum)
}
