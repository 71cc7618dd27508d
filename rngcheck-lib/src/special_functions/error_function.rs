//! The error function and its complement.
//!
//! Both use two branches: a Taylor series for `|x| < 2.2` and a continued fraction otherwise.
//! Each function evaluates only one of the branches itself and takes the complement of the other
//! function for the rest, so no branch has to fight cancellation.

use std::f64::consts::FRAC_2_SQRT_PI;

/// Relative error targeted by both expansions.
const REL_ERROR: f64 = 1e-12;
/// Where the series hands over to the continued fraction.
const SWITCH: f64 = 2.2;
/// Above this value `erfc` is smaller than the smallest subnormal `f64`.
const ERFC_ZERO: f64 = 27.3;
const MAX_ITERATIONS: usize = 10_000;

/// The [error function](https://en.wikipedia.org/wiki/Error_function).
pub fn erf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    // erf is odd, the series below needs a positive sum
    if x < 0.0 {
        return -erf(-x);
    }
    if x > SWITCH {
        return 1.0 - erfc(x);
    }
    if x == 0.0 {
        return 0.0;
    }

    let x_sqr = x * x;
    let mut sum = x;
    let mut term = x;
    let mut j = 1.0;

    for _ in 0..MAX_ITERATIONS {
        term *= x_sqr / j;
        sum -= term / (2.0 * j + 1.0);
        j += 1.0;
        term *= x_sqr / j;
        sum += term / (2.0 * j + 1.0);
        j += 1.0;

        if term / sum <= REL_ERROR {
            break;
        }
    }

    FRAC_2_SQRT_PI * sum
}

/// The complementary error function `erfc(x) = 1 - erf(x)`.
pub fn erfc(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x.abs() < SWITCH {
        return 1.0 - erf(x);
    }
    if x < 0.0 {
        return 2.0 - erfc(-x);
    }
    if x > ERFC_ZERO {
        return 0.0;
    }

    // Laplace continued fraction, evaluated through its convergents b/d
    let mut a = 1.0;
    let mut b = x;
    let mut c = x;
    let mut d = x * x + 0.5;
    let mut q2 = b / d;
    let mut n = 1.0;

    for _ in 0..MAX_ITERATIONS {
        let t = a * n + b * x;
        a = b;
        b = t;
        let t = c * n + d * x;
        c = d;
        d = t;
        n += 0.5;

        let q1 = q2;
        q2 = b / d;
        if ((q1 - q2) / q2).abs() <= REL_ERROR {
            break;
        }
    }

    0.5 * FRAC_2_SQRT_PI * f64::exp(-x * x) * q2
}
