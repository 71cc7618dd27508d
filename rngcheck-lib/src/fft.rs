//! Discrete Fourier transforms of arbitrary length, for the
//! [spectral DFT test](crate::tests::spectral_dft).
//!
//! The default backend is a recursive mixed-radix Cooley-Tukey transform: the length is split into
//! stages of radix 4, 2, 3 and 5, which have specialised butterflies, and any other prime factor,
//! which is handled by a direct DFT. Lengths with a prime factor above 61 are transformed with
//! Bluestein's algorithm on a power of two length, so that the runtime stays `O(n log n)` for
//! every input length.
//!
//! The [rustfft] crate can be used instead, see [FftBackend::RustFft].

use crate::internals::try_zeroed;
use crate::Error;
use rustfft::FftPlanner;
use std::f64::consts::PI;
use std::sync::{LazyLock, Mutex, PoisonError};
use strum::{Display, EnumString};

pub use rustfft::num_complex::Complex;

/// Prime factors above this limit are not transformed directly.
const DIRECT_DFT_LIMIT: usize = 61;

// Use a global planner to allow for caching if the test is run multiple times.
static FFT_PLANNER: LazyLock<Mutex<FftPlanner<f64>>> =
    LazyLock::new(|| Mutex::new(FftPlanner::new()));

/// The implementation used to compute a transform.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum FftBackend {
    /// The mixed-radix implementation of this module.
    #[default]
    MixedRadix,
    /// [rustfft], with plans cached over all calls.
    RustFft,
}

/// Computes the forward DFT `X_k = Σ x_j e^(-2πijk/n)` in place.
///
/// Fails with [Error::InsufficientMemory] if the working buffers cannot be allocated.
pub fn fft(buffer: &mut [Complex<f64>], backend: FftBackend) -> Result<(), Error> {
    if buffer.len() <= 1 {
        return Ok(());
    }

    match backend {
        FftBackend::MixedRadix => mixed_radix(buffer),
        FftBackend::RustFft => {
            let fft = {
                let mut planner = FFT_PLANNER.lock().unwrap_or_else(PoisonError::into_inner);
                planner.plan_fft_forward(buffer.len())
            };
            fft.process(buffer);
            Ok(())
        }
    }
}

/// The prime factors of `n` in ascending order. Empty for `n <= 1`.
pub fn factorize(mut n: usize) -> Vec<usize> {
    let mut factors = Vec::new();
    let mut p = 2;
    while p * p <= n {
        while n % p == 0 {
            factors.push(p);
            n /= p;
        }
        p += if p == 2 { 1 } else { 2 };
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}

/// The stages of the transform of length `n`: radix 4 as often as possible, then a single radix 2,
/// then the odd prime factors in ascending order (3 and 5 have their own butterflies).
pub(crate) fn radix_plan(n: usize) -> Vec<usize> {
    let primes = factorize(n);
    let twos = primes.iter().take_while(|&&p| p == 2).count();

    let mut plan = vec![4; twos / 2];
    if twos % 2 == 1 {
        plan.push(2);
    }
    plan.extend_from_slice(&primes[twos..]);
    plan
}

fn mixed_radix(buffer: &mut [Complex<f64>]) -> Result<(), Error> {
    let plan = radix_plan(buffer.len());
    let Some(&largest) = plan.iter().max() else {
        return Ok(());
    };
    if largest > DIRECT_DFT_LIMIT {
        return bluestein(buffer);
    }

    let twiddles = twiddles(buffer.len())?;
    let mut output = try_zeroed(buffer.len())?;
    // one butterfly input and, for the generic butterfly, its output
    let mut scratch = try_zeroed(2 * largest)?;
    cooley_tukey(buffer, 1, &plan, &twiddles, 1, &mut output, &mut scratch);
    buffer.copy_from_slice(&output);
    Ok(())
}

/// `e^(-2πik/n)` for `k` in `0..n`.
fn twiddles(n: usize) -> Result<Vec<Complex<f64>>, Error> {
    let mut twiddles = try_zeroed::<Complex<f64>>(n)?;
    for (k, twiddle) in twiddles.iter_mut().enumerate() {
        *twiddle = Complex::from_polar(1.0, -2.0 * PI * (k as f64) / (n as f64));
    }
    Ok(twiddles)
}

/// Transforms the `output.len()` elements `input[0], input[stride], input[2 * stride], ...`
/// into `output`.
///
/// `twiddles` belong to the length of the outermost transform, `twiddle_stride` maps them to the
/// length of this one.
fn cooley_tukey(
    input: &[Complex<f64>],
    stride: usize,
    plan: &[usize],
    twiddles: &[Complex<f64>],
    twiddle_stride: usize,
    output: &mut [Complex<f64>],
    scratch: &mut [Complex<f64>],
) {
    let len = output.len();
    let Some((&p, remaining_plan)) = plan.split_first() else {
        output[0] = input[0];
        return;
    };
    let m = len / p;

    // Step 1: transform the p interleaved subsequences of length m
    for (r, chunk) in output.chunks_exact_mut(m).enumerate() {
        cooley_tukey(
            &input[r * stride..],
            stride * p,
            remaining_plan,
            twiddles,
            twiddle_stride * p,
            chunk,
            scratch,
        );
    }

    // Step 2: combine them with a DFT of length p for each k.
    // X[k + q*m] = Σ_r W_len^(r*k) * Y_r[k] * W_p^(r*q)
    let n = twiddles.len();
    let (values, spare) = scratch.split_at_mut(p);
    for k in 0..m {
        for (r, y) in values.iter_mut().enumerate() {
            *y = output[r * m + k] * twiddles[(r * k * twiddle_stride) % n];
        }

        match p {
            2 => butterfly_2(values),
            3 => butterfly_3(values),
            4 => butterfly_4(values),
            5 => butterfly_5(values),
            _ => butterfly_generic(values, &mut spare[..p], twiddles, n / p),
        }

        for (q, x) in values.iter().enumerate() {
            output[k + q * m] = *x;
        }
    }
}

/// Multiplication with `-i`.
#[inline]
fn rotate(z: Complex<f64>) -> Complex<f64> {
    Complex::new(z.im, -z.re)
}

#[inline]
fn butterfly_2(x: &mut [Complex<f64>]) {
    let (a, b) = (x[0], x[1]);
    x[0] = a + b;
    x[1] = a - b;
}

#[inline]
fn butterfly_3(x: &mut [Complex<f64>]) {
    // sin(2π/3)
    const SIN: f64 = 0.866_025_403_784_438_6;

    let sum = x[1] + x[2];
    let diff = rotate(x[1] - x[2]) * SIN;
    let base = x[0] - sum * 0.5;
    x[0] += sum;
    x[1] = base + diff;
    x[2] = base - diff;
}

#[inline]
fn butterfly_4(x: &mut [Complex<f64>]) {
    let (t0, t1) = (x[0] + x[2], x[0] - x[2]);
    let (t2, t3) = (x[1] + x[3], rotate(x[1] - x[3]));
    x[0] = t0 + t2;
    x[1] = t1 + t3;
    x[2] = t0 - t2;
    x[3] = t1 - t3;
}

#[inline]
fn butterfly_5(x: &mut [Complex<f64>]) {
    // cos and sin of 2π/5 and 4π/5
    const COS_1: f64 = 0.309_016_994_374_947_45;
    const COS_2: f64 = -0.809_016_994_374_947_5;
    const SIN_1: f64 = 0.951_056_516_295_153_5;
    const SIN_2: f64 = 0.587_785_252_292_473_1;

    let (sum_14, diff_14) = (x[1] + x[4], x[1] - x[4]);
    let (sum_23, diff_23) = (x[2] + x[3], x[2] - x[3]);

    let base_1 = x[0] + sum_14 * COS_1 + sum_23 * COS_2;
    let base_2 = x[0] + sum_14 * COS_2 + sum_23 * COS_1;
    let rot_1 = rotate(diff_14 * SIN_1 + diff_23 * SIN_2);
    let rot_2 = rotate(diff_14 * SIN_2 - diff_23 * SIN_1);

    x[0] += sum_14 + sum_23;
    x[1] = base_1 + rot_1;
    x[4] = base_1 - rot_1;
    x[2] = base_2 + rot_2;
    x[3] = base_2 - rot_2;
}

/// Direct DFT for the remaining prime lengths. The roots of unity of length `x.len()` are every
/// `root_stride`-th twiddle.
fn butterfly_generic(
    x: &mut [Complex<f64>],
    spare: &mut [Complex<f64>],
    twiddles: &[Complex<f64>],
    root_stride: usize,
) {
    let p = x.len();
    for (q, out) in spare.iter_mut().enumerate() {
        *out = x
            .iter()
            .enumerate()
            .map(|(r, y)| y * twiddles[((r * q) % p) * root_stride])
            .sum();
    }
    x.copy_from_slice(spare);
}

/// Bluestein's algorithm: the DFT of length n as a cyclic convolution of power of two length.
fn bluestein(buffer: &mut [Complex<f64>]) -> Result<(), Error> {
    let n = buffer.len();
    let conv_len = (2 * n - 1).next_power_of_two();

    // chirp w_k = e^(-πik²/n), k² is reduced mod 2n to keep the angle small
    let mut chirp = try_zeroed::<Complex<f64>>(n)?;
    for (k, w) in chirp.iter_mut().enumerate() {
        let k_squared = ((k as u128 * k as u128) % (2 * n as u128)) as f64;
        *w = Complex::from_polar(1.0, -PI * k_squared / n as f64);
    }

    let mut a = try_zeroed::<Complex<f64>>(conv_len)?;
    for ((a, x), w) in a.iter_mut().zip(buffer.iter()).zip(&chirp) {
        *a = x * w;
    }

    let mut b = try_zeroed::<Complex<f64>>(conv_len)?;
    b[0] = chirp[0].conj();
    for k in 1..n {
        b[k] = chirp[k].conj();
        b[conv_len - k] = chirp[k].conj();
    }

    mixed_radix(&mut a)?;
    mixed_radix(&mut b)?;

    // inverse transform of the product: conj(fft(conj(x))) / len
    for (a, b) in a.iter_mut().zip(&b) {
        *a = (*a * b).conj();
    }
    mixed_radix(&mut a)?;

    let scale = conv_len as f64;
    for ((x, c), w) in buffer.iter_mut().zip(&a).zip(&chirp) {
        *x = c.conj() / scale * w;
    }
    Ok(())
}
