//! The own FFT against a direct DFT and against rustfft.

use crate::fft::{factorize, fft, radix_plan, Complex, FftBackend};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

fn random_signal(len: usize, seed: u64) -> Vec<Complex<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| Complex::new(rng.random::<f64>() - 0.5, rng.random::<f64>() - 0.5))
        .collect()
}

fn direct_dft(input: &[Complex<f64>]) -> Vec<Complex<f64>> {
    let n = input.len();
    (0..n)
        .map(|k| {
            input
                .iter()
                .enumerate()
                .map(|(j, x)| {
                    let angle = -2.0 * PI * ((j * k) % n) as f64 / n as f64;
                    x * Complex::from_polar(1.0, angle)
                })
                .sum()
        })
        .collect()
}

fn max_difference(left: &[Complex<f64>], right: &[Complex<f64>]) -> f64 {
    left.iter()
        .zip(right)
        .map(|(l, r)| (l - r).norm())
        .fold(0.0, f64::max)
}

#[test]
fn test_factorize() {
    assert!(factorize(0).is_empty());
    assert!(factorize(1).is_empty());
    assert_eq!(factorize(2), [2]);
    assert_eq!(factorize(360), [2, 2, 2, 3, 3, 5]);
    assert_eq!(factorize(1_000_000), [2, 2, 2, 2, 2, 2, 5, 5, 5, 5, 5, 5]);
    assert_eq!(factorize(4099), [4099]);
    assert_eq!(factorize(2 * 4099 * 4099), [2, 4099, 4099]);
}

/// Radix 4 first, a single radix 2, then the odd primes.
#[test]
fn test_radix_plan() {
    assert!(radix_plan(1).is_empty());
    assert_eq!(radix_plan(2), [2]);
    assert_eq!(radix_plan(8), [4, 2]);
    assert_eq!(radix_plan(360), [4, 2, 3, 3, 5]);
    assert_eq!(radix_plan(1_000_000), [4, 4, 4, 5, 5, 5, 5, 5, 5]);
    assert_eq!(radix_plan(38_912), [4, 4, 4, 4, 4, 2, 19]);
    assert_eq!(radix_plan(2 * 4099), [2, 4099]);
}

/// Small lengths, including primes above the direct DFT limit.
#[test]
fn test_mixed_radix_against_direct_dft() {
    for len in [
        2, 3, 4, 5, 6, 7, 8, 10, 12, 15, 16, 20, 25, 30, 45, 60, 61, 64, 67, 97, 100, 128, 134,
        210, 243, 250,
    ] {
        let input = random_signal(len, len as u64);
        let expected = direct_dft(&input);

        let mut output = input.clone();
        fft(&mut output, FftBackend::MixedRadix).unwrap();

        let difference = max_difference(&output, &expected);
        assert!(difference < 1e-9, "length {len}: difference {difference}");
    }
}

#[test]
fn test_mixed_radix_against_rustfft() {
    for len in [1000, 1024, 4099, 6000, 9973, 38_912, 100_003] {
        let input = random_signal(len, 7);

        let mut own = input.clone();
        fft(&mut own, FftBackend::MixedRadix).unwrap();
        let mut reference = input;
        fft(&mut reference, FftBackend::RustFft).unwrap();

        let difference = max_difference(&own, &reference);
        assert!(difference < 1e-7, "length {len}: difference {difference}");
    }
}

#[test]
fn test_trivial_lengths() {
    let mut empty: Vec<Complex<f64>> = Vec::new();
    fft(&mut empty, FftBackend::MixedRadix).unwrap();

    let mut single = vec![Complex::new(3.0, -1.0)];
    fft(&mut single, FftBackend::MixedRadix).unwrap();
    assert_eq!(single, [Complex::new(3.0, -1.0)]);

    // a constant signal only has a DC component
    let mut constant = vec![Complex::new(1.0, 0.0); 12];
    fft(&mut constant, FftBackend::MixedRadix).unwrap();
    assert!((constant[0] - Complex::new(12.0, 0.0)).norm() < 1e-12);
    assert!(constant[1..].iter().all(|x| x.norm() < 1e-12));
}

#[test]
fn test_backend_names() {
    assert_eq!(FftBackend::default(), FftBackend::MixedRadix);
    assert_eq!(FftBackend::RustFft.to_string(), "rust-fft");
    assert_eq!("mixed-radix".parse::<FftBackend>(), Ok(FftBackend::MixedRadix));
}
