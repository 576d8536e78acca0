//! Seeded Poisson sampling.
//!
//! The algorithm is fixed here instead of delegated to a generic distribution
//! so that a given generator stream always yields the same draws: the
//! multiplication method below `PTRS_THRESHOLD`, and Hörmann's transformed
//! rejection with squeeze (PTRS) above it.

use rand::distributions::{Distribution, Standard};
use rand::Rng;

const PTRS_THRESHOLD: f64 = 10.0;

/// Coefficients of the Stirling series for ln Γ.
const STIRLING: [f64; 10] = [
	8.333333333333333e-02,
	-2.777777777777778e-03,
	7.936507936507937e-04,
	-5.952380952380952e-04,
	8.417508417508418e-04,
	-1.917526917526918e-03,
	6.410256410256410e-03,
	-2.955065359477124e-02,
	1.796443723688307e-01,
	-1.39243221690590e+00,
];

const LN_2PI: f64 = 1.8378770664093453;

#[inline]
fn uniform<R: Rng + ?Sized>(rng: &mut R) -> f64 {
	Standard.sample(rng)
}

/// ln Γ(x) for x > 0.
pub fn ln_gamma(x: f64) -> f64 {
	if x == 1.0 || x == 2.0 {
		return 0.0;
	}
	let shift = if x < 7.0 { (7.0 - x).floor() as usize } else { 0 };
	let mut x0 = x + shift as f64;
	let x2 = 1.0 / (x0 * x0);

	let mut series = STIRLING[9];
	for &a in STIRLING[..9].iter().rev() {
		series = series * x2 + a;
	}
	let mut gl = series / x0 + 0.5 * LN_2PI + (x0 - 0.5) * x0.ln() - x0;

	for _ in 0..shift {
		x0 -= 1.0;
		gl -= x0.ln();
	}
	gl
}

/// Draw from Poisson(`lambda`). Non-positive or NaN means yield 0.
pub fn sample_poisson<R: Rng + ?Sized>(rng: &mut R, lambda: f64) -> i64 {
	if !(lambda > 0.0) {
		0
	} else if lambda < PTRS_THRESHOLD {
		sample_multiplication(rng, lambda)
	} else {
		sample_ptrs(rng, lambda)
	}
}

fn sample_multiplication<R: Rng + ?Sized>(rng: &mut R, lambda: f64) -> i64 {
	let limit = (-lambda).exp();
	let mut k = 0;
	let mut prod = 1.0;
	loop {
		prod *= uniform(rng);
		if prod <= limit {
			return k;
		}
		k += 1;
	}
}

fn sample_ptrs<R: Rng + ?Sized>(rng: &mut R, lambda: f64) -> i64 {
	let slam = lambda.sqrt();
	let loglam = lambda.ln();
	let b = 0.931 + 2.53 * slam;
	let a = -0.059 + 0.02483 * b;
	let inv_alpha = 1.1239 + 1.1328 / (b - 3.4);
	let vr = 0.9277 - 3.6224 / (b - 2.0);

	loop {
		let u = uniform(rng) - 0.5;
		let v = uniform(rng);
		let us = 0.5 - u.abs();
		let k = ((2.0 * a / us + b) * u + lambda + 0.43).floor() as i64;

		if us >= 0.07 && v <= vr {
			return k;
		}
		if k < 0 || (us < 0.013 && v > us) {
			continue;
		}
		let lhs = v.ln() + inv_alpha.ln() - (a / (us * us) + b).ln();
		let rhs = -lambda + k as f64 * loglam - ln_gamma(k as f64 + 1.0);
		if lhs <= rhs {
			return k;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand_chacha::ChaCha8Rng;

	fn sample_mean(lambda: f64, n: usize, seed: u64) -> f64 {
		let mut rng = ChaCha8Rng::seed_from_u64(seed);
		let total: i64 = (0..n).map(|_| sample_poisson(&mut rng, lambda)).sum();
		total as f64 / n as f64
	}

	#[test]
	fn ln_gamma_matches_factorials() {
		assert_eq!(ln_gamma(1.0), 0.0);
		assert_eq!(ln_gamma(2.0), 0.0);
		assert!((ln_gamma(5.0) - 24.0_f64.ln()).abs() < 1e-10);
		assert!((ln_gamma(11.0) - 3_628_800.0_f64.ln()).abs() < 1e-10);
		assert!((ln_gamma(0.5) - std::f64::consts::PI.sqrt().ln()).abs() < 1e-10);
	}

	#[test]
	fn degenerate_means_draw_zero() {
		let mut rng = ChaCha8Rng::seed_from_u64(1);
		assert_eq!(sample_poisson(&mut rng, 0.0), 0);
		assert_eq!(sample_poisson(&mut rng, -2.0), 0);
		assert_eq!(sample_poisson(&mut rng, f64::NAN), 0);
	}

	#[test]
	fn small_mean_is_unbiased() {
		let mean = sample_mean(2.5, 20_000, 7);
		assert!((mean - 2.5).abs() < 0.1, "mean {}", mean);
	}

	#[test]
	fn large_mean_is_unbiased() {
		let mean = sample_mean(120.0, 20_000, 11);
		assert!((mean - 120.0).abs() < 1.0, "mean {}", mean);
	}

	#[test]
	fn draws_are_reproducible_and_non_negative() {
		let mut a = ChaCha8Rng::seed_from_u64(99);
		let mut b = ChaCha8Rng::seed_from_u64(99);
		for &lambda in &[0.3, 4.0, 15.0, 800.0] {
			for _ in 0..200 {
				let x = sample_poisson(&mut a, lambda);
				assert!(x >= 0);
				assert_eq!(x, sample_poisson(&mut b, lambda));
			}
		}
	}
}
