//! Shared profile builders for the integration tests.

#![allow(dead_code)]

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use wirefit::{Direction, ProfileData, ProfileKey, ProfileShape};

/// `count` evenly spaced positions over `[start, end]`.
pub fn grid(start: f64, end: f64, count: usize) -> Vec<f64> {
    let step = (end - start) / (count - 1) as f64;
    (0..count).map(|i| start + i as f64 * step).collect()
}

/// Sample a curve (offset included) on the given positions.
pub fn sampled_profile(
    key: ProfileKey,
    curve: &impl ProfileShape,
    positions: Vec<f64>,
) -> ProfileData {
    let intensities = positions.iter().map(|&x| curve.value(x)).collect();
    ProfileData::new(key, positions, intensities).unwrap()
}

/// Sample a curve and add seeded Gaussian noise.
pub fn noisy_profile(
    key: ProfileKey,
    curve: &impl ProfileShape,
    positions: Vec<f64>,
    noise: f64,
    seed: u64,
) -> ProfileData {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let normal = Normal::new(0.0, noise).unwrap();
    let intensities = positions
        .iter()
        .map(|&x| curve.value(x) + normal.sample(&mut rng))
        .collect();
    ProfileData::new(key, positions, intensities).unwrap()
}

pub fn key(wire: &str, direction: Direction) -> ProfileKey {
    ProfileKey::new("scan_01.txt", wire, direction)
}
