//! Seedable pseudo-random generators.
//!
//! Solvers own exactly one [`RandomGenerator`] and draw every u-vector of a
//! batch from it on the orchestrating thread before the batch is dispatched
//! to workers. Results are therefore identical for any worker count.
//! Independent sub-streams (e.g. the second stage of a hybrid method) are
//! seeded with [`counter_seed`].

use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use rand_xoshiro::{SplitMix64, Xoroshiro128PlusPlus, Xoshiro256PlusPlus, Xoshiro256StarStar};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SEED;

/// Generator algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RandomType {
    #[default]
    Xoshiro256PlusPlus,
    Xoshiro256StarStar,
    Xoroshiro128PlusPlus,
    SplitMix64,
}

impl RandomType {
    pub fn name(&self) -> &'static str {
        match self {
            RandomType::Xoshiro256PlusPlus => "xoshiro256_plus_plus",
            RandomType::Xoshiro256StarStar => "xoshiro256_star_star",
            RandomType::Xoroshiro128PlusPlus => "xoroshiro128_plus_plus",
            RandomType::SplitMix64 => "split_mix64",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [
            RandomType::Xoshiro256PlusPlus,
            RandomType::Xoshiro256StarStar,
            RandomType::Xoroshiro128PlusPlus,
            RandomType::SplitMix64,
        ]
        .into_iter()
        .find(|t| t.name() == name)
    }
}

/// Generator choice and seeding policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomSettings {
    pub random_type: RandomType,
    pub seed: u64,
    /// When false, a fresh seed is drawn from the OS for every run.
    pub is_repeatable: bool,
}

impl Default for RandomSettings {
    fn default() -> Self {
        Self {
            random_type: RandomType::default(),
            seed: DEFAULT_SEED,
            is_repeatable: true,
        }
    }
}

impl RandomSettings {
    /// Create the generator for one run.
    pub fn generator(&self) -> RandomGenerator {
        let seed = if self.is_repeatable {
            self.seed
        } else {
            rand::random()
        };
        RandomGenerator::new(self.random_type, seed)
    }

    /// Settings for an independent sub-stream.
    pub fn derived(&self, stream: u64) -> Self {
        Self {
            seed: counter_seed(self.seed, stream),
            ..*self
        }
    }
}

/// Derive a decorrelated seed for sub-stream `counter` (SplitMix64 finalizer).
pub fn counter_seed(seed: u64, counter: u64) -> u64 {
    let mut z = seed ^ counter.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// One of the supported generators behind a single type.
#[derive(Debug, Clone)]
pub enum RandomGenerator {
    Xoshiro256PlusPlus(Xoshiro256PlusPlus),
    Xoshiro256StarStar(Xoshiro256StarStar),
    Xoroshiro128PlusPlus(Xoroshiro128PlusPlus),
    SplitMix64(SplitMix64),
}

impl RandomGenerator {
    pub fn new(random_type: RandomType, seed: u64) -> Self {
        match random_type {
            RandomType::Xoshiro256PlusPlus => {
                Self::Xoshiro256PlusPlus(Xoshiro256PlusPlus::seed_from_u64(seed))
            }
            RandomType::Xoshiro256StarStar => {
                Self::Xoshiro256StarStar(Xoshiro256StarStar::seed_from_u64(seed))
            }
            RandomType::Xoroshiro128PlusPlus => {
                Self::Xoroshiro128PlusPlus(Xoroshiro128PlusPlus::seed_from_u64(seed))
            }
            RandomType::SplitMix64 => Self::SplitMix64(SplitMix64::seed_from_u64(seed)),
        }
    }

    /// Uniform draw in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.random::<f64>()
    }

    pub fn standard_normal(&mut self) -> f64 {
        StandardNormal.sample(self)
    }

    /// Vector of independent standard normal draws.
    pub fn normal_vector(&mut self, dimension: usize) -> Vec<f64> {
        (0..dimension).map(|_| self.standard_normal()).collect()
    }

    /// Direction uniformly distributed on the unit sphere.
    pub fn unit_direction(&mut self, dimension: usize) -> Vec<f64> {
        if dimension == 0 {
            return Vec::new();
        }
        loop {
            let mut v = self.normal_vector(dimension);
            let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
            if norm > 1e-12 {
                v.iter_mut().for_each(|x| *x /= norm);
                return v;
            }
        }
    }

    /// Random permutation of `0..n`.
    pub fn permutation(&mut self, n: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(self);
        order
    }
}

impl RngCore for RandomGenerator {
    fn next_u32(&mut self) -> u32 {
        match self {
            Self::Xoshiro256PlusPlus(r) => r.next_u32(),
            Self::Xoshiro256StarStar(r) => r.next_u32(),
            Self::Xoroshiro128PlusPlus(r) => r.next_u32(),
            Self::SplitMix64(r) => r.next_u32(),
        }
    }

    fn next_u64(&mut self) -> u64 {
        match self {
            Self::Xoshiro256PlusPlus(r) => r.next_u64(),
            Self::Xoshiro256StarStar(r) => r.next_u64(),
            Self::Xoroshiro128PlusPlus(r) => r.next_u64(),
            Self::SplitMix64(r) => r.next_u64(),
        }
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        match self {
            Self::Xoshiro256PlusPlus(r) => r.fill_bytes(dst),
            Self::Xoshiro256StarStar(r) => r.fill_bytes(dst),
            Self::Xoroshiro128PlusPlus(r) => r.fill_bytes(dst),
            Self::SplitMix64(r) => r.fill_bytes(dst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeatable_streams() {
        let settings = RandomSettings::default();
        let a: Vec<f64> = settings.generator().normal_vector(16);
        let b: Vec<f64> = settings.generator().normal_vector(16);
        assert_eq!(a, b);
    }

    #[test]
    fn test_generators_differ() {
        let a = RandomGenerator::new(RandomType::Xoshiro256PlusPlus, 7).next_u64();
        let b = RandomGenerator::new(RandomType::SplitMix64, 7).next_u64();
        assert_ne!(a, b);
    }

    #[test]
    fn test_unit_direction_norm() {
        let mut rng = RandomGenerator::new(RandomType::default(), 1);
        for _ in 0..100 {
            let d = rng.unit_direction(5);
            let norm: f64 = d.iter().map(|x| x * x).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_counter_seed_distinct() {
        assert_ne!(counter_seed(DEFAULT_SEED, 0), counter_seed(DEFAULT_SEED, 1));
        assert_eq!(counter_seed(3, 9), counter_seed(3, 9));
    }

    #[test]
    fn test_permutation_is_complete() {
        let mut rng = RandomGenerator::new(RandomType::default(), 5);
        let mut p = rng.permutation(50);
        p.sort_unstable();
        assert_eq!(p, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_random_type_names() {
        assert_eq!(
            RandomType::from_name("split_mix64"),
            Some(RandomType::SplitMix64)
        );
        assert_eq!(RandomType::from_name("mersenne"), None);
    }
}
