//! Per-pixel pseudorandom sampling.
//!
//! Each pixel owns an independent ChaCha20 stream so workers never contend
//! and a fixed seed reproduces the exact same render.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Pseudorandom stream of uniform reals in [0, 1).
///
/// Seeded per pixel with `entropy ^ (j * width + i)` by the driver, which
/// makes every pixel's sample sequence independent of scheduling order.
pub struct Sampler {
    rng: ChaCha20Rng,
}

impl Sampler {
    /// Create a sampler from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Draw one uniform f64 in [0.0, 1.0).
    pub fn get_1d(&mut self) -> f64 {
        self.rng.random()
    }

    /// Draw two uniform f64 values in [0.0, 1.0).
    pub fn get_2d(&mut self) -> (f64, f64) {
        (self.rng.random(), self.rng.random())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_in_unit_interval() {
        let mut sampler = Sampler::new(42);
        for _ in 0..1000 {
            let u = sampler.get_1d();
            assert!((0.0..1.0).contains(&u));
            let (a, b) = sampler.get_2d();
            assert!((0.0..1.0).contains(&a));
            assert!((0.0..1.0).contains(&b));
        }
    }

    #[test]
    fn same_seed_reproduces_stream() {
        let mut a = Sampler::new(1234);
        let mut b = Sampler::new(1234);
        for _ in 0..100 {
            assert_eq!(a.get_1d(), b.get_1d());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = Sampler::new(1);
        let mut b = Sampler::new(2);
        let same = (0..16).filter(|_| a.get_1d() == b.get_1d()).count();
        assert!(same < 16);
    }
}
