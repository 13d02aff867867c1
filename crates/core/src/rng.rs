//! Deterministic pseudo-random stream.
//!
//! `TileRng` is a 32-bit linear congruential generator. It is deliberately
//! tiny: terrain noise constructs one per sampled cell, so construction has to
//! be free. It also implements [`rand::RngCore`] so gameplay code can use the
//! `rand` range helpers on the same reproducible stream.

use rand::{Error, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

const LCG_MULTIPLIER: u32 = 1_664_525;
const LCG_INCREMENT: u32 = 1_013_904_223;

/// Reproducible random stream seeded from an integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRng {
    state: u32,
}

impl TileRng {
    /// Create a stream from `seed`.
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Advance the stream and return the new state.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT);
        self.state
    }

    /// Value in `[0, n)`; `0` when `n <= 0`.
    pub fn int_range(&mut self, n: i32) -> i32 {
        if n <= 0 {
            return 0;
        }
        (self.next() % n as u32) as i32
    }

    /// Value in `[0.0, 1.0]`.
    pub fn unit(&mut self) -> f64 {
        self.next() as f64 / u32::MAX as f64
    }

    /// Returns true with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.unit() < p
    }
}

impl RngCore for TileRng {
    fn next_u32(&mut self) -> u32 {
        self.next()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.next() as u64;
        let lo = self.next() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for TileRng {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn same_seed_same_stream() {
        let mut a = TileRng::new(12345);
        let mut b = TileRng::new(12345);
        for _ in 0..100 {
            assert_eq!(a.next(), b.next());
        }
    }

    #[test]
    fn first_value_matches_lcg_step() {
        let mut rng = TileRng::new(0);
        assert_eq!(rng.next(), LCG_INCREMENT);
        assert_eq!(
            rng.next(),
            LCG_INCREMENT
                .wrapping_mul(LCG_MULTIPLIER)
                .wrapping_add(LCG_INCREMENT)
        );
    }

    #[test]
    fn int_range_non_positive_is_zero() {
        let mut rng = TileRng::new(9);
        assert_eq!(rng.int_range(0), 0);
        assert_eq!(rng.int_range(-5), 0);
    }

    #[test]
    fn int_range_stays_in_bounds() {
        let mut rng = TileRng::new(77);
        for n in 1..50 {
            let v = rng.int_range(n);
            assert!((0..n).contains(&v));
        }
    }

    #[test]
    fn unit_is_normalised() {
        let mut rng = TileRng::new(3);
        for _ in 0..1000 {
            let v = rng.unit();
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn rand_helpers_are_reproducible() {
        let mut a = TileRng::seed_from_u64(42);
        let mut b = TileRng::seed_from_u64(42);
        let rolls_a: Vec<u32> = (0..16).map(|_| a.gen_range(1..=6)).collect();
        let rolls_b: Vec<u32> = (0..16).map(|_| b.gen_range(1..=6)).collect();
        assert_eq!(rolls_a, rolls_b);
        assert!(rolls_a.iter().all(|r| (1..=6).contains(r)));
    }

    #[test]
    fn fill_bytes_handles_partial_words() {
        let mut rng = TileRng::new(1);
        let mut buf = [0u8; 7];
        rng.fill_bytes(&mut buf);
        assert!(buf.iter().any(|b| *b != 0));
    }
}
