use core::fmt;
use std::sync::{Mutex, PoisonError};

use rand::{Rng as _, SeedableRng as _, rngs::StdRng, thread_rng};
use serde::Deserialize;

/// Source of uniform integers for the probability gate.
pub trait RandomSource: Send + Sync + fmt::Debug {
    /// A uniform draw in `[0, upper)`. Returns 0 when `upper` is 0.
    fn below(&self, upper: u32) -> u32;
}

/// Process-wide default: the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn below(&self, upper: u32) -> u32 {
        if upper == 0 {
            return 0;
        }
        thread_rng().gen_range(0..upper)
    }
}

/// Deterministic generator: the same seed yields the same sequence.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn below(&self, upper: u32) -> u32 {
        if upper == 0 {
            return 0;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(0..upper)
    }
}

/// One-in-`denominator` odds: a draw fires when it equals `sentinel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Odds {
    #[serde(default = "default_denominator")]
    pub denominator: u32,
    #[serde(default = "default_sentinel")]
    pub sentinel: u32,
}

const fn default_denominator() -> u32 {
    150
}

const fn default_sentinel() -> u32 {
    0x2A
}

impl Default for Odds {
    fn default() -> Self {
        Self {
            denominator: default_denominator(),
            sentinel: default_sentinel(),
        }
    }
}

impl Odds {
    pub fn hit(&self, source: &dyn RandomSource) -> bool {
        source.below(self.denominator) == self.sentinel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_sequences_repeat() {
        let a = SeededRandom::new(7);
        let b = SeededRandom::new(7);
        let left: Vec<u32> = (0..32).map(|_| a.below(150)).collect();
        let right: Vec<u32> = (0..32).map(|_| b.below(150)).collect();
        assert_eq!(left, right);
        assert!(left.iter().all(|n| *n < 150));
    }

    #[test]
    fn zero_upper_bound_is_zero() {
        assert_eq!(ThreadRandom.below(0), 0);
        assert_eq!(SeededRandom::new(1).below(0), 0);
    }

    #[test]
    fn default_odds() {
        let odds = Odds::default();
        assert_eq!(odds.denominator, 150);
        assert_eq!(odds.sentinel, 42);
    }

    #[test]
    fn hit_rate_is_about_one_in_denominator() {
        let source = SeededRandom::new(0x5EED);
        let odds = Odds::default();
        let hits = (0..150_000).filter(|_| odds.hit(&source)).count();
        // Expected 1000, standard deviation about 31.6.
        assert!((850..=1150).contains(&hits), "hits = {hits}");
    }
}
