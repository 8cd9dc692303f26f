//! Deterministic per-run RNG.
//!
//! # Determinism strategy
//!
//! Every stochastic decision in a run (package arrivals, priority draws,
//! pickup-zone choice, fault injection) draws from one `SimRng` owned by that
//! run.  Runs never share RNG state, and a run's tick loop is sequential, so
//! the same seed replays the same arrivals and faults regardless of how many
//! other runs execute concurrently.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Simulation-level RNG for one run.
///
/// Used only from the run's own (sequential) tick loop.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Seed from OS entropy, for runs that did not ask for reproducibility.
    pub fn from_entropy() -> Self {
        SimRng(SmallRng::from_entropy())
    }

    /// Uniform sample in `[0, 1)`.
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Choose a random element from a slice.  `None` if the slice is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }

    /// Pick a key from `(key, weight)` pairs with probability proportional to
    /// weight.  Non-positive weights are never chosen; returns `None` when no
    /// weight is positive.
    pub fn weighted<'a, K>(&mut self, weights: impl IntoIterator<Item = (&'a K, f64)>) -> Option<&'a K>
    where
        K: 'a,
    {
        let items: Vec<(&K, f64)> = weights.into_iter().filter(|(_, w)| *w > 0.0).collect();
        let total: f64 = items.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            return None;
        }
        let mut roll = self.unit() * total;
        for (key, weight) in &items {
            if roll < *weight {
                return Some(*key);
            }
            roll -= weight;
        }
        items.last().map(|(k, _)| *k)
    }
}
