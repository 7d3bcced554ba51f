//! Per-algorithm random state.
//!
//! The C source seeds a Mersenne-Twister instance (`boruvka/rand-mt.h`) per
//! run and threads it through the algorithm's params struct rather than
//! reaching for a process-wide generator. `StdRng` is this crate's
//! equivalent: deterministic given a seed, and owned by whichever `Gng` /
//! `GngT` / `Kohonen` instance needs it.

use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng};

/// RNG state owned by a single streaming client
#[derive(Clone)]
pub struct Rng(StdRng);

impl Rng {
    /// Seed deterministically
    pub fn from_seed(seed: u64) -> Rng {
        Rng(StdRng::seed_from_u64(seed))
    }

    /// A uniform index in `[0, len)`
    pub fn gen_index(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }

    /// A uniform value in `[0.0, 1.0)`
    pub fn gen_unit(&mut self) -> f64 {
        self.0.gen_range(0.0..1.0)
    }

    /// Mutable access to the underlying generator, for sample sources that
    /// need a distribution from `rand_distr`
    pub fn inner(&mut self) -> &mut StdRng {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Rng::from_seed(7);
        let mut b = Rng::from_seed(7);
        let draws_a: Vec<usize> = (0..10).map(|_| a.gen_index(1000)).collect();
        let draws_b: Vec<usize> = (0..10).map(|_| b.gen_index(1000)).collect();
        assert_eq!(draws_a, draws_b);
    }

    #[test]
    fn gen_index_stays_in_bounds() {
        let mut r = Rng::from_seed(1);
        for _ in 0..100 {
            assert!(r.gen_index(5) < 5);
        }
    }
}
