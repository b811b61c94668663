use rand::{
    rngs::{SmallRng, StdRng},
    Rng, SeedableRng,
};

pub mod satisfiability;

/// The generator behind every stochastic decision of a run.
pub type SearchRng = SmallRng;

/// Derives the run's generator from a user-facing seed. The same seed always
/// yields the same stream.
pub fn seeded_rng(seed: u64) -> SearchRng {
    SmallRng::from_seed(StdRng::seed_from_u64(seed).gen())
}
