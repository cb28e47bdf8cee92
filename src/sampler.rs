use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Decides which samples survive rate filtering.
///
/// The client draws one decision per metric call with a rate below 1. The
/// source is injectable so tests can make filtering deterministic.
pub trait Sampler: Send {
    /// Whether a sample with the given rate is kept.
    fn keep(&mut self, rate: f64) -> bool;
}

/// The default sampler: one uniform draw in `[0, 1)` per decision, keeping
/// the sample when the draw lands below the rate.
pub struct RandomSampler {
    rng: SmallRng,
}

impl RandomSampler {
    pub fn new() -> RandomSampler {
        RandomSampler {
            rng: SmallRng::from_entropy(),
        }
    }

    /// A sampler with a fixed seed, for reproducible filtering.
    pub fn seeded(seed: u64) -> RandomSampler {
        RandomSampler {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomSampler {
    fn default() -> RandomSampler {
        RandomSampler::new()
    }
}

impl Sampler for RandomSampler {
    fn keep(&mut self, rate: f64) -> bool {
        rate >= 1.0 || self.rng.gen::<f64>() < rate
    }
}
