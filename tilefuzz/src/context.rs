use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

/// Random state shared by every component of a run
///
/// The seed is kept so it can be reported; replaying a seed against the same
/// target build reproduces the generated inputs.
#[derive(Debug, Clone)]
pub struct FuzzContext {
    seed: u64,
    rng: ChaCha8Rng,
}

impl FuzzContext {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Use `seed` when given, otherwise draw one from the OS and log it
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => {
                let seed = rand::random::<u64>();
                info!("No seed configured, using random seed {}", seed);
                Self::from_seed(seed)
            }
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }
}
