//! Seedable random streams for trial simulation.
use hmac::{Hmac, Mac};
use rand::distributions::{Distribution, Standard};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

const TRIAL_DOMAIN: &[u8] = b"trials";

/// Counting wrapper over a ChaCha stream, handed explicitly to models and
/// the simulation driver.
#[derive(Debug, Clone)]
pub struct TrialRng {
    rng: ChaCha20Rng,
    seed: u64,
    draws: u64,
}

impl TrialRng {
    /// Construct the trial stream from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self::from_stream_seed(derive_stream_seed(seed, TRIAL_DOMAIN))
    }

    fn from_stream_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            seed,
            draws: 0,
        }
    }

    /// Derive an independent, reproducible stream keyed by `tag`.
    ///
    /// The parent stream is not advanced.
    #[must_use]
    pub fn substream(&self, tag: &[u8]) -> Self {
        Self::from_stream_seed(derive_stream_seed(self.seed, tag))
    }

    /// Uniform draw in [0, 1).
    pub fn uniform(&mut self) -> f64 {
        Standard.sample(self)
    }

    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl RngCore for TrialRng {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
