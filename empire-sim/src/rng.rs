//! Deterministic random stream for a single campaign step.
//!
//! A caller-supplied string seed is hashed to a 64-bit key, domain-separated
//! with HMAC-SHA256, and fed into `ChaCha20Rng`, whose output is stable across
//! platforms and releases. Nothing in the pipeline may draw randomness from
//! anywhere else.
use hmac::{Hmac, Mac};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;
use twox_hash::XxHash64;

use crate::constants::{EMPTY_SEED_KEY, SEED_HASH_KEY, STEP_STREAM_TAG};

/// Map a seed string to its 64-bit key. The empty string maps to
/// [`EMPTY_SEED_KEY`].
#[must_use]
pub fn seed_key(seed: &str) -> u64 {
    if seed.is_empty() {
        return EMPTY_SEED_KEY;
    }
    XxHash64::oneshot(SEED_HASH_KEY, seed.as_bytes())
}

fn derive_stream_seed(key: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&key.to_le_bytes()) else {
        return key;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

/// Counting RNG stream owned by one step invocation.
#[derive(Debug, Clone)]
pub struct StepRng {
    rng: ChaCha20Rng,
    draws: u64,
}

impl StepRng {
    /// Build the step stream from a caller seed string.
    #[must_use]
    pub fn from_seed_str(seed: &str) -> Self {
        Self::from_key(seed_key(seed))
    }

    /// Build the step stream from an already hashed key.
    #[must_use]
    pub fn from_key(key: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(derive_stream_seed(key, STEP_STREAM_TAG)),
            draws: 0,
        }
    }

    /// Next uniform float in `[0, 1)` built from the top 53 bits of a draw.
    pub fn next_f64(&mut self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let scale = 1.0 / (1_u64 << 53) as f64;
        #[allow(clippy::cast_precision_loss)]
        let mantissa = (self.next_u64() >> 11) as f64;
        mantissa * scale
    }

    /// Multiplicative jitter centred on 1 with total band `width`:
    /// `1 + (next() - 0.5) * width`.
    pub fn jitter(&mut self, width: f64) -> f64 {
        1.0 + (self.next_f64() - 0.5) * width
    }

    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl RngCore for StepRng {
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
        self.fill_bytes(dest);
        Ok(())
    }
}
