//! Deterministic RNG streams for a session.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

/// Independent random streams derived from one user-visible seed.
///
/// Sampling and panel layout draw from separate streams so changing how
/// many fields a panel shows never perturbs which companies get paired.
#[derive(Debug, Clone)]
pub struct RngBundle {
    seed: u64,
    sampling: CountingRng<ChaCha20Rng>,
    layout: CountingRng<ChaCha20Rng>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed,
            sampling: CountingRng::new(derive_stream_seed(seed, b"sampling")),
            layout: CountingRng::new(derive_stream_seed(seed, b"layout")),
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Stream used to pick company pairs and metrics.
    pub fn sampling(&mut self) -> &mut CountingRng<ChaCha20Rng> {
        &mut self.sampling
    }

    /// Stream used to pick and order visible panel fields.
    pub fn layout(&mut self) -> &mut CountingRng<ChaCha20Rng> {
        &mut self.layout
    }

    /// Total draws across both streams.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.sampling.draws().saturating_add(self.layout.draws())
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<ChaCha20Rng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
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
    // HMAC accepts keys of any length, so the fallback is unreachable in practice.
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed.rotate_left(17) ^ u64::from(domain_tag.len() as u8);
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
