//! Noise buffer generation
//!
//! Fixed-length buffers of white and integrated ("brown") noise. Buffers
//! are generated once and looped by the renderer - per-sample noise
//! synthesis for an always-on bed would be wasted work.

/// xorshift64 PRNG. Deterministic, allocation-free, good enough for
/// audio noise.
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self {
            // A zero state would lock xorshift at zero forever.
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
        }
    }

    /// Seed from wall-clock entropy, for call-to-call variety.
    pub fn from_entropy() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos() as u64 ^ d.as_secs())
            .unwrap_or(0xDEAD_BEEF_CAFE_BABE);
        Self::new(nanos ^ 0xA24B_AED4_963E_E407)
    }

    /// Uniform sample in [0, 1).
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        // Use the top 24 bits for a clean mantissa.
        (self.state >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform sample in [-1, 1].
    #[inline]
    pub fn bipolar(&mut self) -> f32 {
        self.next_f32() * 2.0 - 1.0
    }

    /// Uniform sample in [lo, hi].
    #[inline]
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + self.next_f32() * (hi - lo)
    }
}

/// White noise: independent uniform samples in [-1, 1].
pub fn white_noise(sample_rate: f32, duration: f32, rng: &mut Rng) -> Vec<f32> {
    let len = (sample_rate * duration).round() as usize;
    (0..len).map(|_| rng.bipolar()).collect()
}

/// Brown (red) noise: a leaky first-order integration of white noise,
/// rescaled to restore audible amplitude. This is the source of every
/// deep rumbling texture in the engine.
pub fn brown_noise(sample_rate: f32, duration: f32, rng: &mut Rng) -> Vec<f32> {
    let len = (sample_rate * duration).round() as usize;
    let mut last = 0.0f32;
    (0..len)
        .map(|_| {
            last = (last + 0.02 * rng.bipolar()) / 1.02;
            last * 3.5
        })
        .collect()
}
