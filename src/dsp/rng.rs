/// Pseudo-random generator using a linear congruential generator (LCG)
/// Fast and deterministic; one instance is owned by whatever needs it and
/// seeded once, so the audio thread never reseeds or allocates.
#[derive(Debug, Clone)]
pub struct Rng {
    state: u32,
}

impl Rng {
    /// Default seed value
    pub const DEFAULT_SEED: u32 = 0x12345678;

    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Restart the sequence from `seed`
    pub fn reseed(&mut self, seed: u32) {
        self.state = seed;
    }

    #[inline]
    fn next_u32(&mut self) -> u32 {
        // LCG: next = (a * current + c) mod 2^32, Numerical Recipes constants
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Uniform value in [0.0, 1.0]
    #[inline]
    pub fn next_unipolar(&mut self) -> f32 {
        self.next_u32() as f32 / u32::MAX as f32
    }

    /// Uniform value in [-1.0, 1.0]
    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        self.next_unipolar() * 2.0 - 1.0
    }
}

impl Default for Rng {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}
