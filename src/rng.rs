/// Deterministic RNG based on splitmix64/32.

#[inline]
pub fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Stateless hash used for stable per-state plot colours.
#[inline]
pub fn splitmix32(mut x: u32) -> u32 {
    x = x.wrapping_add(0x9E3779B9);
    let mut z = x;
    z = (z ^ (z >> 16)).wrapping_mul(0x7FEB352D);
    z = (z ^ (z >> 15)).wrapping_mul(0x846CA68B);
    z ^ (z >> 16)
}

/// Sequential RNG for board generation.
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = splitmix64(self.state);
        self.state
    }

    /// Uniform in [0, 1) with 53 bits of precision.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// True with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}
