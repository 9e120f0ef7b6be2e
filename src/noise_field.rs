//! Seedable 2D gradient noise shared by terrain and prop placement.
//!
//! Both consumers must sample the exact same field for a given seed, otherwise
//! props float above or sink below the terrain mesh.

use noise::{NoiseFn, Perlin, Seedable};

/// Deterministic continuous noise field in [-1, 1].
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    perlin: Perlin,
}

impl NoiseGenerator {
    /// Create a generator already initialized with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            perlin: Perlin::new(Self::perlin_seed(seed)),
        }
    }

    /// Reset internal state from `seed`. Re-initializing with a seed that was
    /// used before reproduces every earlier sample bit for bit.
    pub fn init(&mut self, seed: u64) {
        self.perlin = Perlin::new(Self::perlin_seed(seed));
    }

    /// Seed currently driving the permutation table.
    pub fn seed(&self) -> u32 {
        self.perlin.seed()
    }

    /// Sample the field at a continuous position.
    #[inline]
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        self.perlin.get([x, z])
    }

    // Perlin takes a 32-bit seed; fold the high half in so that seeds which
    // differ only above bit 32 still produce different worlds.
    fn perlin_seed(seed: u64) -> u32 {
        (seed ^ (seed >> 32)) as u32
    }
}
