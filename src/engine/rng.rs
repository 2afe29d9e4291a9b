//! Uniform random number sources.
//!
//! Implements PCG (Permuted Congruential Generator) with partitioned seeds so
//! that every strategy in a comparison gets its own independent stream.
//!
//! Strategies never touch a concrete generator: they pull `[0, 1)` draws from
//! a [`UniformSource`]. [`SimRng`] is the production source; [`ScriptedSource`]
//! replays a fixed list of draws for scenario tests and debugging.

use rand::prelude::*;
use rand_pcg::Pcg64;

/// Golden-ratio increment used to derive partition seeds.
const STREAM_SPACING: u64 = 0x9E37_79B9_7F4A_7C15;

/// A source of uniform `[0, 1)` draws.
pub trait UniformSource {
    /// Next draw in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Next draw scaled to `[min, max)`.
    fn next_range(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.next_f64()
    }
}

/// Seeded, reproducible random number generator.
#[derive(Debug, Clone)]
pub struct SimRng {
    /// Master seed for reproducibility.
    master_seed: u64,
    /// Current stream index for partitioning.
    stream: u64,
    /// Internal PCG state.
    rng: Pcg64,
}

impl SimRng {
    /// Create a new RNG with the given master seed.
    #[must_use]
    pub fn new(master_seed: u64) -> Self {
        Self {
            master_seed,
            stream: 0,
            rng: Pcg64::seed_from_u64(master_seed),
        }
    }

    /// Create an RNG seeded from operating-system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::thread_rng().gen())
    }

    /// Get the master seed.
    #[must_use]
    pub const fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Get current stream index.
    #[must_use]
    pub const fn stream(&self) -> u64 {
        self.stream
    }

    /// Create `n` independent generators derived from the master seed.
    ///
    /// Each call advances the stream counter, so repeated calls hand out fresh
    /// streams and never reuse one.
    ///
    /// # Example
    ///
    /// ```rust
    /// use montepi::engine::rng::SimRng;
    ///
    /// let mut rng = SimRng::new(42);
    /// let partitions = rng.partition(4);
    /// assert_eq!(partitions.len(), 4);
    /// assert_eq!(rng.stream(), 4);
    /// ```
    #[must_use]
    pub fn partition(&mut self, n: usize) -> Vec<Self> {
        let partitions: Vec<Self> = (0..n)
            .map(|i| self.derived(self.stream + 1 + i as u64))
            .collect();

        self.stream += n as u64;
        partitions
    }

    /// Next independent stream, equivalent to a single-way partition.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.stream += 1;
        self.derived(self.stream)
    }

    fn derived(&self, stream: u64) -> Self {
        let seed = self
            .master_seed
            .wrapping_add(stream.wrapping_mul(STREAM_SPACING));
        Self {
            master_seed: self.master_seed,
            stream,
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    /// Generate a random f64 in [0, 1).
    pub fn gen_f64(&mut self) -> f64 {
        self.rng.gen()
    }

    /// Generate n random f64 samples in [0, 1).
    #[must_use]
    pub fn sample_n(&mut self, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.gen_f64()).collect()
    }
}

impl UniformSource for SimRng {
    fn next_f64(&mut self) -> f64 {
        self.gen_f64()
    }
}

/// Replays a fixed sequence of draws.
///
/// Once the script is exhausted it wraps around to the beginning, so a short
/// script can drive an arbitrarily long batch.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    draws: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    /// Create a source replaying `draws`. An empty script yields zeros.
    #[must_use]
    pub fn new(draws: impl Into<Vec<f64>>) -> Self {
        Self {
            draws: draws.into(),
            cursor: 0,
        }
    }

    /// Number of draws consumed so far.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.cursor
    }
}

impl UniformSource for ScriptedSource {
    fn next_f64(&mut self) -> f64 {
        if self.draws.is_empty() {
            return 0.0;
        }
        let value = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        value
    }
}
