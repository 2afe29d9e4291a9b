//! Randomness underneath every sampling strategy.
//!
//! All strategies draw through [`UniformSource`], so a run can be replayed
//! from its seed or driven by a scripted sequence in tests.

pub mod rng;

pub use rng::{ScriptedSource, SimRng, UniformSource};
