//! Halton low-discrepancy sequence.
//!
//! ```text
//! i = Σ d_k b^k        (base-b digits of the index)
//! H(i, b) = Σ d_k b^-(k+1)
//! ```
//!
//! Each coordinate is the van der Corput radical inverse of the index in a
//! different prime base. The value depends only on `(index, base)`, so any
//! slice of the sequence can be generated without the prefix.

/// Largest `f64` strictly below one.
const BELOW_ONE: f64 = 1.0 - f64::EPSILON / 2.0;

/// Radical inverse of `index` in `base`.
///
/// Returns a value in `[0, 1)`. Bases below 2 are treated as 2. Indices with
/// more significant digits than an `f64` mantissa holds are clamped below one.
///
/// # Example
///
/// ```rust
/// use montepi::sampling::halton;
///
/// assert_eq!(halton(1, 2), 0.5);
/// assert_eq!(halton(3, 2), 0.75);
/// assert!((halton(3, 3) - 1.0 / 9.0).abs() < 1e-15);
/// ```
#[must_use]
pub fn halton(index: u64, base: u32) -> f64 {
    let base = u64::from(base.max(2));
    let inv_base = 1.0 / base as f64;
    let mut result = 0.0;
    let mut f = inv_base;
    let mut i = index;
    while i > 0 {
        result += f * (i % base) as f64;
        i /= base;
        f *= inv_base;
    }
    result.min(BELOW_ONE)
}

/// Iterator over `H(i, base)` for consecutive indices.
#[derive(Debug, Clone)]
pub struct HaltonSequence {
    base: u32,
    next_index: u64,
}

impl HaltonSequence {
    /// Sequence starting at index 1.
    #[must_use]
    pub const fn new(base: u32) -> Self {
        Self::starting_at(base, 1)
    }

    /// Sequence starting at an arbitrary index.
    #[must_use]
    pub const fn starting_at(base: u32, index: u64) -> Self {
        Self {
            base,
            next_index: index,
        }
    }
}

impl Iterator for HaltonSequence {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let value = halton(self.next_index, self.base);
        self.next_index = self.next_index.checked_add(1)?;
        Some(value)
    }
}
