//! Validated sample counts.
//!
//! Counts arrive from the CLI, configuration files and JSON requests as
//! signed integers, floats or text. They are checked once, here, before any
//! sampling begins.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{PiError, PiResult};

/// A non-negative integral sample count.
///
/// Deserializes from integers exactly and from floats only when integral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(into = "u64")]
pub struct SampleCount(usize);

impl SampleCount {
    /// Zero samples.
    pub const ZERO: Self = Self(0);

    /// Wrap an already valid count.
    #[must_use]
    pub const fn new(n: usize) -> Self {
        Self(n)
    }

    /// The count as `usize`.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// Validate a count that must also be at least one (batch sizes).
    ///
    /// # Errors
    ///
    /// Returns `InvalidSampleCount` for zero.
    pub fn positive(self) -> PiResult<Self> {
        if self.0 == 0 {
            Err(PiError::invalid_count(0))
        } else {
            Ok(self)
        }
    }
}

impl From<usize> for SampleCount {
    fn from(n: usize) -> Self {
        Self(n)
    }
}

impl From<SampleCount> for u64 {
    fn from(count: SampleCount) -> Self {
        count.0 as Self
    }
}

impl TryFrom<i64> for SampleCount {
    type Error = PiError;

    fn try_from(n: i64) -> PiResult<Self> {
        usize::try_from(n)
            .map(Self)
            .map_err(|_| PiError::invalid_count(n))
    }
}

impl TryFrom<f64> for SampleCount {
    type Error = PiError;

    fn try_from(n: f64) -> PiResult<Self> {
        if !n.is_finite() || n < 0.0 || n.fract() != 0.0 || n >= usize::MAX as f64 {
            return Err(PiError::invalid_count(n));
        }
        Ok(Self(n as usize))
    }
}

impl FromStr for SampleCount {
    type Err = PiError;

    fn from_str(s: &str) -> PiResult<Self> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<i64>() {
            return Self::try_from(n);
        }
        match trimmed.parse::<f64>() {
            Ok(n) => Self::try_from(n),
            Err(_) => Err(PiError::invalid_count(format!("'{s}'"))),
        }
    }
}

impl<'de> Deserialize<'de> for SampleCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CountVisitor)
    }
}

struct CountVisitor;

impl Visitor<'_> for CountVisitor {
    type Value = SampleCount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integral sample count")
    }

    fn visit_u64<E: de::Error>(self, n: u64) -> Result<SampleCount, E> {
        usize::try_from(n)
            .map(SampleCount)
            .map_err(|_| E::custom(PiError::invalid_count(n)))
    }

    fn visit_i64<E: de::Error>(self, n: i64) -> Result<SampleCount, E> {
        SampleCount::try_from(n).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, n: f64) -> Result<SampleCount, E> {
        SampleCount::try_from(n).map_err(E::custom)
    }
}

impl fmt::Display for SampleCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(
            SampleCount::try_from(-1_i64),
            Err(PiError::InvalidSampleCount { .. })
        ));
    }

    #[test]
    fn test_fractional_rejected() {
        assert!(SampleCount::try_from(2.5_f64).is_err());
        assert!(SampleCount::try_from(f64::NAN).is_err());
        assert!(SampleCount::try_from(f64::INFINITY).is_err());
        assert!(SampleCount::try_from(-0.5_f64).is_err());
    }

    #[test]
    fn test_integral_float_accepted() {
        let count = SampleCount::try_from(1000.0_f64).expect("integral");
        assert_eq!(count.get(), 1000);
    }

    #[test]
    fn test_parse() {
        assert_eq!("42".parse::<SampleCount>().expect("parse").get(), 42);
        assert_eq!(" 7 ".parse::<SampleCount>().expect("parse").get(), 7);
        assert_eq!("1e3".parse::<SampleCount>().expect("parse").get(), 1000);
        assert!("-3".parse::<SampleCount>().is_err());
        assert!("3.25".parse::<SampleCount>().is_err());
        assert!("lots".parse::<SampleCount>().is_err());
    }

    #[test]
    fn test_positive() {
        assert!(SampleCount::ZERO.positive().is_err());
        assert_eq!(SampleCount::new(3).positive().expect("positive").get(), 3);
    }

    #[test]
    fn test_serde() {
        let count: SampleCount = serde_json::from_str("500").expect("deserialize");
        assert_eq!(count.get(), 500);
        assert!(serde_json::from_str::<SampleCount>("-1").is_err());
        assert!(serde_json::from_str::<SampleCount>("1.5").is_err());
        assert_eq!(serde_json::to_string(&count).expect("serialize"), "500");
    }

    #[test]
    fn test_large_integers_stay_exact() {
        let count: SampleCount = serde_json::from_str("9007199254740993").expect("deserialize");
        assert_eq!(count.get() as u64, 9_007_199_254_740_993);
        let count: SampleCount = serde_yaml::from_str("9007199254740993").expect("deserialize");
        assert_eq!(count.get() as u64, 9_007_199_254_740_993);
        let count: SampleCount = serde_yaml::from_str("2000.0").expect("deserialize");
        assert_eq!(count.get(), 2000);
        assert!(serde_yaml::from_str::<SampleCount>("-4").is_err());
        assert!(serde_json::from_str::<SampleCount>("\"12\"").is_err());
    }
}
