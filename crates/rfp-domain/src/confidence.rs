//! Confidence scalar

use serde::{Deserialize, Serialize};
use std::fmt;

/// Extraction certainty in `[0.0, 1.0]`
///
/// A `Confidence` can only be built from a finite value inside the unit
/// interval, so every record carrying one is known to be in range.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    /// Full certainty, used for manually entered records
    pub const CERTAIN: Confidence = Confidence(1.0);

    /// Create a confidence value
    ///
    /// # Examples
    ///
    /// ```
    /// use rfp_domain::Confidence;
    ///
    /// assert!(Confidence::new(0.92).is_ok());
    /// assert!(Confidence::new(1.2).is_err());
    /// assert!(Confidence::new(f64::NAN).is_err());
    /// ```
    pub fn new(value: f64) -> Result<Self, String> {
        if !value.is_finite() {
            return Err(format!("confidence {} is not a finite number", value));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(format!("confidence {} out of range [0.0, 1.0]", value));
        }
        Ok(Self(value))
    }

    /// Get the raw value
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Check whether this confidence reaches `threshold`
    pub fn meets(&self, threshold: f64) -> bool {
        self.0 >= threshold
    }
}

impl TryFrom<f64> for Confidence {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(confidence: Confidence) -> Self {
        confidence.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_bounds() {
        assert!(Confidence::new(0.0).is_ok());
        assert!(Confidence::new(1.0).is_ok());
        assert!(Confidence::new(-0.01).is_err());
        assert!(Confidence::new(1.01).is_err());
        assert!(Confidence::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_meets_threshold() {
        let c = Confidence::new(0.5).unwrap();
        assert!(c.meets(0.5));
        assert!(c.meets(0.3));
        assert!(!c.meets(0.51));
    }

    #[test]
    fn test_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Confidence>("0.75").is_ok());
        assert!(serde_json::from_str::<Confidence>("1.5").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Confidence::new(0.923).unwrap().to_string(), "0.92");
    }
}
