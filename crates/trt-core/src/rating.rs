//! # Attendance Ratings
//!
//! A 1–5 rating attached to each attendance record. Validated at
//! construction so a stored rating is always on the scale.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A training session rating on the 1–5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    /// Create a rating, validating the 1–5 range.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::RatingOutOfRange`] for 0 or anything
    /// above 5.
    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::RatingOutOfRange(value))
        }
    }

    /// The numeric value (1–5).
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = u8::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
