//! # Validation Errors
//!
//! Structured validation errors raised at type-construction boundaries.
//! Downstream layers convert these into their own error surface (the API
//! maps them to 422 responses).

use thiserror::Error;

/// A domain value failed validation at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A name field was empty or whitespace-only.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Which field was empty (e.g. "name", "trainer_name").
        field: &'static str,
    },

    /// A department string outside the fixed catalog.
    #[error("unknown department: {0:?}")]
    UnknownDepartment(String),

    /// A role string outside the fixed set.
    #[error("unknown role: {0:?}")]
    UnknownRole(String),

    /// A rating outside the 1–5 scale.
    #[error("rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(u8),

    /// A lookback window of zero days.
    #[error("lookback window must be at least 1 day")]
    EmptyLookbackWindow,
}

impl ValidationError {
    /// Convenience constructor for empty-field errors.
    pub fn empty(field: &'static str) -> Self {
        Self::EmptyField { field }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        assert_eq!(
            ValidationError::empty("trainer_name").to_string(),
            "trainer_name must not be empty"
        );
        assert!(ValidationError::UnknownDepartment("X".into())
            .to_string()
            .contains("\"X\""));
        assert!(ValidationError::RatingOutOfRange(9)
            .to_string()
            .contains('9'));
    }
}
