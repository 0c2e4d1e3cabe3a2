//! Request body extraction and validation.
//!
//! Handlers take `Result<Json<T>, JsonRejection>` so malformed JSON surfaces
//! as a structured 422 instead of axum's default plain-text rejection, then
//! run the body through its [`Validate`] impl before touching state.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Field-level validation for request bodies, run after deserialization.
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

/// Unwrap a JSON body, mapping rejections to 422 and running validation.
pub fn extract_validated_json<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let Json(value) = body.map_err(|err| AppError::BadRequest(err.body_text()))?;
    value.validate()?;
    Ok(value)
}

/// Reject empty or whitespace-only strings for a named field.
pub fn require_non_empty(value: &str, field: &'static str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        Err(trt_core::ValidationError::empty(field).into())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Body {
        name: String,
    }

    impl Validate for Body {
        fn validate(&self) -> Result<(), AppError> {
            require_non_empty(&self.name, "name")
        }
    }

    #[test]
    fn valid_body_passes() {
        let body = Ok(Json(Body {
            name: "Amira".into(),
        }));
        assert!(extract_validated_json(body).is_ok());
    }

    #[test]
    fn invalid_body_is_validation_error() {
        let body = Ok(Json(Body { name: "  ".into() }));
        match extract_validated_json(body) {
            Err(AppError::Validation(msg)) => assert!(msg.contains("name")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn require_non_empty_trims() {
        assert!(require_non_empty("x", "f").is_ok());
        match require_non_empty("\t", "f") {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "f must not be empty"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
