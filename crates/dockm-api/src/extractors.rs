//! # Extraction & Validation Helpers
//!
//! Maps axum extractor rejections to [`AppError`] so every client error uses
//! the structured error body, and provides the [`Validate`] trait for request
//! DTOs.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::Json;

use crate::error::AppError;

/// Trait for request types that can validate their business rules
/// beyond what serde deserialization checks.
pub trait Validate {
    /// Validate business rules. Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Extract path parameters, mapping parse errors to [`AppError::BadRequest`].
pub fn extract_path<T>(result: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    result
        .map(|Path(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(String);

    impl Validate for Named {
        fn validate(&self) -> Result<(), String> {
            if self.0.is_empty() {
                Err("name must not be empty".into())
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn validate_reports_message() {
        assert!(Named("web".into()).validate().is_ok());
        assert_eq!(
            Named(String::new()).validate().unwrap_err(),
            "name must not be empty"
        );
    }

    #[test]
    fn extract_json_passes_value_through() {
        let value = extract_json(Ok(Json(5u32))).unwrap();
        assert_eq!(value, 5);
    }
}
