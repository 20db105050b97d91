use thiserror::Error;

/// Rejections raised while turning a submitted check-in into a [`crate::models::CheckIn`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CheckInError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("unknown {kind} value '{value}'")]
    UnknownValue { kind: &'static str, value: String },
}
