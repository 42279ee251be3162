//! Domain errors for the Cadence recommendation engine.

use thiserror::Error;

/// Domain-level errors that can occur in the recommendation engine.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Feature vector has length {got}, model expects {expected}")]
    FeatureLengthMismatch { got: usize, expected: usize },

    #[error("Strategy arm index {0} is out of range")]
    ArmOutOfRange(usize),

    #[error("Stored model is incompatible: feature count {stored}, expected {expected}")]
    IncompatibleModel { stored: usize, expected: usize },

    #[error("Nothing to calibrate from: {0}")]
    CalibrationUnavailable(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Convenience alias for results carrying a [`DomainError`].
pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
