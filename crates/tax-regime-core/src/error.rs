use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaxRegimeError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Missing reference rate: {field} — {hint}")]
    MissingReferenceRate { field: String, hint: String },

    #[error("Out of range: {field} = {value} (expected {expected})")]
    OutOfRange {
        field: String,
        value: Decimal,
        expected: String,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for TaxRegimeError {
    fn from(e: serde_json::Error) -> Self {
        TaxRegimeError::SerializationError(e.to_string())
    }
}
