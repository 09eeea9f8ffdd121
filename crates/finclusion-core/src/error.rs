//! Error types for the finclusion-core crate.
//!
//! Covers schema validation, form collection and categorical encoding.

use thiserror::Error;

/// The main error type for finclusion-core operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A categorical value has no entry in its field's mapping table.
    #[error("Unknown category {value:?} for field '{field}'")]
    UnknownCategory {
        /// The field being encoded.
        field: String,
        /// The value that could not be mapped.
        value: String,
    },

    /// A field received a value of the wrong kind (text where an integer belongs, or vice versa).
    #[error("Field '{field}' expects {expected} value")]
    TypeMismatch {
        /// The offending field.
        field: String,
        /// Human readable description of the expected kind.
        expected: &'static str,
    },

    /// A numeric value fell below the field's minimum.
    #[error("Field '{field}' must be at least {min}, got {value}")]
    BelowMinimum {
        /// The offending field.
        field: String,
        /// The declared minimum.
        min: i64,
        /// The submitted value.
        value: i64,
    },

    /// A numeric value could not be parsed as an integer.
    #[error("Field '{field}' expects an integer, got {value:?}")]
    InvalidNumber {
        /// The offending field.
        field: String,
        /// The raw submitted text.
        value: String,
    },

    /// A record does not have one value per schema column.
    #[error("Record has {actual} columns, schema expects {expected}")]
    ColumnCount {
        /// Number of columns declared by the schema.
        expected: usize,
        /// Number of values in the record.
        actual: usize,
    },

    /// The schema itself is inconsistent.
    #[error("Invalid schema: {message}")]
    InvalidSchema {
        /// A description of the inconsistency.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid-schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }

    /// Returns the name of the field this error relates to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::UnknownCategory { field, .. }
            | Self::TypeMismatch { field, .. }
            | Self::BelowMinimum { field, .. }
            | Self::InvalidNumber { field, .. } => Some(field),
            Self::ColumnCount { .. } | Self::InvalidSchema { .. } => None,
        }
    }
}

/// A specialized Result type for finclusion-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
