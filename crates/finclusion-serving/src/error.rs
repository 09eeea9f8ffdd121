//! Error types for the finclusion-serving crate.
//!
//! [`LoadError`] covers the one-time model artifact load; [`ServingError`] covers
//! everything afterwards.

use std::path::PathBuf;

use finclusion_core::CoreError;
use thiserror::Error;

/// Result type alias for serving operations.
pub type ServingResult<T> = Result<T, ServingError>;

/// Why the model artifact could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Nothing exists at the artifact path.
    #[error("Model artifact not found: {0:?}")]
    NotFound(PathBuf),

    /// The file exists but could not be read.
    #[error("Failed to read model artifact {path:?}: {source}")]
    Unreadable {
        /// Artifact path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a well-formed artifact document.
    #[error("Corrupt model artifact {path:?}: {message}")]
    Corrupt {
        /// Artifact path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// The artifact was written by an incompatible exporter.
    #[error("Unsupported model artifact version {found} (supported: {supported})")]
    UnsupportedVersion {
        /// Version found in the file.
        found: u32,
        /// Version this build reads.
        supported: u32,
    },

    /// The artifact parsed but its contents are inconsistent.
    #[error("Invalid model artifact: {0}")]
    Invalid(String),
}

impl LoadError {
    /// Short machine readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Unreadable { .. } => "unreadable",
            Self::Corrupt { .. } => "corrupt",
            Self::UnsupportedVersion { .. } => "unsupported_version",
            Self::Invalid(_) => "invalid",
        }
    }

    /// Create an invalid-artifact error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Errors that can occur while serving predictions.
#[derive(Debug, Error)]
pub enum ServingError {
    /// Model loading failed.
    #[error("Failed to load model: {0}")]
    ModelLoadError(#[from] LoadError),

    /// No model is available.
    #[error("No model is currently loaded")]
    ModelNotLoaded,

    /// Collecting or encoding the record failed.
    #[error(transparent)]
    Encoding(#[from] CoreError),

    /// The model rejected the input or failed internally.
    #[error("{0}")]
    PredictionError(String),

    /// Server error.
    #[error("Server error: {0}")]
    ServerError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ServingError {
    /// Create a prediction error.
    pub fn prediction(msg: impl Into<String>) -> Self {
        Self::PredictionError(msg.into())
    }

    /// Create a server error.
    pub fn server(msg: impl Into<String>) -> Self {
        Self::ServerError(msg.into())
    }

    /// Create a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Check if this is a client error (bad request or bad form input).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_) | Self::Encoding(_))
    }

    /// Check if the failure happened during a prediction and leaves the service usable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Encoding(_) | Self::PredictionError(_))
    }
}

impl From<candle_core::Error> for ServingError {
    fn from(err: candle_core::Error) -> Self {
        ServingError::PredictionError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServingError::ModelNotLoaded;
        assert_eq!(err.to_string(), "No model is currently loaded");

        let err = ServingError::prediction("X has 10 features, but model expects 11");
        assert_eq!(err.to_string(), "X has 10 features, but model expects 11");

        let err: ServingError = LoadError::NotFound(PathBuf::from("m.json")).into();
        assert_eq!(
            err.to_string(),
            "Failed to load model: Model artifact not found: \"m.json\""
        );
    }

    #[test]
    fn test_encoding_error_is_transparent() {
        let err: ServingError = CoreError::UnknownCategory {
            field: "country".into(),
            value: "Atlantis".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Unknown category \"Atlantis\" for field 'country'"
        );
        assert!(err.is_client_error());
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_load_error_kinds() {
        assert_eq!(LoadError::NotFound(PathBuf::new()).kind(), "not_found");
        assert_eq!(
            LoadError::UnsupportedVersion {
                found: 9,
                supported: 1
            }
            .kind(),
            "unsupported_version"
        );
        assert_eq!(LoadError::invalid("bad").kind(), "invalid");

        let err: ServingError = LoadError::invalid("bad").into();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let serving_err: ServingError = io_err.into();
        assert!(matches!(serving_err, ServingError::IoError(_)));
    }
}
