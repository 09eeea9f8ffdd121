//! Server configuration.
//!
//! [`ServerConfig`] can be built in code, read from a JSON file, or assembled by the CLI.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default artifact file name, looked up relative to the working directory.
pub const DEFAULT_MODEL_PATH: &str = "financial_model.json";

/// Default page title.
pub const DEFAULT_TITLE: &str = "Financial Inclusion Prediction App";

/// Configuration for the prediction server.
///
/// # Example
///
/// ```
/// use finclusion_serving::config::ServerConfig;
///
/// let config = ServerConfig::builder()
///     .host("127.0.0.1")
///     .port(8080)
///     .model_path("/models/financial_model.json")
///     .build();
/// assert_eq!(config.socket_addr(), "127.0.0.1:8080");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to (default: "0.0.0.0")
    pub host: String,

    /// Port to listen on (default: 8501)
    pub port: u16,

    /// Path to the serialized model artifact
    pub model_path: PathBuf,

    /// Page title
    pub title: String,

    /// Maximum accepted request body in bytes
    pub request_body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8501,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            title: DEFAULT_TITLE.to_string(),
            request_body_limit: 64 * 1024,
        }
    }
}

impl ServerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Read a configuration from a JSON file. Missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::InvalidConfigFile(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| ConfigError::InvalidConfigFile(format!("{}: {e}", path.display())))
    }

    /// Get the socket address string for binding.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// File name of the artifact, used in the user-facing load failure message.
    pub fn model_file_name(&self) -> String {
        self.model_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(DEFAULT_MODEL_PATH)
            .to_string()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.model_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyModelPath);
        }
        if self.request_body_limit == 0 {
            return Err(ConfigError::InvalidBodyLimit);
        }
        Ok(())
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    model_path: Option<PathBuf>,
    title: Option<String>,
    request_body_limit: Option<usize>,
}

impl ServerConfigBuilder {
    /// Set the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the port number.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the model artifact path.
    pub fn model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    /// Set the page title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the maximum request body size.
    pub fn request_body_limit(mut self, limit: usize) -> Self {
        self.request_body_limit = Some(limit);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ServerConfig {
        let default = ServerConfig::default();
        ServerConfig {
            host: self.host.unwrap_or(default.host),
            port: self.port.unwrap_or(default.port),
            model_path: self.model_path.unwrap_or(default.model_path),
            title: self.title.unwrap_or(default.title),
            request_body_limit: self
                .request_body_limit
                .unwrap_or(default.request_body_limit),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Invalid port number
    #[error("Invalid port number: port cannot be 0")]
    InvalidPort,

    /// Model path is empty
    #[error("Model path must not be empty")]
    EmptyModelPath,

    /// Invalid request body limit
    #[error("Invalid request body limit: must be greater than 0")]
    InvalidBodyLimit,

    /// Invalid configuration file
    #[error("Invalid configuration file: {0}")]
    InvalidConfigFile(String),
}
