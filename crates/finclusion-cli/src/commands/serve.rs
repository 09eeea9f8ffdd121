//! Serve Command Implementation
//!
//! Hosts the interactive prediction page. The artifact is loaded once at start-up; if it
//! cannot be loaded the server still runs and every page shows the load failure message.

use anyhow::{Context, Result};
use clap::Args;
use finclusion_serving::{Server, ServerConfig};
use std::path::PathBuf;
use tracing::info;

/// Serve the prediction page over HTTP
///
/// Flags override values read from `--config`, which override the defaults.
///
/// # Example
///
/// ```bash
/// finclusion serve \
///     --model-path financial_model.json \
///     --port 8501
/// ```
#[derive(Args, Debug, Clone, Default)]
pub struct ServeCommand {
    /// Path to the serialized model artifact
    #[arg(long, short = 'm', env = "FINCLUSION_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, short = 'p', env = "FINCLUSION_PORT")]
    pub port: Option<u16>,

    /// Host address to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Page title
    #[arg(long)]
    pub title: Option<String>,

    /// JSON server configuration file
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

impl ServeCommand {
    /// Execute the serve command
    pub async fn run(&self) -> Result<()> {
        let config = self.resolve_config()?;
        info!("Model artifact: {:?}", config.model_path);
        info!("Listening on {}", config.socket_addr());

        let server = Server::new(config);
        server
            .run_until_shutdown()
            .await
            .context("Prediction server failed")?;

        info!("Server stopped");
        Ok(())
    }

    /// Merge the config file, if any, with the command-line overrides.
    pub fn resolve_config(&self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)
                .with_context(|| format!("Failed to read config file {:?}", path))?,
            None => ServerConfig::default(),
        };

        if let Some(model_path) = &self.model_path {
            config.model_path = model_path.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(title) = &self.title {
            config.title = title.clone();
        }

        config.validate().context("Invalid server configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_without_flags() {
        let config = ServeCommand::default().resolve_config().unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.socket_addr(), "0.0.0.0:8501");
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"port": 9000, "host": "127.0.0.1", "title": "From file"}}"#).unwrap();

        let cmd = ServeCommand {
            port: Some(9100),
            model_path: Some(PathBuf::from("/models/financial_model.json")),
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let config = cmd.resolve_config().unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.title, "From file");
        assert_eq!(config.model_path, PathBuf::from("/models/financial_model.json"));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let cmd = ServeCommand {
            port: Some(0),
            ..Default::default()
        };
        let err = cmd.resolve_config().unwrap_err();
        assert!(err.to_string().contains("Invalid server configuration"));
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cmd = ServeCommand {
            config: Some(PathBuf::from("/nonexistent/finclusion.json")),
            ..Default::default()
        };
        assert!(cmd.resolve_config().is_err());
    }
}
