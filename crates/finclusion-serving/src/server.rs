//! HTTP server lifecycle.
//!
//! [`Server`] validates the configuration, performs the one-time model load, binds the
//! listener and serves the router from [`crate::app`] until it is stopped.

use crate::app::{router, AppState};
use crate::config::ServerConfig;
use crate::error::{ServingError, ServingResult};
use crate::model_loader::{ModelLoader, ModelStatus};
use finclusion_core::FeatureSchema;
use parking_lot::RwLock;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Server state enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerState {
    /// Server is not started
    Stopped,
    /// Server is starting up
    Starting,
    /// Server is running and ready
    Running,
    /// Server is shutting down
    ShuttingDown,
    /// Server encountered an error
    Error,
}

/// Health status of the server.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Running with a loaded model
    pub healthy: bool,

    /// Server state
    pub state: ServerState,

    /// Whether the model is loaded
    pub model_loaded: bool,

    /// Server uptime in seconds
    pub uptime_secs: u64,

    /// Bound address, once running
    pub local_addr: Option<SocketAddr>,
}

/// The prediction page server.
///
/// # Example
///
/// ```no_run
/// use finclusion_serving::config::ServerConfig;
/// use finclusion_serving::server::Server;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ServerConfig::builder()
///     .host("127.0.0.1")
///     .port(8501)
///     .model_path("financial_model.json")
///     .build();
///
/// let server = Server::new(config);
/// server.start().await?;
///
/// // Serving...
///
/// server.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct Server {
    /// Server configuration
    config: ServerConfig,

    /// Feature schema shared by the form and the encoder
    schema: FeatureSchema,

    /// Current server state
    state: RwLock<ServerState>,

    /// Request context, created on start
    app_state: RwLock<Option<Arc<AppState>>>,

    /// Server start time
    start_time: RwLock<Option<Instant>>,

    /// Bound address
    local_addr: RwLock<Option<SocketAddr>>,

    /// Shutdown signal sender
    shutdown_tx: RwLock<Option<oneshot::Sender<()>>>,

    /// Serving task
    handle: RwLock<Option<JoinHandle<()>>>,
}

impl Server {
    /// Create a new server with the built-in schema.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_schema(config, FeatureSchema::financial_inclusion())
    }

    /// Create a new server with a custom schema.
    pub fn with_schema(config: ServerConfig, schema: FeatureSchema) -> Self {
        Self {
            config,
            schema,
            state: RwLock::new(ServerState::Stopped),
            app_state: RwLock::new(None),
            start_time: RwLock::new(None),
            local_addr: RwLock::new(None),
            shutdown_tx: RwLock::new(None),
            handle: RwLock::new(None),
        }
    }

    /// Validate the configuration, bind the configured address and start serving.
    pub async fn start(&self) -> ServingResult<SocketAddr> {
        self.config.validate().map_err(|e| {
            *self.state.write() = ServerState::Error;
            ServingError::config(e.to_string())
        })?;

        let listener = TcpListener::bind(self.config.socket_addr())
            .await
            .map_err(|e| {
                *self.state.write() = ServerState::Error;
                ServingError::server(format!(
                    "Failed to bind {}: {e}",
                    self.config.socket_addr()
                ))
            })?;
        self.start_with_listener(listener).await
    }

    /// Start serving on an already bound listener.
    ///
    /// The model artifact is loaded here, once. A load failure does not abort the start:
    /// the server runs and every page shows the halted message.
    pub async fn start_with_listener(&self, listener: TcpListener) -> ServingResult<SocketAddr> {
        {
            let mut state = self.state.write();
            let current = *state;
            match current {
                ServerState::Running => {
                    drop(state);
                    warn!("Server is already running");
                    return self
                        .local_addr()
                        .ok_or_else(|| ServingError::server("Running server has no address"));
                }
                ServerState::Starting => {
                    return Err(ServingError::server("Server is already starting"));
                }
                ServerState::ShuttingDown => {
                    return Err(ServingError::server("Server is shutting down"));
                }
                ServerState::Stopped | ServerState::Error => *state = ServerState::Starting,
            }
        }
        info!("Starting prediction server...");

        let loader = ModelLoader::new(
            self.schema
                .column_names()
                .into_iter()
                .map(String::from)
                .collect(),
        );
        let status = loader.load_status(&self.config.model_path);
        if let ModelStatus::Failed { error, .. } = &status {
            warn!("Serving halted page: {}", error);
        }

        let app_state = Arc::new(AppState::new(&self.config, self.schema.clone(), status));
        let app = router(Arc::clone(&app_state), self.config.request_body_limit);

        let addr = listener.local_addr().map_err(|e| {
            *self.state.write() = ServerState::Error;
            ServingError::from(e)
        })?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                error!("HTTP server error: {}", e);
            }
        });

        *self.app_state.write() = Some(app_state);
        *self.shutdown_tx.write() = Some(shutdown_tx);
        *self.handle.write() = Some(handle);
        *self.local_addr.write() = Some(addr);
        *self.start_time.write() = Some(Instant::now());
        *self.state.write() = ServerState::Running;

        info!("Server started on http://{}", addr);
        Ok(addr)
    }

    /// Stop the server gracefully, letting in-flight requests complete.
    pub async fn stop(&self) -> ServingResult<()> {
        if *self.state.read() == ServerState::Stopped {
            return Ok(());
        }

        info!("Stopping server...");
        *self.state.write() = ServerState::ShuttingDown;

        let tx = self.shutdown_tx.write().take();
        if let Some(tx) = tx {
            let _ = tx.send(());
        }
        let handle = self.handle.write().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Serving task failed: {}", e);
            }
        }

        *self.app_state.write() = None;
        *self.local_addr.write() = None;
        *self.start_time.write() = None;
        *self.state.write() = ServerState::Stopped;

        info!("Server stopped");
        Ok(())
    }

    /// Serve until Ctrl-C, then stop.
    pub async fn run_until_shutdown(&self) -> ServingResult<()> {
        self.start().await?;
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| ServingError::server(format!("Failed to listen for shutdown signal: {e}")))?;
        info!("Received shutdown signal");
        self.stop().await
    }

    /// Get the current health status of the server.
    pub fn health(&self) -> HealthStatus {
        let state = *self.state.read();
        let model_loaded = self
            .app_state
            .read()
            .as_ref()
            .map(|s| s.status().is_ready())
            .unwrap_or(false);
        let uptime_secs = self
            .start_time
            .read()
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0);

        HealthStatus {
            healthy: state == ServerState::Running && model_loaded,
            state,
            model_loaded,
            uptime_secs,
            local_addr: self.local_addr(),
        }
    }

    /// Get the current server state.
    pub fn state(&self) -> ServerState {
        *self.state.read()
    }

    /// Bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.read()
    }

    /// The request context while running.
    pub fn app_state(&self) -> Option<Arc<AppState>> {
        self.app_state.read().clone()
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("state", &*self.state.read())
            .field("local_addr", &*self.local_addr.read())
            .finish()
    }
}
