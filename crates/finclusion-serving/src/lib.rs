//! Serving layer for the financial inclusion predictor.
//!
//! This crate loads a pre-trained binary classifier from a local artifact, serves the
//! interactive form over HTTP and turns each submission into a prediction.
//!
//! # Overview
//!
//! - **ModelLoader**: reads the artifact once at start-up into a [`ModelStatus`]
//! - **Classifier**: the only capability required of a model, `predict`
//! - **Predictor**: encodes a raw record and asks the classifier for a label
//! - **Server**: axum HTTP server hosting the page, a small JSON API and a health check
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                  Browser / API                 │
//! └───────────────────────────────────────────────┘
//!                         │
//!                         ▼
//! ┌───────────────────────────────────────────────┐
//! │                 Server (axum)                  │
//! │   GET /   POST /predict   /api/*   /healthz    │
//! └───────────────────────────────────────────────┘
//!                         │
//!          ┌──────────────┴──────────────┐
//!          ▼                             ▼
//! ┌─────────────────┐          ┌──────────────────┐
//! │  FeatureSchema  │─encode──▶│    Predictor     │
//! └─────────────────┘          └──────────────────┘
//!                                        │
//!                                        ▼
//!                              ┌──────────────────┐
//!                              │ dyn Classifier   │◀── ModelLoader (once)
//!                              └──────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use finclusion_serving::{Server, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::builder()
//!     .host("0.0.0.0")
//!     .port(8501)
//!     .model_path("financial_model.json")
//!     .build();
//!
//! let server = Server::new(config);
//! server.run_until_shutdown().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Loading returns [`LoadError`]; prediction failures never escape as errors but come
//! back as [`PredictionOutcome::Failure`] with the underlying message.

pub mod app;
pub mod config;
pub mod error;
pub mod model;
pub mod model_loader;
pub mod page;
pub mod predictor;
pub mod server;

// Re-export main types at crate root for convenience
pub use app::{router, AppHealth, AppState};
pub use config::{ConfigError, ServerConfig};
pub use error::{LoadError, ServingError, ServingResult};
pub use model::{Classifier, ModelArtifact, ModelSpec};
pub use model_loader::{LoadedModel, ModelLoader, ModelStatus};
pub use predictor::{PredictionOutcome, Predictor, PredictorStats, Verdict};
pub use server::{HealthStatus, Server, ServerState};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
