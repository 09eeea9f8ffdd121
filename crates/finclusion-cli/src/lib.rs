//! Finclusion CLI Library
//!
//! Command-line interface for the financial inclusion predictor:
//!
//! - **Serve**: host the interactive prediction page over HTTP
//! - **Predict**: score one individual from flags and print the verdict
//! - **Schema**: print the feature schema as JSON
//!
//! # Example
//!
//! ```bash
//! # Serve the page on the default port
//! finclusion serve --model-path financial_model.json
//!
//! # Score one individual
//! finclusion predict --model-path financial_model.json --country Kenya --cellphone-access Yes
//!
//! # Inspect the schema
//! finclusion schema --pretty
//! ```

pub mod commands;

use clap::{Parser, Subcommand};

pub use commands::{PredictCommand, SchemaCommand, ServeCommand};

/// Finclusion - predicts whether an individual is likely to hold a bank account
#[derive(Parser, Debug)]
#[command(name = "finclusion")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the prediction page over HTTP
    Serve(ServeCommand),

    /// Predict for a single individual
    Predict(PredictCommand),

    /// Print the feature schema as JSON
    Schema(SchemaCommand),
}
