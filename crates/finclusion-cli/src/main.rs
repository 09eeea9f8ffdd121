//! Finclusion CLI - serve the prediction page or run one-shot predictions.

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use finclusion_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("finclusion=info".parse()?))
        .init();

    let cli = Cli::parse();
    debug!("Parsed command: {:?}", cli.command);

    match cli.command {
        Commands::Serve(cmd) => cmd.run().await?,
        Commands::Predict(cmd) => cmd.run()?,
        Commands::Schema(cmd) => cmd.run()?,
    }

    Ok(())
}
