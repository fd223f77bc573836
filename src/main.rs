#![deny(clippy::all)]

mod alert;
mod completion;
mod config;
mod console;
mod error;
mod events;
mod generation;
mod prompt;
mod temperature;
mod upload;

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

// Re-export error types (used by other modules)
#[allow(unused_imports)]
pub use error::*;

/// Initialize structured logging on stderr; stdout belongs to the console
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from embedded config.toml plus environment
    let config = config::load_config()?;

    init_tracing(&config.logging.level);

    let endpoint = config.endpoint()?;
    info!(
        endpoint = %endpoint,
        request_timeout_secs = ?config.completion.request_timeout_secs,
        "Using completion endpoint"
    );

    let client = completion::HttpCompletionClient::new(endpoint, config.connect_timeout())?;

    // Create shared generation session
    let session = Arc::new(generation::GenerationSession::new(
        Arc::new(client),
        alert::AlertChannel::new(),
        config.session_options(),
    ));

    console::run(session).await?;

    info!("Exiting");
    Ok(())
}
