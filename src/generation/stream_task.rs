//! Streaming task for a single submission
//!
//! Reads the completion stream and applies each fragment to the session,
//! as long as the submission that started it is still the current one.

use super::SessionState;
use crate::alert::AlertChannel;
use crate::completion::{CompletionRequest, CompletionService};
use crate::error::CompletionError;
use crate::events::UiEvent;
use futures_util::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

pub(crate) const GENERATION_ERROR_TITLE: &str = "Generation error!";

/// Everything a streaming task needs
pub(super) struct StreamTaskConfig {
    pub generation: u64,
    pub request: CompletionRequest,
    pub service: Arc<dyn CompletionService>,
    pub state: Arc<Mutex<SessionState>>,
    pub alerts: AlertChannel,
    pub event_tx: broadcast::Sender<UiEvent>,
    pub request_timeout: Option<Duration>,
}

/// How a stream stopped without error
enum StreamOutcome {
    Completed { chunks: usize },
    Superseded,
}

pub(super) fn lock_state(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("Session state mutex was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// Read the stream to its end, applying fragments while still current
async fn consume_stream(config: &StreamTaskConfig) -> Result<StreamOutcome, CompletionError> {
    let mut stream = config
        .service
        .stream_completion(config.request.clone())
        .await?;

    let mut chunks = 0usize;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let mut state = lock_state(&config.state);
        if !state.append_if_current(config.generation, &chunk) {
            return Ok(StreamOutcome::Superseded);
        }
        chunks += 1;
        let _ = config.event_tx.send(UiEvent::CompletionAppended { chunk });
    }

    Ok(StreamOutcome::Completed { chunks })
}

/// Clear the loading flag if this submission is still current
fn finish(config: &StreamTaskConfig) -> bool {
    let mut state = lock_state(&config.state);
    if !state.finish_if_current(config.generation) {
        return false;
    }
    let _ = config
        .event_tx
        .send(UiEvent::LoadingChanged { loading: false });
    true
}

/// Report a failed stream, leaving any partial completion in place
fn handle_generation_error(config: &StreamTaskConfig, e: &CompletionError) {
    if !finish(config) {
        debug!(error = %e, "Ignoring error from a superseded generation");
        return;
    }

    error!(error = %e, "Generation failed");
    config.alerts.raise(
        GENERATION_ERROR_TITLE,
        &format!("Please contact the system administrator: {}", e),
        super::gate::ALERT_ACTION,
    );
}

/// Run one submission's stream to completion
#[tracing::instrument(skip(config), fields(generation = config.generation))]
async fn run_stream_task(config: StreamTaskConfig) {
    let result = match config.request_timeout {
        Some(limit) => match timeout(limit, consume_stream(&config)).await {
            Ok(result) => result,
            Err(_) => Err(CompletionError::Timeout(limit)),
        },
        None => consume_stream(&config).await,
    };

    match result {
        Ok(StreamOutcome::Completed { chunks }) => {
            if finish(&config) {
                info!(chunks = chunks, "Generation finished");
            }
        }
        Ok(StreamOutcome::Superseded) => {
            info!("Generation superseded, discarding the rest of its stream");
        }
        Err(e) => handle_generation_error(&config, &e),
    }
}

/// Spawn the streaming task
pub(super) fn spawn_stream_task(config: StreamTaskConfig) -> JoinHandle<()> {
    tokio::spawn(run_stream_task(config))
}
