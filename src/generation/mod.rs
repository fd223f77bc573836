//! Generation session
//!
//! Ties the prompt, the selected video, the temperature and the alert slot
//! together and runs submissions against the completion service.
//!
//! # Lifecycle
//! Every accepted submission gets a new generation number. The completion is
//! reset and the loading flag raised, then a task streams the response into
//! the session. A fragment is applied only if its generation is still the
//! current one, so a newer submission (or a cancel) silently drops whatever
//! an older stream still delivers.

mod gate;
mod stream_task;

pub(crate) use gate::ValidationError;

use crate::alert::{AlertChannel, AlertState};
use crate::completion::{CompletionRequest, CompletionService};
use crate::events::UiEvent;
use crate::prompt::PromptModel;
use crate::temperature::TemperatureControl;
use crate::upload::{UploadIdentity, VideoId};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use stream_task::{lock_state, spawn_stream_task, StreamTaskConfig};

/// Prompt model plus the bookkeeping of the current request
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    prompt: PromptModel,
    /// Generation of the most recent submission (0 = none yet)
    generation: u64,
    loading: bool,
}

impl SessionState {
    /// Start a new generation, superseding any in flight
    fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.prompt.reset_completion();
        self.loading = true;
        self.generation
    }

    fn append_if_current(&mut self, generation: u64, chunk: &str) -> bool {
        if generation != self.generation {
            return false;
        }
        self.prompt.append_completion(chunk);
        true
    }

    fn finish_if_current(&mut self, generation: u64) -> bool {
        if generation != self.generation || !self.loading {
            return false;
        }
        self.loading = false;
        true
    }

    /// Abandon the current generation without starting another
    fn cancel(&mut self) -> bool {
        if !self.loading {
            return false;
        }
        self.generation += 1;
        self.loading = false;
        true
    }
}

/// Tunables for a session
#[derive(Debug, Clone, Copy)]
pub(crate) struct SessionOptions {
    pub(crate) initial_temperature: f64,
    /// Upper bound for a whole generation (None = wait indefinitely)
    pub(crate) request_timeout: Option<Duration>,
}

/// The generation workflow behind the UI
pub(crate) struct GenerationSession {
    service: Arc<dyn CompletionService>,
    alerts: AlertChannel,
    upload: UploadIdentity,
    temperature: TemperatureControl,
    state: Arc<Mutex<SessionState>>,
    active_task: Mutex<Option<JoinHandle<()>>>,
    event_tx: broadcast::Sender<UiEvent>,
    request_timeout: Option<Duration>,
}

impl GenerationSession {
    pub(crate) fn new(
        service: Arc<dyn CompletionService>,
        alerts: AlertChannel,
        options: SessionOptions,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            service,
            alerts,
            upload: UploadIdentity::new(),
            temperature: TemperatureControl::new(options.initial_temperature),
            state: Arc::new(Mutex::new(SessionState::default())),
            active_task: Mutex::new(None),
            event_tx,
            request_timeout: options.request_timeout,
        }
    }

    /// Subscribe to completion and loading updates
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: UiEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        match self.active_task.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Active task mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    // Upload pipeline

    /// Callback for the upload pipeline
    pub(crate) fn on_video_uploaded(&self, id: VideoId) {
        self.upload.on_video_uploaded(id);
    }

    pub(crate) fn video_id(&self) -> Option<VideoId> {
        self.upload.get()
    }

    // Temperature

    pub(crate) fn set_temperature(&self, value: f64) {
        self.temperature.set(value);
    }

    pub(crate) fn temperature(&self) -> f64 {
        self.temperature.get()
    }

    // Prompt

    pub(crate) fn prompt(&self) -> String {
        lock_state(&self.state).prompt.input().to_string()
    }

    pub(crate) fn set_prompt(&self, text: impl Into<String>) {
        lock_state(&self.state).prompt.set_input(text);
    }

    /// Replace the prompt with a chosen template
    pub(crate) fn select_prompt(&self, template: &str) {
        info!(template_len = template.len(), "Prompt selected");
        self.set_prompt(template);
    }

    pub(crate) fn append_prompt_line(&self, line: &str) {
        lock_state(&self.state).prompt.append_input_line(line);
    }

    pub(crate) fn prompt_references_transcription(&self) -> bool {
        lock_state(&self.state).prompt.references_transcription()
    }

    pub(crate) fn completion(&self) -> String {
        lock_state(&self.state).prompt.completion().to_string()
    }

    pub(crate) fn is_loading(&self) -> bool {
        lock_state(&self.state).loading
    }

    // Alerts

    pub(crate) fn alerts(&self) -> &AlertChannel {
        &self.alerts
    }

    pub(crate) fn alert(&self) -> AlertState {
        self.alerts.current()
    }

    pub(crate) fn dismiss_alert(&self) {
        self.alerts.dismiss();
    }

    // Submission

    /// Submit the current prompt for generation.
    ///
    /// Refused submissions raise an alert and send nothing. Accepted ones
    /// supersede any generation still in flight and return the new
    /// generation number.
    pub(crate) fn submit(&self) -> Result<u64, ValidationError> {
        let video_id = self.upload.get();

        let accepted = {
            let mut state = lock_state(&self.state);
            match gate::check_submission(video_id.as_ref(), state.prompt.input()) {
                Ok(video_id) => {
                    let request = CompletionRequest {
                        prompt: state.prompt.input().to_string(),
                        video_id: video_id.clone(),
                        temperature: self.temperature.get(),
                    };
                    let was_loading = state.loading;
                    let generation = state.begin();
                    self.emit(UiEvent::CompletionReset);
                    if !was_loading {
                        self.emit(UiEvent::LoadingChanged { loading: true });
                    }
                    Ok((generation, request))
                }
                Err(e) => Err(e),
            }
        };

        let (generation, request) = match accepted {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(reason = %e, "Submission rejected");
                e.raise(&self.alerts);
                return Err(e);
            }
        };

        info!(
            generation = generation,
            video_id = %request.video_id,
            temperature = request.temperature,
            "Submitting generation"
        );

        let handle = spawn_stream_task(StreamTaskConfig {
            generation,
            request,
            service: self.service.clone(),
            state: self.state.clone(),
            alerts: self.alerts.clone(),
            event_tx: self.event_tx.clone(),
            request_timeout: self.request_timeout,
        });

        if let Some(previous) = self.lock_task().replace(handle) {
            if !previous.is_finished() {
                info!("Superseding in-flight generation");
            }
            previous.abort();
        }

        Ok(generation)
    }

    /// Stop the generation in flight, keeping what has streamed so far.
    ///
    /// Returns false when nothing was in flight.
    pub(crate) fn cancel(&self) -> bool {
        let cancelled = {
            let mut state = lock_state(&self.state);
            let cancelled = state.cancel();
            if cancelled {
                self.emit(UiEvent::LoadingChanged { loading: false });
            }
            cancelled
        };

        if cancelled {
            if let Some(handle) = self.lock_task().take() {
                handle.abort();
            }
            info!("Generation cancelled");
        }
        cancelled
    }
}

impl Drop for GenerationSession {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_task().take() {
            handle.abort();
        }
    }
}
