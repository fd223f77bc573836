//! Terminal front end
//!
//! Reads commands and prompt text from stdin and renders the streamed
//! completion, loading state and alerts on stdout.

mod commands;

use crate::alert::AlertState;
use crate::events::UiEvent;
use crate::generation::GenerationSession;
use crate::prompt::TRANSCRIPTION_PLACEHOLDER;
use crate::upload::VideoId;
use anyhow::Context;
use commands::{parse_line, Command, HELP};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Run the console until stdin closes or the user quits
pub(crate) async fn run(session: Arc<GenerationSession>) -> anyhow::Result<()> {
    println!("{}", HELP);

    let renderer = spawn_renderer(
        session.clone(),
        session.subscribe(),
        session.alerts().subscribe(),
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read console input")?
    {
        match parse_line(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => execute(&session, command),
            Err(e) => println!("{}", e),
        }
    }

    renderer.abort();
    Ok(())
}

/// Apply a command to the session
fn execute(session: &GenerationSession, command: Command) {
    match command {
        Command::Video(id) => {
            println!("Video: {}", id);
            session.on_video_uploaded(VideoId::new(id));
        }
        Command::Temperature(value) => {
            session.set_temperature(value);
            println!("Temperature: {:.1}", value);
        }
        Command::Prompt(text) => session.select_prompt(&text),
        Command::PromptLine(line) => session.append_prompt_line(&line),
        Command::Clear => session.set_prompt(""),
        Command::Submit => {
            // Refusals surface as alerts
            if let Ok(generation) = session.submit() {
                debug!(generation = generation, "Submission accepted");
            }
        }
        Command::Stop => {
            if !session.cancel() {
                println!("Nothing is being generated");
            }
        }
        Command::Dismiss => session.dismiss_alert(),
        Command::Show => show_state(session),
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
}

fn show_state(session: &GenerationSession) {
    let video = session
        .video_id()
        .map(|id| id.as_str().to_string())
        .unwrap_or_else(|| "(none)".to_string());

    println!("Video:       {}", video);
    println!("Temperature: {:.1}", session.temperature());
    println!("Generating:  {}", if session.is_loading() { "yes" } else { "no" });
    println!("Prompt:\n{}", session.prompt());
    if !session.prompt_references_transcription() {
        println!(
            "(Tip: add {} to the prompt to include the video transcription)",
            TRANSCRIPTION_PLACEHOLDER
        );
    }
    println!("Result:\n{}", session.completion());

    let alert = session.alert();
    if alert.visible {
        render_alert(&alert);
    }
}

fn render_alert(alert: &AlertState) {
    println!(
        "\n[{}] {}  ({}: /ok)",
        alert.title, alert.message, alert.action_text
    );
}

async fn render(
    session: Arc<GenerationSession>,
    mut events: broadcast::Receiver<UiEvent>,
    mut alerts: watch::Receiver<AlertState>,
) {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(UiEvent::CompletionReset) => println!("\n--- result ---"),
                Ok(UiEvent::CompletionAppended { chunk }) => {
                    print!("{}", chunk);
                    let _ = std::io::stdout().flush();
                }
                Ok(UiEvent::LoadingChanged { loading: true }) => {
                    println!("(generating, /stop to cancel)");
                }
                Ok(UiEvent::LoadingChanged { loading: false }) => println!("\n--- end ---"),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped = skipped, "Console renderer fell behind, redrawing");
                    println!("\n{}", session.completion());
                }
                Err(RecvError::Closed) => break,
            },
            changed = alerts.changed() => {
                if changed.is_err() {
                    break;
                }
                let alert = alerts.borrow_and_update().clone();
                if alert.visible {
                    render_alert(&alert);
                }
            }
        }
    }
}

fn spawn_renderer(
    session: Arc<GenerationSession>,
    events: broadcast::Receiver<UiEvent>,
    alerts: watch::Receiver<AlertState>,
) -> JoinHandle<()> {
    tokio::spawn(render(session, events, alerts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertChannel;
    use crate::completion::HttpCompletionClient;
    use crate::generation::SessionOptions;
    use crate::temperature::INITIAL_AI_TEMPERATURE;
    use std::time::Duration;
    use url::Url;

    fn offline_session() -> GenerationSession {
        let endpoint = Url::parse("http://127.0.0.1:9/ai/result").expect("valid url");
        let client =
            HttpCompletionClient::new(endpoint, Duration::from_secs(1)).expect("client");
        GenerationSession::new(
            Arc::new(client),
            AlertChannel::new(),
            SessionOptions {
                initial_temperature: INITIAL_AI_TEMPERATURE,
                request_timeout: None,
            },
        )
    }

    #[test]
    fn test_prompt_lines_build_up_the_prompt() {
        let session = offline_session();
        execute(&session, Command::PromptLine("Suggest titles for:".to_string()));
        execute(&session, Command::PromptLine("{transcription}".to_string()));
        assert_eq!(session.prompt(), "Suggest titles for:\n{transcription}");

        execute(&session, Command::Clear);
        assert_eq!(session.prompt(), "");

        execute(&session, Command::Prompt("One line summary".to_string()));
        assert_eq!(session.prompt(), "One line summary");
    }

    #[test]
    fn test_video_and_temperature_commands() {
        let session = offline_session();
        execute(&session, Command::Video("video-9".to_string()));
        execute(&session, Command::Temperature(0.3));

        assert_eq!(session.video_id(), Some(VideoId::new("video-9")));
        assert_eq!(session.temperature(), 0.3);
    }

    #[test]
    fn test_submit_without_video_shows_alert_and_ok_dismisses() {
        let session = offline_session();
        execute(&session, Command::PromptLine("Summarize".to_string()));
        execute(&session, Command::Submit);
        assert!(session.alert().visible);

        execute(&session, Command::Dismiss);
        assert!(!session.alert().visible);
        assert!(!session.is_loading());
    }
}
