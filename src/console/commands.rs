//! Console command parsing

/// Temperature range offered to the user
pub(super) const MIN_TEMPERATURE: f64 = 0.0;
pub(super) const MAX_TEMPERATURE: f64 = 1.0;

/// A parsed input line
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Command {
    /// Video uploaded and transcribed under this id
    Video(String),
    Temperature(f64),
    /// Replace the whole prompt
    Prompt(String),
    /// Plain text, appended to the prompt
    PromptLine(String),
    Clear,
    Submit,
    Stop,
    Dismiss,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub(super) enum CommandError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Temperature must be a number between {MIN_TEMPERATURE} and {MAX_TEMPERATURE}")]
    TemperatureOutOfRange,

    #[error("Unknown command: /{0} (try /help)")]
    Unknown(String),
}

pub(super) const HELP: &str = "\
Commands:
  /video <id>     use the uploaded video with this id
  /temp <value>   set the temperature (0.0 - 1.0)
  /prompt <text>  replace the prompt
  /clear          clear the prompt
  /submit         generate a result
  /stop           stop the running generation
  /ok             dismiss the current alert
  /show           show the current state
  /help           show this help
  /quit           exit
Any other line is appended to the prompt. Use {transcription} to insert the video transcription.";

/// Parse one line of console input
pub(super) fn parse_line(line: &str) -> Result<Command, CommandError> {
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::PromptLine(line.to_string()));
    };

    let (name, argument) = match rest.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (rest, ""),
    };

    match name {
        "video" if argument.is_empty() => Err(CommandError::Usage("/video <id>")),
        "video" => Ok(Command::Video(argument.to_string())),
        "temp" => parse_temperature(argument),
        "prompt" => Ok(Command::Prompt(argument.to_string())),
        "clear" => Ok(Command::Clear),
        "submit" => Ok(Command::Submit),
        "stop" => Ok(Command::Stop),
        "ok" => Ok(Command::Dismiss),
        "show" => Ok(Command::Show),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn parse_temperature(argument: &str) -> Result<Command, CommandError> {
    if argument.is_empty() {
        return Err(CommandError::Usage("/temp <value>"));
    }
    match argument.parse::<f64>() {
        Ok(value) if (MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&value) => {
            Ok(Command::Temperature(value))
        }
        _ => Err(CommandError::TemperatureOutOfRange),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_prompt_line() {
        assert_eq!(
            parse_line("Write three titles for {transcription}"),
            Ok(Command::PromptLine(
                "Write three titles for {transcription}".to_string()
            ))
        );
        assert_eq!(parse_line(""), Ok(Command::PromptLine(String::new())));
    }

    #[test]
    fn test_video_command() {
        assert_eq!(
            parse_line("/video  3f2a-91 "),
            Ok(Command::Video("3f2a-91".to_string()))
        );
        assert_eq!(
            parse_line("/video"),
            Err(CommandError::Usage("/video <id>"))
        );
    }

    #[test]
    fn test_temperature_command() {
        assert_eq!(parse_line("/temp 0.7"), Ok(Command::Temperature(0.7)));
        assert_eq!(parse_line("/temp 1"), Ok(Command::Temperature(1.0)));
        assert_eq!(
            parse_line("/temp 1.5"),
            Err(CommandError::TemperatureOutOfRange)
        );
        assert_eq!(
            parse_line("/temp warm"),
            Err(CommandError::TemperatureOutOfRange)
        );
        assert_eq!(
            parse_line("/temp"),
            Err(CommandError::Usage("/temp <value>"))
        );
    }

    #[test]
    fn test_prompt_command_keeps_inner_text() {
        assert_eq!(
            parse_line("/prompt Summarize {transcription} in one line"),
            Ok(Command::Prompt(
                "Summarize {transcription} in one line".to_string()
            ))
        );
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse_line("/submit"), Ok(Command::Submit));
        assert_eq!(parse_line("/stop"), Ok(Command::Stop));
        assert_eq!(parse_line("/ok"), Ok(Command::Dismiss));
        assert_eq!(parse_line("/show"), Ok(Command::Show));
        assert_eq!(parse_line("/clear"), Ok(Command::Clear));
        assert_eq!(parse_line("/help"), Ok(Command::Help));
        assert_eq!(parse_line("/quit"), Ok(Command::Quit));
        assert_eq!(parse_line("/exit"), Ok(Command::Quit));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_line("/upload file.mp4"),
            Err(CommandError::Unknown("upload".to_string()))
        );
    }
}
