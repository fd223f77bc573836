//! Submission preconditions

use crate::alert::AlertChannel;
use crate::upload::VideoId;

pub(crate) const ATTENTION_TITLE: &str = "Attention!";
pub(crate) const ALERT_ACTION: &str = "Ok";

/// Reason a submission was refused before any request was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ValidationError {
    #[error("Please upload a video before generate a result")]
    MissingVideo,

    #[error("Please select a prompt before generate a result")]
    MissingPrompt,
}

impl ValidationError {
    /// Show this error through the alert slot
    pub(crate) fn raise(self, alerts: &AlertChannel) {
        alerts.raise(ATTENTION_TITLE, &self.to_string(), ALERT_ACTION);
    }
}

/// Check a submission, video first and then prompt.
///
/// The prompt is not looked at when the video is missing.
pub(crate) fn check_submission<'a>(
    video_id: Option<&'a VideoId>,
    prompt: &str,
) -> Result<&'a VideoId, ValidationError> {
    let video_id = video_id.ok_or(ValidationError::MissingVideo)?;
    if prompt.is_empty() {
        return Err(ValidationError::MissingPrompt);
    }
    Ok(video_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_video_wins_over_missing_prompt() {
        assert_eq!(check_submission(None, ""), Err(ValidationError::MissingVideo));
        assert_eq!(
            check_submission(None, "a prompt"),
            Err(ValidationError::MissingVideo)
        );
    }

    #[test]
    fn test_empty_prompt_is_rejected() {
        let id = VideoId::new("video-1");
        assert_eq!(
            check_submission(Some(&id), ""),
            Err(ValidationError::MissingPrompt)
        );
    }

    #[test]
    fn test_whitespace_prompt_is_accepted() {
        let id = VideoId::new("video-1");
        assert_eq!(check_submission(Some(&id), " "), Ok(&id));
    }

    #[test]
    fn test_raise_uses_attention_alert() {
        let alerts = AlertChannel::new();
        ValidationError::MissingPrompt.raise(&alerts);

        let state = alerts.current();
        assert_eq!(state.title, "Attention!");
        assert_eq!(
            state.message,
            "Please select a prompt before generate a result"
        );
        assert_eq!(state.action_text, "Ok");
        assert!(state.visible);
    }
}
