//! Prompt text and the streamed completion

/// Marker the generation service replaces with the video transcription.
///
/// Passed through untouched here.
pub(crate) const TRANSCRIPTION_PLACEHOLDER: &str = "{transcription}";

/// Prompt being edited and the completion produced for the last submission
#[derive(Debug, Default, Clone)]
pub(crate) struct PromptModel {
    input: String,
    completion: String,
}

impl PromptModel {
    pub(crate) fn input(&self) -> &str {
        &self.input
    }

    pub(crate) fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Append a line of prompt text, separated by a newline from what is there.
    pub(crate) fn append_input_line(&mut self, line: &str) {
        if !self.input.is_empty() {
            self.input.push('\n');
        }
        self.input.push_str(line);
    }

    /// Whether the prompt asks for the transcription to be inserted
    pub(crate) fn references_transcription(&self) -> bool {
        self.input.contains(TRANSCRIPTION_PLACEHOLDER)
    }

    pub(crate) fn completion(&self) -> &str {
        &self.completion
    }

    pub(crate) fn reset_completion(&mut self) {
        self.completion.clear();
    }

    pub(crate) fn append_completion(&mut self, chunk: &str) {
        self.completion.push_str(chunk);
    }
}
