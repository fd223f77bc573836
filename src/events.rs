//! Events published to the presentation layer

/// Change to the generation state a front end renders
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum UiEvent {
    /// A new submission cleared the completion text
    CompletionReset,
    /// Text appended to the completion, in arrival order
    CompletionAppended { chunk: String },
    /// Request in flight (true) or finished (false)
    LoadingChanged { loading: bool },
}
