//! Completion streaming
//!
//! Sends `{prompt, videoId, temperature}` to the generation service and
//! exposes the response body as an ordered stream of text fragments.

mod client;
mod decoder;

pub(crate) use client::HttpCompletionClient;

use crate::error::CompletionError;
use crate::upload::VideoId;
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use serde::Serialize;

/// Request body sent to the generation service
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompletionRequest {
    pub(crate) prompt: String,
    pub(crate) video_id: VideoId,
    pub(crate) temperature: f64,
}

/// Text fragments of one response, in arrival order
pub(crate) type CompletionStream = BoxStream<'static, Result<String, CompletionError>>;

/// Source of streamed completions
pub(crate) trait CompletionService: Send + Sync {
    /// Issue a single request and return its response stream.
    ///
    /// Fails before streaming when the request cannot be sent or the service
    /// rejects it.
    fn stream_completion(
        &self,
        request: CompletionRequest,
    ) -> BoxFuture<'static, Result<CompletionStream, CompletionError>>;
}
