//! HTTP client for the generation service.
//!
//! Posts a JSON body and reads the response as a plain text stream. There is
//! no framing: the end of the body is the end of the completion.

use super::decoder::Utf8ChunkDecoder;
use super::{CompletionRequest, CompletionService, CompletionStream};
use crate::error::CompletionError;
use anyhow::Context;
use futures_util::future::BoxFuture;
use futures_util::stream::{self, BoxStream};
use futures_util::{FutureExt, Stream, StreamExt};
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

/// Client for the streaming completion endpoint.
pub(crate) struct HttpCompletionClient {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpCompletionClient {
    /// Create a client for `endpoint`.
    ///
    /// Only the connection phase is bounded; the body may stream for as long
    /// as the service keeps it open.
    pub(crate) fn new(endpoint: Url, connect_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .context("Failed to create HTTP client for HttpCompletionClient")?;

        Ok(Self { endpoint, client })
    }

    #[instrument(
        skip(client, request),
        fields(video_id = %request.video_id, prompt_len = request.prompt.len())
    )]
    async fn send(
        client: reqwest::Client,
        endpoint: Url,
        request: CompletionRequest,
    ) -> Result<CompletionStream, CompletionError> {
        let response = client
            .post(endpoint)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(CompletionError::ServerError { status, message });
        }

        info!(status = response.status().as_u16(), "Completion stream opened");
        Ok(decode_body(response.bytes_stream()))
    }
}

impl CompletionService for HttpCompletionClient {
    fn stream_completion(
        &self,
        request: CompletionRequest,
    ) -> BoxFuture<'static, Result<CompletionStream, CompletionError>> {
        Self::send(self.client.clone(), self.endpoint.clone(), request).boxed()
    }
}

struct BodyState<B> {
    body: BoxStream<'static, Result<B, CompletionError>>,
    decoder: Utf8ChunkDecoder,
    finished: bool,
}

/// Turn a byte stream into text fragments.
///
/// A body error ends the stream after being yielded.
fn decode_body<S, B, E>(body: S) -> CompletionStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<CompletionError> + 'static,
{
    let state = BodyState {
        body: body.map(|chunk| chunk.map_err(Into::into)).boxed(),
        decoder: Utf8ChunkDecoder::default(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }
        loop {
            match state.body.next().await {
                Some(Ok(bytes)) => {
                    let text = state.decoder.decode(bytes.as_ref());
                    if text.is_empty() {
                        continue;
                    }
                    return Some((Ok(text), state));
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.finished = true;
                    let rest = state.decoder.finish()?;
                    return Some((Ok(rest), state));
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::VideoId;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> CompletionRequest {
        CompletionRequest {
            prompt: "Write a title for {transcription}".to_string(),
            video_id: VideoId::new("video-42"),
            temperature: 0.7,
        }
    }

    fn client_for(server: &MockServer) -> HttpCompletionClient {
        let endpoint = Url::parse(&format!("{}/ai/result", server.uri())).expect("valid url");
        HttpCompletionClient::new(endpoint, Duration::from_secs(5)).expect("client")
    }

    async fn collect_text(stream: CompletionStream) -> Result<String, CompletionError> {
        let chunks: Vec<_> = stream.collect().await;
        let mut text = String::new();
        for chunk in chunks {
            text.push_str(&chunk?);
        }
        Ok(text)
    }

    #[test]
    fn test_request_serialization() {
        let value = serde_json::to_value(request()).expect("serialize");
        assert_eq!(
            value,
            json!({
                "prompt": "Write a title for {transcription}",
                "videoId": "video-42",
                "temperature": 0.7
            })
        );
    }

    #[tokio::test]
    async fn test_posts_exactly_prompt_video_and_temperature() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ai/result"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "prompt": "Write a title for {transcription}",
                "videoId": "video-42",
                "temperature": 0.7
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string("Hello, world"))
            .expect(1)
            .mount(&server)
            .await;

        let stream = match client_for(&server).stream_completion(request()).await {
            Ok(stream) => stream,
            Err(e) => panic!("request failed: {e}"),
        };
        let text = collect_text(stream).await.expect("stream failed");
        assert_eq!(text, "Hello, world");
    }

    #[tokio::test]
    async fn test_non_success_status_is_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ai/result"))
            .respond_with(ResponseTemplate::new(500).set_body_string("transcription not found"))
            .mount(&server)
            .await;

        match client_for(&server).stream_completion(request()).await {
            Err(CompletionError::ServerError { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "transcription not found");
            }
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("expected a server error"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        // Nothing listens on the discard port
        let endpoint = Url::parse("http://127.0.0.1:9/ai/result").expect("valid url");
        let client = HttpCompletionClient::new(endpoint, Duration::from_secs(2)).expect("client");

        match client.stream_completion(request()).await {
            Err(CompletionError::Network(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("expected a network error"),
        }
    }

    #[tokio::test]
    async fn test_decode_body_preserves_order_and_characters() {
        let body = stream::iter(vec![
            Ok::<_, CompletionError>(b"Hel".to_vec()),
            Ok("lo, w\u{00f6}".as_bytes()[..6].to_vec()),
            Ok("lo, w\u{00f6}".as_bytes()[6..].to_vec()),
            Ok(b"rld".to_vec()),
        ]);

        let text = collect_text(decode_body(body)).await.expect("stream failed");
        assert_eq!(text, "Hello, w\u{00f6}rld");
    }

    #[tokio::test]
    async fn test_decode_body_yields_text_before_error() {
        let body = stream::iter(vec![
            Ok(b"Partial".to_vec()),
            Err(CompletionError::ServerError {
                status: 502,
                message: "upstream closed".to_string(),
            }),
            Ok(b"never seen".to_vec()),
        ]);

        let items: Vec<_> = decode_body(body).collect().await;
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[0], Ok(text) if text == "Partial"));
        assert!(matches!(&items[1], Err(CompletionError::ServerError { status: 502, .. })));
    }
}
