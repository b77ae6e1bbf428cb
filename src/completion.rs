//! Chat completion transport.
//!
//! [`CompletionClient::send`] issues one `POST {base_url}/chat/completions`
//! and hands back either the decoded one-shot reply or a lazy stream of text
//! fragments parsed from the SSE body. Retrying is left to the caller.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::stream::{self, Stream, StreamExt};
use once_cell::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{MentorError, MentorResult, NetworkError};
use crate::models::{ChatCompletionRequest, ChatMessage, ChatOptions, ChatResult, CompletionResponse};
use crate::sse::{SseParser, StreamEvent};
use crate::traits::{ByteStream, ConfigProvider, Headers, HttpClient};

/// Why a fragment stream stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// `[DONE]` sentinel
    Done,
    /// Body ran out without a sentinel
    EndOfBody,
    /// The cancellation token fired first
    Cancelled,
    /// A body read failed
    Failed,
}

/// Lazy, finite sequence of assistant text fragments.
///
/// Ends cleanly on `[DONE]`, end of body, or cancellation, and
/// [`end`](Self::end) tells which. A body read failure is yielded once as an
/// error and then the stream ends.
pub struct FragmentStream {
    inner: Pin<Box<dyn Stream<Item = MentorResult<String>> + Send>>,
    end: Arc<OnceCell<StreamEnd>>,
}

impl FragmentStream {
    /// How the stream ended; `None` while it is still live.
    ///
    /// The first reason wins: a cancel that lands after `[DONE]` leaves it at
    /// [`StreamEnd::Done`].
    pub fn end(&self) -> Option<StreamEnd> {
        self.end.get().copied()
    }
}

impl Stream for FragmentStream {
    type Item = MentorResult<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// What a completion call produced.
pub enum ChatReply {
    /// Non-streaming reply
    Complete(ChatResult),
    /// Streaming reply, not yet consumed
    Stream(FragmentStream),
}

impl ChatReply {
    pub fn is_stream(&self) -> bool {
        matches!(self, ChatReply::Stream(_))
    }
}

impl fmt::Debug for ChatReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatReply::Complete(result) => f.debug_tuple("Complete").field(result).finish(),
            ChatReply::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Client for an OpenAI-compatible chat completion endpoint.
pub struct CompletionClient<H, C> {
    http: H,
    config: C,
}

impl<H: HttpClient, C: ConfigProvider> CompletionClient<H, C> {
    pub fn new(http: H, config: C) -> Self {
        Self { http, config }
    }

    pub fn http(&self) -> &H {
        &self.http
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// Send `messages` and return the reply.
    ///
    /// Configuration is resolved here, once per call; a missing key fails
    /// before any request is made. Cancellation while the request is in
    /// flight resolves to [`MentorError::Cancelled`].
    pub async fn send(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> MentorResult<ChatReply> {
        if messages.is_empty() {
            return Err(MentorError::Client {
                message: "at least one message is required".to_string(),
            });
        }

        let config = self.config.resolve()?;

        if options.is_cancelled() {
            return Err(MentorError::Cancelled);
        }

        let request = ChatCompletionRequest::new(&config.model, messages, options);
        let body = serde_json::to_string(&request).map_err(|e| MentorError::Client {
            message: format!("failed to encode request: {}", e),
        })?;
        let url = config.completions_url();
        let headers = request_headers(&config.api_key, options.stream);

        info!(
            "Sending {} messages to {} (model={}, stream={})",
            request.messages.len(),
            url,
            config.model,
            options.stream
        );

        if options.stream {
            let body_stream = until_cancelled(
                options.cancel.as_ref(),
                self.http.post_stream(&url, &body, &headers),
            )
            .await?;
            return Ok(ChatReply::Stream(fragment_stream(
                body_stream,
                options.cancel.clone(),
            )));
        }

        let response = until_cancelled(
            options.cancel.as_ref(),
            self.http.post(&url, &body, &headers),
        )
        .await?
        .error_for_status()?;

        let envelope: CompletionResponse =
            response.json().map_err(|e| NetworkError::InvalidResponse {
                message: e.to_string(),
            })?;

        Ok(ChatReply::Complete(ChatResult {
            content: envelope.into_content(),
        }))
    }
}

fn request_headers(api_key: &str, stream: bool) -> Headers {
    let mut headers = Headers::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers.insert("Authorization".to_string(), format!("Bearer {}", api_key));
    if stream {
        headers.insert("Accept".to_string(), "text/event-stream".to_string());
    }
    headers
}

/// Await `fut` unless `cancel` fires first.
async fn until_cancelled<F, T>(cancel: Option<&CancellationToken>, fut: F) -> MentorResult<T>
where
    F: Future<Output = Result<T, NetworkError>>,
{
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(MentorError::Cancelled),
            result = fut => result.map_err(MentorError::from),
        },
        None => fut.await.map_err(MentorError::from),
    }
}

struct FragmentState {
    /// Dropped as soon as the stream ends for any reason, releasing the socket
    body: Option<ByteStream>,
    parser: SseParser,
    cancel: Option<CancellationToken>,
    fragments: usize,
    end: Arc<OnceCell<StreamEnd>>,
}

impl FragmentState {
    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Drop the body and record why the stream ended, if not recorded yet.
    fn finish(&mut self, reason: StreamEnd) {
        self.body = None;
        if self.end.set(reason).is_ok() {
            debug!(
                "Fragment stream finished ({:?}): {} fragments, {} skipped lines",
                reason,
                self.fragments,
                self.parser.skipped_lines()
            );
        }
    }
}

/// Turn an SSE body into a fragment stream.
pub fn fragment_stream(body: ByteStream, cancel: Option<CancellationToken>) -> FragmentStream {
    let end = Arc::new(OnceCell::new());
    let state = FragmentState {
        body: Some(body),
        parser: SseParser::new(),
        cancel,
        fragments: 0,
        end: Arc::clone(&end),
    };

    FragmentStream {
        inner: Box::pin(stream::unfold(state, next_fragment).fuse()),
        end,
    }
}

async fn next_fragment(
    mut state: FragmentState,
) -> Option<(MentorResult<String>, FragmentState)> {
    loop {
        if state.is_cancelled() {
            state.finish(StreamEnd::Cancelled);
            return None;
        }

        match state.parser.next_event() {
            Some(StreamEvent::Fragment(text)) => {
                state.fragments += 1;
                return Some((Ok(text), state));
            }
            Some(StreamEvent::Done) => {
                state.finish(StreamEnd::Done);
                return None;
            }
            None => {}
        }

        // Parser drained and body gone: nothing left
        let Some(body) = state.body.as_mut() else {
            state.finish(StreamEnd::EndOfBody);
            return None;
        };

        let read = match &state.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => None,
                item = body.next() => Some(item),
            },
            None => Some(body.next().await),
        };

        let Some(next) = read else {
            state.finish(StreamEnd::Cancelled);
            return None;
        };

        match next {
            Some(Ok(chunk)) => state.parser.push_chunk(&chunk),
            Some(Err(err)) => {
                state.finish(StreamEnd::Failed);
                state.parser.reset();
                return Some((Err(MentorError::Network(err)), state));
            }
            None => {
                // Flush what is left in the parser before reporting the end
                state.parser.end_of_input();
                state.body = None;
            }
        }
    }
}
