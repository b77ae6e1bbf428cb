//! Mock implementations for test fixtures.
//!
//! This module re-exports the mock implementations from
//! `mood_mentor::adapters::mock` and adds test-specific wrappers.

pub use mood_mentor::adapters::mock::{MockHttpClient, MockResponse, RecordedRequest};
pub use mood_mentor::traits::{ByteStream, Headers, HttpClient, Response};

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use mood_mentor::error::NetworkError;
use tokio::time::Instant;

/// Configuration for setting up mock HTTP responses.
pub struct MockHttpConfig {
    client: MockHttpClient,
}

impl MockHttpConfig {
    /// Creates a new mock HTTP configuration.
    pub fn new() -> Self {
        Self {
            client: MockHttpClient::new(),
        }
    }

    /// Queues an SSE body made of the given chunks.
    pub fn with_sse<I, S>(self, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.client.push_response(MockResponse::sse(chunks));
        self
    }

    /// Queues a body split at arbitrary byte positions.
    pub fn with_raw_chunks(self, chunks: Vec<Vec<u8>>) -> Self {
        self.client.push_response(MockResponse::Stream(
            chunks.into_iter().map(Bytes::from).collect(),
        ));
        self
    }

    /// Queues a request-level failure.
    pub fn with_error(self, error: NetworkError) -> Self {
        self.client.push_response(MockResponse::Error(error));
        self
    }

    /// Configures a response replayed once the queue is empty.
    pub fn with_default(self, response: MockResponse) -> Self {
        self.client.set_default_response(response);
        self
    }

    /// Builds the configured MockHttpClient.
    pub fn build(self) -> MockHttpClient {
        self.client
    }
}

impl Default for MockHttpConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps a [`MockHttpClient`] and records when each request was made.
#[derive(Clone, Default)]
pub struct TimedHttpClient {
    inner: MockHttpClient,
    calls: Arc<Mutex<Vec<Instant>>>,
}

impl TimedHttpClient {
    pub fn new(inner: MockHttpClient) -> Self {
        Self {
            inner,
            calls: Arc::default(),
        }
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }

    fn mark(&self) {
        self.calls.lock().unwrap().push(Instant::now());
    }
}

#[async_trait]
impl HttpClient for TimedHttpClient {
    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, NetworkError> {
        self.mark();
        self.inner.post(url, body, headers).await
    }

    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<ByteStream, NetworkError> {
        self.mark();
        self.inner.post_stream(url, body, headers).await
    }
}
