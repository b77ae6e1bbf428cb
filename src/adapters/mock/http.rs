//! Mock HTTP client for testing.
//!
//! Provides a configurable mock HTTP client that replays queued responses,
//! stream bodies, and errors without touching the network.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::NetworkError;
use crate::traits::{ByteStream, Headers, HttpClient, Response};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: String,
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body
    pub body: String,
}

impl RecordedRequest {
    /// Decode the request body as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a buffered response
    Success(Response),
    /// Fail the request before any body is produced
    Error(NetworkError),
    /// Return a finite stream of body chunks
    Stream(Vec<Bytes>),
    /// Return chunks, each delivered after a delay
    Paced(Vec<Bytes>, Duration),
    /// Return chunks, then fail the body read
    StreamThenError(Vec<Bytes>, NetworkError),
    /// Return chunks, then never end (for cancellation tests)
    OpenStream(Vec<Bytes>),
}

impl MockResponse {
    /// Stream body built from SSE text chunks.
    pub fn sse<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MockResponse::Stream(
            chunks
                .into_iter()
                .map(|chunk| Bytes::from(chunk.into()))
                .collect(),
        )
    }

    /// Buffered JSON response with the given status.
    pub fn json(status: u16, value: serde_json::Value) -> Self {
        MockResponse::Success(Response::new(status, Bytes::from(value.to_string())))
    }
}

/// Mock HTTP client for testing.
///
/// Responses are consumed from a FIFO queue, one per request; once the queue
/// is empty the default response (if any) is replayed for every request.
///
/// # Example
///
/// ```ignore
/// use mood_mentor::adapters::mock::{MockHttpClient, MockResponse};
///
/// let client = MockHttpClient::new();
/// client.push_response(MockResponse::Error(NetworkError::Timeout { operation: "send".into() }));
/// client.push_response(MockResponse::sse(["data: [DONE]\n"]));
///
/// // first call fails, second streams
/// assert_eq!(client.request_count(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    /// Responses consumed in order
    queue: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Response used when the queue is empty
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next unanswered request.
    pub fn push_response(&self, response: MockResponse) {
        self.queue.lock().unwrap().push_back(response);
    }

    /// Set a response replayed whenever the queue is empty.
    pub fn set_default_response(&self, response: MockResponse) {
        *self.default_response.lock().unwrap() = Some(response);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests made so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn record_request(&self, url: &str, headers: &Headers, body: &str) {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: "POST".to_string(),
            url: url.to_string(),
            headers: headers.clone(),
            body: body.to_string(),
        });
    }

    fn next_response(&self) -> Option<MockResponse> {
        if let Some(response) = self.queue.lock().unwrap().pop_front() {
            return Some(response);
        }
        self.default_response.lock().unwrap().clone()
    }
}

fn chunk_stream(chunks: Vec<Bytes>) -> impl futures::Stream<Item = Result<Bytes, NetworkError>> {
    stream::iter(chunks.into_iter().map(Ok))
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn post(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<Response, NetworkError> {
        self.record_request(url, headers, body);

        match self.next_response() {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            Some(_) => Err(NetworkError::Other {
                message: "Stream response on non-stream request".to_string(),
            }),
            None => Err(NetworkError::Other {
                message: format!("No mock response for URL: {}", url),
            }),
        }
    }

    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<ByteStream, NetworkError> {
        self.record_request(url, headers, body);

        match self.next_response() {
            Some(MockResponse::Stream(chunks)) => Ok(Box::pin(chunk_stream(chunks))),
            Some(MockResponse::Paced(chunks, interval)) => {
                let paced = stream::iter(chunks).then(move |chunk| async move {
                    tokio::time::sleep(interval).await;
                    Ok::<_, NetworkError>(chunk)
                });
                Ok(Box::pin(paced))
            }
            Some(MockResponse::StreamThenError(chunks, err)) => {
                let failing = chunk_stream(chunks).chain(stream::once(async move { Err(err) }));
                Ok(Box::pin(failing))
            }
            Some(MockResponse::OpenStream(chunks)) => {
                Ok(Box::pin(chunk_stream(chunks).chain(stream::pending())))
            }
            Some(MockResponse::Success(response)) => {
                response.error_for_status()?;
                Err(NetworkError::Other {
                    message: "Non-stream response on stream request".to_string(),
                })
            }
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(NetworkError::Other {
                message: format!("No mock response for URL: {}", url),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_post_with_response() {
        let client = MockHttpClient::new();
        client.push_response(MockResponse::Success(Response::new(
            201,
            Bytes::from(r#"{"id": 1}"#),
        )));

        let response = client
            .post("https://example.com/api", r#"{"name": "test"}"#, &Headers::new())
            .await
            .unwrap();

        assert_eq!(response.status, 201);

        let requests = client.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].json()["name"], "test");
    }

    #[tokio::test]
    async fn test_queue_is_consumed_in_order() {
        let client = MockHttpClient::new();
        client.push_response(MockResponse::Error(NetworkError::HttpStatus {
            status: 503,
            body: "busy".to_string(),
        }));
        client.push_response(MockResponse::sse(["data: [DONE]\n"]));

        let first = client
            .post_stream("https://example.com/stream", "{}", &Headers::new())
            .await;
        assert!(matches!(first, Err(NetworkError::HttpStatus { status: 503, .. })));

        let second = client
            .post_stream("https://example.com/stream", "{}", &Headers::new())
            .await;
        assert!(second.is_ok());
        assert_eq!(client.request_count(), 2);
    }

    #[tokio::test]
    async fn test_post_stream_with_chunks() {
        let client = MockHttpClient::new();
        client.push_response(MockResponse::sse(["chunk1", "chunk2", "chunk3"]));

        let mut stream = client
            .post_stream("https://example.com/stream", "{}", &Headers::new())
            .await
            .unwrap();

        let mut chunks = Vec::new();
        while let Some(result) = stream.next().await {
            chunks.push(result.unwrap());
        }

        assert_eq!(
            chunks,
            vec![
                Bytes::from("chunk1"),
                Bytes::from("chunk2"),
                Bytes::from("chunk3")
            ]
        );
    }

    #[tokio::test]
    async fn test_stream_then_error() {
        let client = MockHttpClient::new();
        client.push_response(MockResponse::StreamThenError(
            vec![Bytes::from("a")],
            NetworkError::StreamInterrupted {
                message: "reset".to_string(),
            },
        ));

        let mut stream = client
            .post_stream("https://example.com/stream", "{}", &Headers::new())
            .await
            .unwrap();

        assert_eq!(stream.next().await.unwrap().unwrap(), Bytes::from("a"));
        assert!(matches!(
            stream.next().await,
            Some(Err(NetworkError::StreamInterrupted { .. }))
        ));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_error_status_on_stream_request() {
        let client = MockHttpClient::new();
        client.push_response(MockResponse::json(401, serde_json::json!({"error": "bad key"})));

        let result = client
            .post_stream("https://example.com/stream", "{}", &Headers::new())
            .await;
        assert!(matches!(result, Err(NetworkError::HttpStatus { status: 401, .. })));
    }

    #[tokio::test]
    async fn test_no_response_configured() {
        let client = MockHttpClient::new();
        let result = client
            .post("https://example.com/missing", "{}", &Headers::new())
            .await;
        assert!(matches!(result, Err(NetworkError::Other { .. })));
    }

    #[tokio::test]
    async fn test_default_response_is_replayed() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::Error(NetworkError::Timeout {
            operation: "send".to_string(),
        }));

        for _ in 0..3 {
            let result = client.post("https://example.com", "{}", &Headers::new()).await;
            assert!(matches!(result, Err(NetworkError::Timeout { .. })));
        }
        assert_eq!(client.request_count(), 3);
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let client = MockHttpClient::new();
        client.push_response(MockResponse::Success(Response::new(200, Bytes::from("Hello"))));

        let cloned = client.clone();
        cloned
            .post("https://example.com", "{}", &Headers::new())
            .await
            .unwrap();

        assert_eq!(client.request_count(), 1);
        client.clear_requests();
        assert_eq!(cloned.request_count(), 0);
    }
}
