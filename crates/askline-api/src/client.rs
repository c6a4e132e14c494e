//! The protocol client for the assistant service.

use std::time::Duration;

use async_stream::try_stream;
use futures::Stream;
use futures_util::StreamExt;
use tokio::time::Instant;

use askline_models::{ChatRequest, ChatResponse};

use crate::error::ApiError;
use crate::logging;
use crate::sse::SseDecoder;

/// Reply used when the server answers successfully but the payload carries
/// no output. A missing payload is not a protocol error.
pub const FALLBACK_REPLY: &str = "Sorry, I could not process your request.";

/// Deadline for a single-shot exchange.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(120);

/// Deadline for a whole streaming exchange; streamed responses take longer
/// to complete.
pub const STREAM_TIMEOUT: Duration = Duration::from_secs(240);

/// HTTP client for the assistant service.
///
/// Performs exactly one network call per invocation and never retries
/// internally; retry policy, if any, belongs to the caller. Owns the
/// timeout policy: when a deadline expires the in-flight transfer is
/// dropped, which cancels it, and the call fails with [`ApiError::Timeout`].
#[derive(Debug, Clone)]
pub struct ChatClient {
    base_url: String,
    client: reqwest::Client,
    send_timeout: Duration,
    stream_timeout: Duration,
    verbose: bool,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        // Ensure base_url doesn't end with a slash
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
            send_timeout: SEND_TIMEOUT,
            stream_timeout: STREAM_TIMEOUT,
            verbose: false,
        }
    }

    /// Override the default deadlines.
    pub fn with_timeouts(mut self, send: Duration, stream: Duration) -> Self {
        self.send_timeout = send;
        self.stream_timeout = stream;
        self
    }

    /// Enable console logging of request/response traffic.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn invoke_url(&self) -> String {
        format!("{}/invoke", self.base_url)
    }

    fn stream_url(&self) -> String {
        format!("{}/stream", self.base_url)
    }

    /// Send one message and wait for the complete reply.
    pub async fn send_once(&self, input: &str) -> Result<String, ApiError> {
        let request = ChatRequest {
            input: input.to_string(),
        };
        logging::log_request(&self.invoke_url(), &request, self.verbose);

        let exchange = async {
            let response = self
                .client
                .post(self.invoke_url())
                .header("Content-Type", "application/json")
                .json(&request)
                .send()
                .await?;

            let status = response.status();
            logging::log_response(&status, self.verbose);

            if !status.is_success() {
                return Err(ApiError::Status {
                    status: status.as_u16(),
                    reason: format!("Failed to send message: {}", status_reason(status)),
                });
            }

            let reply: ChatResponse = response.json().await?;
            Ok(reply.output)
        };

        // Dropping the exchange on expiry cancels the transfer.
        let output = tokio::time::timeout(self.send_timeout, exchange)
            .await
            .map_err(|_| ApiError::Timeout)??;

        if output.is_empty() {
            Ok(FALLBACK_REPLY.to_string())
        } else {
            Ok(output)
        }
    }

    /// Send one message and receive the reply incrementally.
    ///
    /// Content arrives exclusively as stream items, in order, each at most
    /// once; the stream ending without an error item is the completion
    /// signal. The deadline covers the whole exchange, however far the
    /// transfer has progressed.
    pub async fn send_stream(
        &self,
        input: &str,
    ) -> Result<impl Stream<Item = Result<String, ApiError>> + Send + Unpin, ApiError> {
        let request = ChatRequest {
            input: input.to_string(),
        };
        logging::log_request(&self.stream_url(), &request, self.verbose);

        let deadline = Instant::now() + self.stream_timeout;

        let response = tokio::time::timeout_at(
            deadline,
            self.client
                .post(self.stream_url())
                .header("Content-Type", "application/json")
                .json(&request)
                .send(),
        )
        .await
        .map_err(|_| ApiError::Timeout)??;

        let status = response.status();
        logging::log_response(&status, self.verbose);

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                reason: format!("Failed to stream message: {}", status_reason(status)),
            });
        }

        let verbose = self.verbose;
        let stream = try_stream! {
            let mut body = response.bytes_stream();
            let mut decoder = SseDecoder::new();
            let mut chunk_counter = 0u32;

            loop {
                let step = match tokio::time::timeout_at(deadline, body.next()).await {
                    Ok(Some(Ok(bytes))) => Ok(Some(bytes)),
                    Ok(Some(Err(_))) => Err(ApiError::StreamUnavailable),
                    // End-of-input: the transport is done sending.
                    Ok(None) => Ok(None),
                    Err(_) => Err(ApiError::Timeout),
                };
                let chunk = match step? {
                    Some(chunk) => chunk,
                    None => break,
                };

                chunk_counter += 1;
                logging::log_stream_chunk(chunk_counter, &chunk, verbose);

                for fragment in decoder.feed(&chunk) {
                    yield fragment;
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

fn status_reason(status: reqwest::StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}
