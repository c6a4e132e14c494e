use thiserror::Error;

/// Errors raised by the transport client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection-level failure before a response was available.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{reason} (status {status})")]
    Status { status: u16, reason: String },

    /// The configured deadline elapsed before the exchange completed.
    #[error("Request timed out. Please try again.")]
    Timeout,

    /// The response body stopped being readable mid-transfer.
    #[error("Stream not available")]
    StreamUnavailable,
}

impl ApiError {
    /// HTTP status carried by this error, where one applies.
    /// Timeouts report the standard request-timeout code.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Timeout => Some(408),
            ApiError::StreamUnavailable => Some(500),
            ApiError::Network(source) => source.status().map(|s| s.as_u16()),
        }
    }
}
