//! HTTP transport for the askline assistant service.
//!
//! This crate owns the two request modes (single-shot and streaming), the
//! timeout and cancellation policy, and the incremental decoder for the
//! server's event stream.

pub mod client;
pub mod error;
pub mod logging;
pub mod sse;

pub use client::{ChatClient, FALLBACK_REPLY, SEND_TIMEOUT, STREAM_TIMEOUT};
pub use error::ApiError;
pub use sse::SseDecoder;
