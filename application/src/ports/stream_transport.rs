//! Stream transport port
//!
//! Defines the "open stream" capability the orchestrator consumes. Given a
//! [`StreamRequest`], an implementation returns an HTTP-like status code and
//! a byte stream carrying SSE frames. Chunk boundaries need not align with
//! frame boundaries. Adapters live in the infrastructure layer.

use async_trait::async_trait;
use futures::stream::BoxStream;
use relay_domain::{ChannelError, StreamRequest};
use thiserror::Error;

/// Errors raised while opening or reading a transport stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Stream error: {0}")]
    Stream(String),
}

impl From<TransportError> for ChannelError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Connection(reason) | TransportError::Stream(reason) => {
                ChannelError::Connection(reason)
            }
        }
    }
}

/// Raw response body: ordered chunks of bytes.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, TransportError>>;

/// An opened stream: status plus a lazily read body.
///
/// Dropping the response (or its body) releases the underlying connection,
/// which is how cancellation reaches the transport.
pub struct TransportResponse {
    pub status: u16,
    pub body: ByteStream,
}

impl TransportResponse {
    pub fn new(status: u16, body: ByteStream) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Capability to open a cancellable chat-message stream.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Open a stream for `request`.
    ///
    /// A non-2xx status is returned as a normal response; only failures to
    /// reach the target at all are errors.
    async fn open(&self, request: &StreamRequest) -> Result<TransportResponse, TransportError>;

    /// Human-readable target description for logs.
    fn describe(&self) -> String {
        "stream transport".to_string()
    }
}
