//! Dify-style chat-message adapter
//!
//! Implements the [`StreamTransport`](relay_application::StreamTransport)
//! port against `POST {api_base}/chat-messages` in streaming mode. The
//! response body is handed to the orchestrator untouched; SSE framing is
//! handled by the domain parser.

pub mod error;
pub mod protocol;
pub mod transport;

pub use error::DifyError;
pub use protocol::ChatMessageRequest;
pub use transport::DifyTransport;
