//! Channel error taxonomy

use thiserror::Error;

/// Reasons a channel can end without a successful answer.
///
/// The `Display` text of each variant is exactly the human-readable
/// `error` carried by a failed [`ReconciledResult`](crate::ReconciledResult).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The transport answered with a non-2xx status.
    #[error("transport returned status {0}")]
    TransportStatus(u16),

    /// The transport could not be reached or the body stream broke.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A single frame could not be decoded. Logged and skipped, never
    /// used as a terminal reason by the parser.
    #[error("malformed frame: {0}")]
    Protocol(String),

    #[error("stream closed without terminal marker")]
    StreamTerminatedWithoutMarker,

    /// An explicit `error` event from upstream.
    #[error("{0}")]
    Upstream(String),

    #[error("timeout")]
    Timeout,

    #[error("empty response")]
    EmptyResult,

    #[error("cancelled")]
    Cancelled,

    /// The channel task itself died (panic or runtime shutdown).
    #[error("internal failure: {0}")]
    Internal(String),
}

impl ChannelError {
    /// Check if this error represents an explicit cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ChannelError::Cancelled)
    }

    /// Check if this error came from the idle-timeout deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, ChannelError::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_strings() {
        assert_eq!(ChannelError::Timeout.to_string(), "timeout");
        assert_eq!(ChannelError::EmptyResult.to_string(), "empty response");
        assert_eq!(
            ChannelError::StreamTerminatedWithoutMarker.to_string(),
            "stream closed without terminal marker"
        );
        assert_eq!(
            ChannelError::TransportStatus(503).to_string(),
            "transport returned status 503"
        );
    }

    #[test]
    fn test_upstream_message_is_verbatim() {
        let error = ChannelError::Upstream("upstream down".to_string());
        assert_eq!(error.to_string(), "upstream down");
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(ChannelError::Cancelled.is_cancelled());
        assert!(!ChannelError::Timeout.is_cancelled());
        assert!(ChannelError::Timeout.is_timeout());
        assert!(!ChannelError::EmptyResult.is_timeout());
    }
}
