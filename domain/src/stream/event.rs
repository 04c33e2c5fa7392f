//! Typed events decoded from a chat-message stream.
//!
//! [`StreamEvent`] is the unit the [`FrameParser`](super::parser::FrameParser)
//! yields and the [`ContentReconciler`](super::reconciler::ContentReconciler)
//! consumes. Each SSE frame's JSON payload is decoded through [`WireFrame`],
//! whose `event` discriminator selects the variant:
//!
//! | `event` | Variant |
//! |---------|---------|
//! | `message` | [`Delta`](StreamEvent::Delta) |
//! | `ping` | [`Ping`](StreamEvent::Ping) |
//! | `message_end` | [`End`](StreamEvent::End) |
//! | `workflow_finished` | [`WorkflowEnd`](StreamEvent::WorkflowEnd) |
//! | `error` | [`Error`](StreamEvent::Error) |
//!
//! Any other discriminator is a known-but-irrelevant upstream event and
//! decodes to `None`.

use crate::core::error::ChannelError;
use serde::Deserialize;

/// Upstream identifiers a frame may carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameIds {
    pub conversation_id: Option<String>,
    pub message_id: Option<String>,
}

impl FrameIds {
    pub fn new(conversation_id: Option<String>, message_id: Option<String>) -> Self {
        Self {
            conversation_id,
            message_id,
        }
    }
}

/// An event in a streaming chat-message response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Snapshot of the full answer so far. Replaces, never appends.
    Delta { answer: String, ids: FrameIds },
    /// Liveness only, no payload.
    Ping,
    /// The message finished successfully.
    End { ids: FrameIds },
    /// The workflow behind the message finished successfully.
    WorkflowEnd { ids: FrameIds },
    /// Upstream reported a failure.
    Error { message: String, ids: FrameIds },
}

impl StreamEvent {
    /// Returns the answer snapshot if this is a Delta event.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta { answer, .. } => Some(answer),
            _ => None,
        }
    }

    /// Returns true if this event ends the channel.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::End { .. } | StreamEvent::WorkflowEnd { .. } | StreamEvent::Error { .. }
        )
    }

    pub fn ids(&self) -> Option<&FrameIds> {
        match self {
            StreamEvent::Delta { ids, .. }
            | StreamEvent::End { ids }
            | StreamEvent::WorkflowEnd { ids }
            | StreamEvent::Error { ids, .. } => Some(ids),
            StreamEvent::Ping => None,
        }
    }

    /// Decode one frame payload.
    ///
    /// Returns `Ok(None)` for well-formed frames whose `event` is not one
    /// the reconciler cares about, and [`ChannelError::Protocol`] when the
    /// payload is not a JSON object with an `event` field.
    pub fn decode(payload: &str) -> Result<Option<StreamEvent>, ChannelError> {
        let frame: WireFrame =
            serde_json::from_str(payload).map_err(|e| ChannelError::Protocol(e.to_string()))?;
        Ok(frame.into_event())
    }

    /// Short name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Delta { .. } => "delta",
            StreamEvent::Ping => "ping",
            StreamEvent::End { .. } => "end",
            StreamEvent::WorkflowEnd { .. } => "workflow_end",
            StreamEvent::Error { .. } => "error",
        }
    }
}

/// JSON shape of one frame payload.
#[derive(Debug, Clone, Deserialize)]
pub struct WireFrame {
    pub event: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
    /// Error text on `error` frames.
    #[serde(default)]
    pub message: Option<String>,
}

impl WireFrame {
    pub fn into_event(self) -> Option<StreamEvent> {
        let ids = FrameIds::new(self.conversation_id, self.message_id);
        match self.event.as_str() {
            "message" => Some(StreamEvent::Delta {
                answer: self.answer.unwrap_or_default(),
                ids,
            }),
            "ping" => Some(StreamEvent::Ping),
            "message_end" => Some(StreamEvent::End { ids }),
            "workflow_finished" => Some(StreamEvent::WorkflowEnd { ids }),
            "error" => Some(StreamEvent::Error {
                message: self
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "upstream error".to_string()),
                ids,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_message_as_delta() {
        let event = StreamEvent::decode(
            r#"{"event":"message","answer":"Hi","conversation_id":"c1","message_id":"m1"}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(event.text(), Some("Hi"));
        assert!(!event.is_terminal());
        assert_eq!(
            event.ids(),
            Some(&FrameIds::new(Some("c1".into()), Some("m1".into())))
        );
    }

    #[test]
    fn test_decode_terminal_kinds() {
        for payload in [
            r#"{"event":"message_end"}"#,
            r#"{"event":"workflow_finished","data":{"status":"succeeded"}}"#,
            r#"{"event":"error","message":"boom"}"#,
        ] {
            let event = StreamEvent::decode(payload).unwrap().unwrap();
            assert!(event.is_terminal(), "{payload}");
        }
    }

    #[test]
    fn test_decode_error_without_message_gets_default() {
        let event = StreamEvent::decode(r#"{"event":"error"}"#).unwrap().unwrap();
        assert_eq!(
            event,
            StreamEvent::Error {
                message: "upstream error".to_string(),
                ids: FrameIds::default(),
            }
        );
    }

    #[test]
    fn test_decode_ping() {
        let event = StreamEvent::decode(r#"{"event":"ping"}"#).unwrap().unwrap();
        assert_eq!(event, StreamEvent::Ping);
        assert!(event.ids().is_none());
    }

    #[test]
    fn test_decode_unknown_event_is_none() {
        let event = StreamEvent::decode(r#"{"event":"node_started","data":{}}"#).unwrap();
        assert!(event.is_none());
    }

    #[test]
    fn test_decode_rejects_non_json_and_missing_discriminator() {
        assert!(matches!(
            StreamEvent::decode("{not json"),
            Err(ChannelError::Protocol(_))
        ));
        assert!(matches!(
            StreamEvent::decode(r#"{"answer":"x"}"#),
            Err(ChannelError::Protocol(_))
        ));
    }
}
