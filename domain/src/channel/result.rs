//! The one result a channel produces when it reaches a terminal state.

use crate::channel::ChannelKind;
use crate::core::error::ChannelError;
use crate::core::request_id::RequestId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Success,
    Error,
}

/// Identity of the channel a reconciler was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMeta {
    pub request_id: RequestId,
    pub kind: ChannelKind,
    /// The query that was sent upstream.
    pub query: String,
}

impl ChannelMeta {
    pub fn new(request_id: RequestId, kind: ChannelKind, query: impl Into<String>) -> Self {
        Self {
            request_id,
            kind,
            query: query.into(),
        }
    }
}

/// Final outcome of a channel.
///
/// `text` is never empty when `status` is [`ResultStatus::Success`]; an
/// empty answer is reported as an [`ChannelError::EmptyResult`] failure.
/// Failed results never carry partial text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledResult {
    pub request_id: RequestId,
    pub channel: ChannelKind,
    pub query: String,
    pub message_id: String,
    pub conversation_id: String,
    pub text: String,
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub finished_at: DateTime<Utc>,
}

impl ReconciledResult {
    pub fn success(
        meta: &ChannelMeta,
        message_id: impl Into<String>,
        conversation_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            request_id: meta.request_id.clone(),
            channel: meta.kind,
            query: meta.query.clone(),
            message_id: message_id.into(),
            conversation_id: conversation_id.into(),
            text: text.into(),
            status: ResultStatus::Success,
            error: None,
            finished_at: Utc::now(),
        }
    }

    pub fn failure(
        meta: &ChannelMeta,
        message_id: impl Into<String>,
        conversation_id: impl Into<String>,
        error: &ChannelError,
    ) -> Self {
        Self {
            request_id: meta.request_id.clone(),
            channel: meta.kind,
            query: meta.query.clone(),
            message_id: message_id.into(),
            conversation_id: conversation_id.into(),
            text: String::new(),
            status: ResultStatus::Error,
            error: Some(error.to_string()),
            finished_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> ChannelMeta {
        ChannelMeta::new(RequestId::from("auxiliary-request-1-0"), ChannelKind::Auxiliary, "q")
    }

    #[test]
    fn test_failure_carries_reason_and_no_text() {
        let result = ReconciledResult::failure(&meta(), "", "", &ChannelError::Timeout);
        assert!(!result.is_success());
        assert_eq!(result.error.as_deref(), Some("timeout"));
        assert!(result.text.is_empty());
    }

    #[test]
    fn test_success_json_omits_error() {
        let result = ReconciledResult::success(&meta(), "m1", "c1", "answer");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["channel"], "auxiliary");
        assert!(json.get("error").is_none());
    }
}
