//! Wire types for the chat-message endpoint

use relay_domain::{FileAttachment, StreamRequest};
use serde::Serialize;
use std::collections::BTreeMap;

/// Value of `response_mode` for server-sent event responses.
pub const RESPONSE_MODE_STREAMING: &str = "streaming";

/// JSON body of `POST /chat-messages`.
///
/// `conversation_id` is omitted entirely to start a new conversation.
#[derive(Debug, Serialize)]
pub struct ChatMessageRequest<'a> {
    pub query: &'a str,
    pub inputs: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<&'a str>,
    pub user: &'a str,
    pub response_mode: &'static str,
    pub files: &'a [FileAttachment],
}

impl<'a> From<&'a StreamRequest> for ChatMessageRequest<'a> {
    fn from(request: &'a StreamRequest) -> Self {
        Self {
            query: &request.query,
            inputs: &request.inputs,
            conversation_id: request.conversation_id.as_deref(),
            user: &request.user,
            response_mode: RESPONSE_MODE_STREAMING,
            files: &request.files,
        }
    }
}
