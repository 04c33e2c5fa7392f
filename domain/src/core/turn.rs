//! A logical user turn and the payload sent to a transport.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A file reference attached to a turn.
///
/// Mirrors the upstream chat API's file object: either a remote URL or the
/// id of a previously uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    /// File category, e.g. `"image"` or `"document"`.
    #[serde(rename = "type")]
    pub file_type: String,
    /// `"remote_url"` or `"local_file"`.
    pub transfer_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_file_id: Option<String>,
}

impl FileAttachment {
    pub fn remote(file_type: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            file_type: file_type.into(),
            transfer_method: "remote_url".to_string(),
            url: Some(url.into()),
            upload_file_id: None,
        }
    }

    pub fn uploaded(file_type: impl Into<String>, upload_file_id: impl Into<String>) -> Self {
        Self {
            file_type: file_type.into(),
            transfer_method: "local_file".to_string(),
            url: None,
            upload_file_id: Some(upload_file_id.into()),
        }
    }
}

/// Conversation state shared by every channel of a turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    /// Upstream conversation to continue; `None` starts a new one.
    pub conversation_id: Option<String>,
    /// App input variables.
    pub inputs: BTreeMap<String, String>,
    pub files: Vec<FileAttachment>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inputs.insert(key.into(), value.into());
        self
    }

    pub fn with_file(mut self, file: FileAttachment) -> Self {
        self.files.push(file);
        self
    }
}

/// One logical user turn.
///
/// The primary content always produces a primary channel. Auxiliary content
/// is only used when an auxiliary target is configured; when it is absent,
/// the auxiliary query is derived from the primary content.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub primary_content: String,
    pub auxiliary_content: Option<String>,
    pub context: ConversationContext,
}

impl Turn {
    pub fn new(primary_content: impl Into<String>) -> Self {
        Self {
            primary_content: primary_content.into(),
            auxiliary_content: None,
            context: ConversationContext::default(),
        }
    }

    pub fn with_auxiliary(mut self, content: impl Into<String>) -> Self {
        self.auxiliary_content = Some(content.into());
        self
    }

    pub fn with_context(mut self, context: ConversationContext) -> Self {
        self.context = context;
        self
    }
}

/// Payload handed to a transport when opening a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub inputs: BTreeMap<String, String>,
    pub files: Vec<FileAttachment>,
    /// End-user identifier reported upstream.
    pub user: String,
}

impl StreamRequest {
    pub fn new(query: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            conversation_id: None,
            inputs: BTreeMap::new(),
            files: Vec::new(),
            user: user.into(),
        }
    }

    /// Build a request carrying the full conversation context.
    pub fn from_context(
        query: impl Into<String>,
        context: &ConversationContext,
        user: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            conversation_id: context.conversation_id.clone(),
            inputs: context.inputs.clone(),
            files: context.files.clone(),
            user: user.into(),
        }
    }

    /// Drop the conversation id so the request opens a fresh conversation.
    pub fn detached(mut self) -> Self {
        self.conversation_id = None;
        self
    }
}
