//! Request identity

use crate::channel::ChannelKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of one submitted request.
///
/// Created once at submission time and used as the key for cancellation
/// and de-duplication. Identifiers embed a per-orchestrator sequence number
/// and the submission instant, so they are never reused within a process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Build an identifier of the form `{kind}-request-{seq}-{unix_millis}`.
    pub fn generate(kind: ChannelKind, seq: u64, unix_millis: i64) -> Self {
        Self(format!("{}-request-{}-{}", kind.as_str(), seq, unix_millis))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for RequestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
