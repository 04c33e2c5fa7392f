//! Channel kind and lifecycle state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of a turn a channel serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// The user-visible answer. Always created.
    Primary,
    /// A silent side request against a separately configured target.
    Auxiliary,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Primary => "primary",
            ChannelKind::Auxiliary => "auxiliary",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of one channel.
///
/// ```text
/// Pending ──submit──▶ Streaming ──(terminal event | timeout | cancel)──▶ Completed | Failed | Cancelled
/// ```
///
/// A channel may also go straight from `Pending` to a terminal state when it
/// is cancelled before its stream opens or the transport refuses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelState {
    Pending,
    Streaming,
    Completed,
    Failed,
    Cancelled,
}

impl ChannelState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChannelState::Completed | ChannelState::Failed | ChannelState::Cancelled
        )
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: ChannelState) -> bool {
        match (self, next) {
            (s, _) if s.is_terminal() => false,
            (ChannelState::Pending, ChannelState::Streaming) => true,
            (ChannelState::Pending | ChannelState::Streaming, n) => n.is_terminal(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelState::Pending => "pending",
            ChannelState::Streaming => "streaming",
            ChannelState::Completed => "completed",
            ChannelState::Failed => "failed",
            ChannelState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!ChannelState::Pending.is_terminal());
        assert!(!ChannelState::Streaming.is_terminal());
        assert!(ChannelState::Completed.is_terminal());
        assert!(ChannelState::Failed.is_terminal());
        assert!(ChannelState::Cancelled.is_terminal());
    }

    #[test]
    fn test_no_transition_leaves_terminal() {
        for terminal in [
            ChannelState::Completed,
            ChannelState::Failed,
            ChannelState::Cancelled,
        ] {
            for next in [
                ChannelState::Pending,
                ChannelState::Streaming,
                ChannelState::Completed,
                ChannelState::Failed,
                ChannelState::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_forward_transitions() {
        assert!(ChannelState::Pending.can_transition_to(ChannelState::Streaming));
        assert!(ChannelState::Pending.can_transition_to(ChannelState::Cancelled));
        assert!(ChannelState::Streaming.can_transition_to(ChannelState::Completed));
        assert!(!ChannelState::Streaming.can_transition_to(ChannelState::Pending));
        assert!(!ChannelState::Streaming.can_transition_to(ChannelState::Streaming));
    }
}
