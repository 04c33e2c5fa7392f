//! Content Reconciler - folds a channel's events into one authoritative text.
//!
//! Upstream `message` frames carry the **cumulative** answer so far, not an
//! incremental fragment. The merge rule is therefore *replace*, gated on
//! content equality so that a repeated snapshot produces no update:
//!
//! ```text
//! Delta("Hi")        → buffer = "Hi"        Updated
//! Delta("Hi")        → buffer = "Hi"        Unchanged
//! Delta("Hi there")  → buffer = "Hi there"  Updated
//! End                → Finished(success "Hi there")
//! ```
//!
//! Exactly one [`ReconciledResult`] is produced per reconciler. After it,
//! every further event is [`Ignored`](ReconcileStep::Ignored).

use super::event::{FrameIds, StreamEvent};
use crate::channel::{ChannelMeta, ReconciledResult};
use crate::core::error::ChannelError;
use tracing::{debug, trace};

/// What a single [`ContentReconciler::apply`] call did.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileStep {
    /// The channel is already terminal; the event was dropped.
    Ignored,
    /// No observable change (ping, duplicate or empty snapshot).
    Unchanged,
    /// The text buffer was replaced; read it with [`ContentReconciler::text`].
    Updated,
    /// The channel reached its terminal state.
    Finished(ReconciledResult),
}

/// Per-channel text buffer plus terminal status.
#[derive(Debug)]
pub struct ContentReconciler {
    meta: ChannelMeta,
    text: String,
    message_id: String,
    conversation_id: String,
    terminal: bool,
    updates: usize,
}

impl ContentReconciler {
    pub fn new(meta: ChannelMeta) -> Self {
        Self {
            meta,
            text: String::new(),
            message_id: String::new(),
            conversation_id: String::new(),
            terminal: false,
            updates: 0,
        }
    }

    /// Seed the conversation id reported when upstream never sends one.
    pub fn with_conversation_id(mut self, conversation_id: Option<String>) -> Self {
        self.conversation_id = conversation_id.unwrap_or_default();
        self
    }

    pub fn meta(&self) -> &ChannelMeta {
        &self.meta
    }

    /// Current answer snapshot.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Number of times the buffer was replaced.
    pub fn updates(&self) -> usize {
        self.updates
    }

    /// Apply one event in arrival order.
    pub fn apply(&mut self, event: &StreamEvent) -> ReconcileStep {
        if self.terminal {
            trace!(
                "Reconciler {}: ignoring {} after terminal",
                self.meta.request_id,
                event.kind()
            );
            return ReconcileStep::Ignored;
        }

        match event {
            StreamEvent::Ping => ReconcileStep::Unchanged,
            StreamEvent::Delta { answer, ids } => {
                self.record_ids(ids);
                if answer.is_empty() || *answer == self.text {
                    return ReconcileStep::Unchanged;
                }
                self.text.clone_from(answer);
                self.updates += 1;
                trace!(
                    "Reconciler {}: snapshot now {} chars",
                    self.meta.request_id,
                    self.text.chars().count()
                );
                ReconcileStep::Updated
            }
            StreamEvent::End { ids } | StreamEvent::WorkflowEnd { ids } => {
                self.record_ids(ids);
                ReconcileStep::Finished(self.finish_success())
            }
            StreamEvent::Error { message, ids } => {
                self.record_ids(ids);
                let error = ChannelError::Upstream(message.clone());
                ReconcileStep::Finished(self.finish_error(&error))
            }
        }
    }

    /// Force a terminal failure (timeout, cancellation, transport error).
    ///
    /// Returns `None` when the channel already produced its result.
    pub fn fail(&mut self, error: &ChannelError) -> Option<ReconciledResult> {
        if self.terminal {
            return None;
        }
        Some(self.finish_error(error))
    }

    fn record_ids(&mut self, ids: &FrameIds) {
        if let Some(id) = ids.conversation_id.as_deref().filter(|s| !s.is_empty()) {
            self.conversation_id = id.to_string();
        }
        if let Some(id) = ids.message_id.as_deref().filter(|s| !s.is_empty()) {
            self.message_id = id.to_string();
        }
    }

    fn finish_success(&mut self) -> ReconciledResult {
        self.terminal = true;
        let trimmed = self.text.trim();
        if trimmed.is_empty() {
            debug!("Reconciler {}: terminal marker with empty buffer", self.meta.request_id);
            self.text.clear();
            return ReconciledResult::failure(
                &self.meta,
                &self.message_id,
                &self.conversation_id,
                &ChannelError::EmptyResult,
            );
        }
        self.text = trimmed.to_string();
        ReconciledResult::success(
            &self.meta,
            &self.message_id,
            &self.conversation_id,
            &self.text,
        )
    }

    fn finish_error(&mut self, error: &ChannelError) -> ReconciledResult {
        self.terminal = true;
        if !self.text.is_empty() {
            debug!(
                "Reconciler {}: discarding {} buffered chars on error",
                self.meta.request_id,
                self.text.len()
            );
        }
        self.text.clear();
        ReconciledResult::failure(&self.meta, &self.message_id, &self.conversation_id, error)
    }
}
