//! Caller-side handles to running channels.

use relay_domain::{
    ChannelError, ChannelKind, ChannelMeta, ChannelState, ReconciledResult, RequestId,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

/// Handle to one submitted channel.
///
/// The handle observes the channel; it does not own its cancellation.
/// Cancel through [`ChannelOrchestrator::cancel`](super::ChannelOrchestrator::cancel).
/// Dropping the handle leaves the channel running to completion.
#[derive(Debug)]
pub struct ChannelHandle {
    meta: ChannelMeta,
    state: watch::Receiver<ChannelState>,
    text: watch::Receiver<String>,
    task: JoinHandle<ReconciledResult>,
}

impl ChannelHandle {
    pub(crate) fn new(
        meta: ChannelMeta,
        state: watch::Receiver<ChannelState>,
        text: watch::Receiver<String>,
        task: JoinHandle<ReconciledResult>,
    ) -> Self {
        Self {
            meta,
            state,
            text,
            task,
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.meta.request_id
    }

    pub fn kind(&self) -> ChannelKind {
        self.meta.kind
    }

    /// The query sent upstream on this channel.
    pub fn query(&self) -> &str {
        &self.meta.query
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// Receiver notified on every lifecycle transition.
    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.state.clone()
    }

    /// Current reconciled text snapshot.
    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    /// Receiver notified only when the reconciled text actually changes.
    pub fn watch_text(&self) -> watch::Receiver<String> {
        self.text.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the channel's single [`ReconciledResult`].
    pub async fn wait(self) -> ReconciledResult {
        match self.task.await {
            Ok(result) => result,
            Err(e) => {
                warn!("Channel {} task failed: {}", self.meta.request_id, e);
                ReconciledResult::failure(
                    &self.meta,
                    "",
                    "",
                    &ChannelError::Internal(e.to_string()),
                )
            }
        }
    }
}

/// Handles returned by [`ChannelOrchestrator::submit`](super::ChannelOrchestrator::submit).
#[derive(Debug)]
pub struct TurnHandles {
    pub primary: ChannelHandle,
    /// Present only when an auxiliary target is configured.
    pub auxiliary: Option<ChannelHandle>,
}

/// Results of both channels of one turn.
#[derive(Debug, Clone)]
pub struct TurnResults {
    pub primary: ReconciledResult,
    pub auxiliary: Option<ReconciledResult>,
}

impl TurnHandles {
    /// Wait for every channel of the turn, concurrently.
    pub async fn wait_all(self) -> TurnResults {
        let TurnHandles { primary, auxiliary } = self;
        let auxiliary = async move {
            match auxiliary {
                Some(handle) => Some(handle.wait().await),
                None => None,
            }
        };
        let (primary, auxiliary) = tokio::join!(primary.wait(), auxiliary);
        TurnResults { primary, auxiliary }
    }
}
