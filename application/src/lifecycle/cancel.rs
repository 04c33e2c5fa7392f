//! Cooperative cancellation handle shared by a channel and the registry.

use relay_domain::ChannelError;
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;

/// Why a request was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Explicit `cancel` or bulk teardown.
    Cancelled,
    /// The idle-timeout deadline expired.
    Timeout,
}

impl CancelReason {
    pub fn to_error(self) -> ChannelError {
        match self {
            CancelReason::Cancelled => ChannelError::Cancelled,
            CancelReason::Timeout => ChannelError::Timeout,
        }
    }
}

/// Cancellation capability of one request.
///
/// Cloning shares the same signal. The channel task observes it through
/// [`cancelled`](Self::cancelled); only the
/// [`RequestRegistry`](super::RequestRegistry) can trigger it. The first
/// trigger wins and fixes the [`CancelReason`].
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
    reason: Arc<OnceLock<CancelReason>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `reason` (if none yet) and signal cancellation.
    ///
    /// Returns `true` only for the first trigger.
    pub(crate) fn trigger(&self, reason: CancelReason) -> bool {
        let first = self.reason.set(reason).is_ok();
        self.token.cancel();
        first
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the handle has been triggered.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn reason(&self) -> Option<CancelReason> {
        self.reason.get().copied()
    }

    /// Error a channel reports after being cancelled through this handle.
    pub fn error(&self) -> ChannelError {
        self.reason()
            .unwrap_or(CancelReason::Cancelled)
            .to_error()
    }
}
