//! Channel Orchestrator
//!
//! Issues the primary channel of a turn and, when an auxiliary target is
//! configured, a deferred auxiliary channel against it. The two channels
//! share nothing but the [`RequestRegistry`] and the [`NotificationBus`]:
//! an auxiliary failure never delays or aborts the primary.
//!
//! ```text
//! submit(turn)
//!   ├─ primary   ─ register ─ spawn ───────────── open ─ parse ─ reconcile ─▶ handle
//!   └─ auxiliary ─ register ─ spawn ─ delay ───── open ─ parse ─ reconcile ─▶ handle + bus
//! ```

use super::channel::ChannelRunner;
use super::handle::{ChannelHandle, TurnHandles};
use crate::config::OrchestratorConfig;
use crate::lifecycle::{CancelHandle, RegistryError, RequestRegistry};
use crate::notification::NotificationBus;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::stream_transport::StreamTransport;
use chrono::Utc;
use relay_domain::{
    ChannelKind, ChannelMeta, ChannelState, ConversationContext, ReconciledResult, RequestId,
    StreamRequest, Turn,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

/// Errors that prevent a channel from being submitted at all.
///
/// Failures *after* submission are never errors here; they are reported
/// through the channel's [`ReconciledResult`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("No auxiliary target configured")]
    NoAuxiliaryTarget,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

pub struct ChannelOrchestrator {
    primary: Arc<dyn StreamTransport>,
    auxiliary: Option<Arc<dyn StreamTransport>>,
    registry: RequestRegistry,
    bus: Arc<NotificationBus>,
    logger: Arc<dyn ConversationLogger>,
    config: OrchestratorConfig,
    seq: AtomicU64,
}

impl ChannelOrchestrator {
    pub fn new(
        primary: Arc<dyn StreamTransport>,
        registry: RequestRegistry,
        bus: Arc<NotificationBus>,
    ) -> Self {
        Self {
            primary,
            auxiliary: None,
            registry,
            bus,
            logger: Arc::new(NoConversationLogger),
            config: OrchestratorConfig::default(),
            seq: AtomicU64::new(0),
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_auxiliary(mut self, transport: Arc<dyn StreamTransport>) -> Self {
        self.auxiliary = Some(transport);
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    // ==================== Accessors ====================

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &RequestRegistry {
        &self.registry
    }

    pub fn bus(&self) -> &Arc<NotificationBus> {
        &self.bus
    }

    pub fn has_auxiliary(&self) -> bool {
        self.auxiliary.is_some()
    }

    // ==================== Submission ====================

    /// Submit one turn.
    ///
    /// The primary channel is always created. The auxiliary channel is
    /// created only when an auxiliary target is configured; it queries
    /// `turn.auxiliary_content` (or the prefixed primary content), always
    /// opens a fresh upstream conversation, and reaches the transport
    /// `auxiliary_delay` after the primary.
    pub async fn submit(&self, turn: &Turn) -> Result<TurnHandles, OrchestratorError> {
        let request =
            StreamRequest::from_context(&turn.primary_content, &turn.context, &self.config.user);
        let primary = self.spawn_channel(
            ChannelKind::Primary,
            request,
            Arc::clone(&self.primary),
            Duration::ZERO,
        )?;

        let auxiliary = match &self.auxiliary {
            Some(transport) => {
                let query = self
                    .config
                    .auxiliary_query(&turn.primary_content, turn.auxiliary_content.as_deref());
                let request = StreamRequest::from_context(
                    query,
                    &turn.context,
                    self.config.effective_auxiliary_user(),
                )
                .detached();
                match self.spawn_channel(
                    ChannelKind::Auxiliary,
                    request,
                    Arc::clone(transport),
                    self.config.auxiliary_delay,
                ) {
                    Ok(handle) => Some(handle),
                    Err(e) => {
                        self.registry.cancel(primary.request_id());
                        return Err(e);
                    }
                }
            }
            None => {
                if turn.auxiliary_content.is_some() {
                    debug!("Orchestrator: no auxiliary target, dropping auxiliary content");
                }
                None
            }
        };

        Ok(TurnHandles { primary, auxiliary })
    }

    /// Issue a single auxiliary channel without a primary.
    pub async fn submit_auxiliary(
        &self,
        query: impl Into<String>,
        context: &ConversationContext,
    ) -> Result<ChannelHandle, OrchestratorError> {
        let transport = self
            .auxiliary
            .as_ref()
            .ok_or(OrchestratorError::NoAuxiliaryTarget)?;
        let request =
            StreamRequest::from_context(query, context, self.config.effective_auxiliary_user())
                .detached();
        self.spawn_channel(
            ChannelKind::Auxiliary,
            request,
            Arc::clone(transport),
            Duration::ZERO,
        )
    }

    /// Run auxiliary queries one after another, `batch_spacing` apart.
    ///
    /// Each query waits for the previous channel's result before it is
    /// submitted. Results are returned in query order.
    pub async fn submit_auxiliary_batch<I, Q>(
        &self,
        queries: I,
        context: &ConversationContext,
    ) -> Result<Vec<ReconciledResult>, OrchestratorError>
    where
        I: IntoIterator<Item = Q>,
        Q: Into<String>,
    {
        if self.auxiliary.is_none() {
            return Err(OrchestratorError::NoAuxiliaryTarget);
        }

        let mut results = Vec::new();
        for (index, query) in queries.into_iter().enumerate() {
            if index > 0 && !self.config.batch_spacing.is_zero() {
                tokio::time::sleep(self.config.batch_spacing).await;
            }
            let handle = self.submit_auxiliary(query, context).await?;
            results.push(handle.wait().await);
        }
        info!("Orchestrator: batch of {} auxiliary queries done", results.len());
        Ok(results)
    }

    // ==================== Lifecycle ====================

    /// Cancel one channel. Returns `false` if it was no longer live.
    pub fn cancel(&self, handle: &ChannelHandle) -> bool {
        self.registry.cancel(handle.request_id())
    }

    pub fn cancel_request(&self, request_id: &RequestId) -> bool {
        self.registry.cancel(request_id)
    }

    /// Cancel every live channel. Safe to call repeatedly.
    pub fn teardown(&self) -> usize {
        let count = self.registry.cancel_all();
        debug!("Orchestrator: teardown cancelled {} channels", count);
        count
    }

    pub fn active_count(&self) -> usize {
        self.registry.active_count()
    }

    pub fn active_ids(&self) -> Vec<RequestId> {
        self.registry.active_ids()
    }

    fn next_request_id(&self, kind: ChannelKind) -> RequestId {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        RequestId::generate(kind, seq, Utc::now().timestamp_millis())
    }

    fn spawn_channel(
        &self,
        kind: ChannelKind,
        request: StreamRequest,
        transport: Arc<dyn StreamTransport>,
        delay: Duration,
    ) -> Result<ChannelHandle, OrchestratorError> {
        let request_id = self.next_request_id(kind);
        let cancel = CancelHandle::new();
        self.registry.register_with_timeout(
            request_id.clone(),
            cancel.clone(),
            self.config.idle_timeout,
        )?;

        let meta = ChannelMeta::new(request_id, kind, request.query.clone());
        self.logger.log(ConversationEvent::new(
            "channel_submitted",
            serde_json::json!({
                "request_id": meta.request_id,
                "channel": kind,
                "query": request.query,
                "conversation_id": request.conversation_id,
                "target": transport.describe(),
            }),
        ));
        debug!(
            "Orchestrator: submitting {} via {}",
            meta.request_id,
            transport.describe()
        );

        let (state_tx, state_rx) = watch::channel(ChannelState::Pending);
        let (text_tx, text_rx) = watch::channel(String::new());
        let runner = ChannelRunner {
            meta: meta.clone(),
            request,
            transport,
            registry: self.registry.clone(),
            cancel,
            bus: Arc::clone(&self.bus),
            logger: Arc::clone(&self.logger),
            delay,
            state: state_tx,
            text: text_tx,
        };
        let task = tokio::spawn(runner.run());

        Ok(ChannelHandle::new(meta, state_rx, text_rx, task))
    }
}
