//! Per-channel task: open the stream, parse, reconcile, report.
//!
//! Each channel runs as its own Tokio task. Every suspension point (the
//! auxiliary head-start delay, opening the stream, waiting for the next
//! body chunk) races against the channel's [`CancelHandle`] in a `biased`
//! select, so cancellation and idle timeouts take effect at the next
//! check point without interrupting a frame already being decoded.

use crate::lifecycle::{CancelHandle, RequestRegistry};
use crate::notification::NotificationBus;
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::stream_transport::StreamTransport;
use futures::StreamExt;
use relay_domain::{
    ChannelError, ChannelKind, ChannelMeta, ChannelState, ContentReconciler, FrameParser,
    ReconcileStep, ReconciledResult, StreamEvent, StreamRequest,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

pub(crate) struct ChannelRunner {
    pub meta: ChannelMeta,
    pub request: StreamRequest,
    pub transport: Arc<dyn StreamTransport>,
    pub registry: RequestRegistry,
    pub cancel: CancelHandle,
    pub bus: Arc<NotificationBus>,
    pub logger: Arc<dyn ConversationLogger>,
    pub delay: Duration,
    pub state: watch::Sender<ChannelState>,
    pub text: watch::Sender<String>,
}

impl ChannelRunner {
    pub async fn run(self) -> ReconciledResult {
        let mut reconciler = ContentReconciler::new(self.meta.clone())
            .with_conversation_id(self.request.conversation_id.clone());

        let (result, state) = match self.drive(&mut reconciler).await {
            Ok(result) if result.is_success() => (result, ChannelState::Completed),
            Ok(result) => (result, ChannelState::Failed),
            Err(error) => {
                let state = if error.is_cancelled() {
                    ChannelState::Cancelled
                } else {
                    ChannelState::Failed
                };
                let result = match reconciler.fail(&error) {
                    Some(result) => result,
                    None => ReconciledResult::failure(&self.meta, "", "", &error),
                };
                (result, state)
            }
        };

        self.registry.complete(&self.meta.request_id);
        self.text.send_if_modified(|text| {
            if *text == result.text {
                return false;
            }
            text.clone_from(&result.text);
            true
        });
        self.transition(state);
        self.report(&result, state);
        result
    }

    async fn drive(
        &self,
        reconciler: &mut ContentReconciler,
    ) -> Result<ReconciledResult, ChannelError> {
        if !self.delay.is_zero() {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(self.cancel.error()),
                _ = tokio::time::sleep(self.delay) => {}
            }
        }

        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(self.cancel.error()),
            response = self.transport.open(&self.request) => response?,
        };
        if !response.is_success() {
            debug!(
                "Channel {}: transport returned {}",
                self.meta.request_id, response.status
            );
            return Err(ChannelError::TransportStatus(response.status));
        }

        self.transition(ChannelState::Streaming);
        let mut body = response.body;
        let mut parser = FrameParser::new();

        loop {
            let chunk = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(self.cancel.error()),
                chunk = body.next() => chunk,
            };

            match chunk {
                Some(Ok(bytes)) => {
                    for event in parser.feed(&bytes) {
                        if let Some(result) = self.apply(reconciler, &event) {
                            return Ok(result);
                        }
                    }
                }
                Some(Err(e)) => return Err(e.into()),
                None => {
                    for event in parser.finish() {
                        if let Some(result) = self.apply(reconciler, &event) {
                            return Ok(result);
                        }
                    }
                    return Err(ChannelError::StreamTerminatedWithoutMarker);
                }
            }
        }
    }

    fn apply(
        &self,
        reconciler: &mut ContentReconciler,
        event: &StreamEvent,
    ) -> Option<ReconciledResult> {
        match reconciler.apply(event) {
            ReconcileStep::Updated => {
                self.text.send_replace(reconciler.text().to_string());
                None
            }
            ReconcileStep::Finished(result) => Some(result),
            ReconcileStep::Unchanged | ReconcileStep::Ignored => None,
        }
    }

    fn transition(&self, next: ChannelState) {
        let id = &self.meta.request_id;
        self.state.send_if_modified(|state| {
            if !state.can_transition_to(next) {
                return false;
            }
            debug!("Channel {}: {} -> {}", id, state, next);
            *state = next;
            true
        });
    }

    fn report(&self, result: &ReconciledResult, state: ChannelState) {
        let event_type = if state == ChannelState::Cancelled {
            "channel_cancelled"
        } else {
            "channel_finished"
        };
        self.logger.log(ConversationEvent::new(
            event_type,
            serde_json::json!({
                "request_id": result.request_id,
                "channel": result.channel,
                "state": state.as_str(),
                "status": result.status,
                "message_id": result.message_id,
                "conversation_id": result.conversation_id,
                "text": result.text,
                "error": result.error,
            }),
        ));

        if self.meta.kind != ChannelKind::Auxiliary {
            return;
        }
        if let Some(error) = &result.error {
            warn!("Auxiliary channel {} failed: {}", result.request_id, error);
        }
        let report = self.bus.publish(result);
        debug!(
            "Channel {}: published to {} subscribers ({} failed)",
            result.request_id,
            report.delivered + report.failed,
            report.failed
        );
    }
}
