//! Scripted in-memory transport for orchestration tests.

use crate::ports::stream_transport::{StreamTransport, TransportError, TransportResponse};
use async_trait::async_trait;
use futures::StreamExt;
use relay_domain::StreamRequest;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Serves the same scripted response to every `open`.
pub struct ScriptedTransport {
    status: u16,
    chunks: Vec<Vec<u8>>,
    chunk_delay: Duration,
    hang: bool,
    connect_error: Option<String>,
    requests: Mutex<Vec<StreamRequest>>,
    opened_at: Mutex<Vec<Instant>>,
}

impl ScriptedTransport {
    /// One chunk per JSON payload, each framed as `data: {payload}\n\n`.
    pub fn frames(payloads: &[&str]) -> Self {
        let chunks = payloads
            .iter()
            .map(|p| format!("data: {p}\n\n").into_bytes())
            .collect();
        Self::raw(chunks)
    }

    pub fn raw(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            status: 200,
            chunks,
            chunk_delay: Duration::ZERO,
            hang: false,
            connect_error: None,
            requests: Mutex::new(Vec::new()),
            opened_at: Mutex::new(Vec::new()),
        }
    }

    /// A stream that never sends anything and never closes.
    pub fn hanging() -> Self {
        Self::raw(Vec::new()).then_hang()
    }

    pub fn refusing(reason: &str) -> Self {
        let mut transport = Self::raw(Vec::new());
        transport.connect_error = Some(reason.to_string());
        transport
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    /// Keep the stream open after the scripted chunks.
    pub fn then_hang(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn requests(&self) -> Vec<StreamRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn opened_at(&self) -> Vec<Instant> {
        self.opened_at.lock().unwrap().clone()
    }
}

#[async_trait]
impl StreamTransport for ScriptedTransport {
    async fn open(&self, request: &StreamRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.opened_at.lock().unwrap().push(Instant::now());

        if let Some(reason) = &self.connect_error {
            return Err(TransportError::Connection(reason.clone()));
        }

        let delay = self.chunk_delay;
        let scripted = futures::stream::iter(self.chunks.clone()).then(move |chunk| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok::<_, TransportError>(chunk)
        });
        let body = if self.hang {
            scripted.chain(futures::stream::pending::<Result<Vec<u8>, TransportError>>()).boxed()
        } else {
            scripted.boxed()
        };
        Ok(TransportResponse::new(self.status, body))
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}
