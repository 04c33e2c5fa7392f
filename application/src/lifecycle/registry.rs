//! In-flight request table with at-most-once cancellation and idle timeouts.
//!
//! Every request the orchestrator issues is registered here together with
//! its [`CancelHandle`]. An entry leaves the table exactly once, through one
//! of three doors:
//!
//! | Door | Triggered by | Cancels? | Reason |
//! |------|--------------|----------|--------|
//! | [`complete`](RequestRegistry::complete) | channel reached a terminal event | no | - |
//! | [`cancel`](RequestRegistry::cancel) / [`cancel_all`](RequestRegistry::cancel_all) | caller / teardown | yes | `Cancelled` |
//! | idle timer | deadline expiry | yes | `Timeout` |
//!
//! # Timeout policy
//!
//! The idle timer is a deadline measured from registration. It is **not**
//! reset by frame arrival, including `ping` frames: a channel that only
//! ever receives pings is still cancelled when the deadline passes.

use super::cancel::{CancelHandle, CancelReason};
use relay_domain::RequestId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Request already registered: {0}")]
    AlreadyRegistered(RequestId),
}

struct Entry {
    handle: CancelHandle,
    timer: Option<JoinHandle<()>>,
    registered_at: Instant,
    order: u64,
}

struct RegistryInner {
    entries: Mutex<HashMap<RequestId, Entry>>,
    idle_timeout: Duration,
    next_order: AtomicU64,
}

impl RegistryInner {
    fn remove(&self, request_id: &RequestId) -> Option<Entry> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(request_id)
    }

    fn expire(&self, request_id: &RequestId) {
        // The timer task is the caller; dropping its handle detaches it.
        if let Some(entry) = self.remove(request_id) {
            warn!(
                "Registry: {} timed out after {:?}",
                request_id,
                entry.registered_at.elapsed()
            );
            entry.handle.trigger(CancelReason::Timeout);
        }
    }
}

/// Request Lifecycle Registry.
///
/// Cheap to clone; clones share the same table. The table is the only
/// cross-task state and is guarded by a mutex held just long enough to
/// insert or remove an entry. Cancellation signals are raised after the
/// lock is released.
///
/// Registration arms a timer with [`tokio::spawn`], so it must happen
/// inside a Tokio runtime.
#[derive(Clone)]
pub struct RequestRegistry {
    inner: Arc<RegistryInner>,
}

impl RequestRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                entries: Mutex::new(HashMap::new()),
                idle_timeout,
                next_order: AtomicU64::new(0),
            }),
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.inner.idle_timeout
    }

    /// Register a request with the default idle timeout.
    pub fn register(
        &self,
        request_id: RequestId,
        handle: CancelHandle,
    ) -> Result<(), RegistryError> {
        self.register_with_timeout(request_id, handle, self.inner.idle_timeout)
    }

    /// Register a request whose deadline is `timeout` from now.
    pub fn register_with_timeout(
        &self,
        request_id: RequestId,
        handle: CancelHandle,
        timeout: Duration,
    ) -> Result<(), RegistryError> {
        let mut entries = self.inner.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.contains_key(&request_id) {
            return Err(RegistryError::AlreadyRegistered(request_id));
        }

        let weak: Weak<RegistryInner> = Arc::downgrade(&self.inner);
        let timer_id = request_id.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(inner) = weak.upgrade() {
                inner.expire(&timer_id);
            }
        });

        debug!("Registry: registered {} (timeout {:?})", request_id, timeout);
        entries.insert(
            request_id,
            Entry {
                handle,
                timer: Some(timer),
                registered_at: Instant::now(),
                order: self.inner.next_order.fetch_add(1, Ordering::Relaxed),
            },
        );
        Ok(())
    }

    /// Cancel a live request.
    ///
    /// Returns `true` iff a live entry was found and cancelled; `false` if
    /// it already completed, timed out, or was cancelled before.
    pub fn cancel(&self, request_id: &RequestId) -> bool {
        match self.inner.remove(request_id) {
            Some(mut entry) => {
                if let Some(timer) = entry.timer.take() {
                    timer.abort();
                }
                entry.handle.trigger(CancelReason::Cancelled);
                debug!("Registry: cancelled {}", request_id);
                true
            }
            None => {
                debug!("Registry: cancel for inactive {}", request_id);
                false
            }
        }
    }

    /// Drop bookkeeping for a request that finished on its own.
    ///
    /// Returns `true` if the request was still registered.
    pub fn complete(&self, request_id: &RequestId) -> bool {
        match self.inner.remove(request_id) {
            Some(mut entry) => {
                if let Some(timer) = entry.timer.take() {
                    timer.abort();
                }
                debug!("Registry: completed {}", request_id);
                true
            }
            None => false,
        }
    }

    /// Cancel every registered request and return how many were affected.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<(RequestId, Entry)> = {
            let mut entries = self.inner.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.drain().collect()
        };

        let count = drained.len();
        for (_, mut entry) in drained {
            if let Some(timer) = entry.timer.take() {
                timer.abort();
            }
            entry.handle.trigger(CancelReason::Cancelled);
        }

        if count > 0 {
            info!("Registry: cancelled {} active requests", count);
        }
        count
    }

    pub fn is_active(&self, request_id: &RequestId) -> bool {
        let entries = self.inner.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.contains_key(request_id)
    }

    pub fn active_count(&self) -> usize {
        let entries = self.inner.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    /// Ids of live requests, oldest registration first.
    pub fn active_ids(&self) -> Vec<RequestId> {
        let entries = self.inner.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<(u64, RequestId)> = entries
            .iter()
            .map(|(id, entry)| (entry.order, id.clone()))
            .collect();
        ids.sort_unstable_by_key(|(order, _)| *order);
        ids.into_iter().map(|(_, id)| id).collect()
    }
}

impl Default for RequestRegistry {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_IDLE_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> RequestId {
        RequestId::from(s)
    }

    #[tokio::test]
    async fn test_cancel_is_at_most_once() {
        let registry = RequestRegistry::default();
        let handle = CancelHandle::new();
        registry.register(id("r1"), handle.clone()).unwrap();

        assert!(registry.cancel(&id("r1")));
        assert!(!registry.cancel(&id("r1")));
        assert!(handle.is_cancelled());
        assert_eq!(handle.reason(), Some(CancelReason::Cancelled));
    }

    #[tokio::test]
    async fn test_complete_removes_without_cancelling() {
        let registry = RequestRegistry::default();
        let handle = CancelHandle::new();
        registry.register(id("r1"), handle.clone()).unwrap();

        assert!(registry.complete(&id("r1")));
        assert!(!handle.is_cancelled());
        assert!(!registry.cancel(&id("r1")));
        assert!(!registry.complete(&id("r1")));
        assert_eq!(registry.active_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_rejected() {
        let registry = RequestRegistry::default();
        registry.register(id("dup"), CancelHandle::new()).unwrap();
        assert_eq!(
            registry.register(id("dup"), CancelHandle::new()),
            Err(RegistryError::AlreadyRegistered(id("dup")))
        );
        assert_eq!(registry.active_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_all_counts_and_is_idempotent() {
        let registry = RequestRegistry::default();
        let handles: Vec<_> = (0..3).map(|_| CancelHandle::new()).collect();
        for (i, handle) in handles.iter().enumerate() {
            registry
                .register(id(&format!("r{i}")), handle.clone())
                .unwrap();
        }

        assert_eq!(registry.cancel_all(), 3);
        assert_eq!(registry.cancel_all(), 0);
        assert!(handles.iter().all(CancelHandle::is_cancelled));
        assert!(registry.active_ids().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_cancels_with_timeout_reason() {
        let registry = RequestRegistry::new(Duration::from_secs(30));
        let handle = CancelHandle::new();
        registry.register(id("slow"), handle.clone()).unwrap();

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(!handle.is_cancelled());
        assert!(registry.is_active(&id("slow")));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(handle.is_cancelled());
        assert_eq!(handle.reason(), Some(CancelReason::Timeout));
        assert!(!registry.is_active(&id("slow")));
        assert!(!registry.cancel(&id("slow")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_request_never_times_out() {
        let registry = RequestRegistry::new(Duration::from_secs(30));
        let handle = CancelHandle::new();
        registry.register(id("fast"), handle.clone()).unwrap();
        registry.complete(&id("fast"));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!handle.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_ids_in_registration_order() {
        let registry = RequestRegistry::default();
        for name in ["b", "a", "c"] {
            registry.register(id(name), CancelHandle::new()).unwrap();
        }
        assert_eq!(registry.active_ids(), vec![id("b"), id("a"), id("c")]);
    }

    #[tokio::test]
    async fn test_per_request_timeout_overrides_default() {
        tokio::time::pause();
        let registry = RequestRegistry::new(Duration::from_secs(30));
        let handle = CancelHandle::new();
        registry
            .register_with_timeout(id("short"), handle.clone(), Duration::from_secs(1))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(handle.reason(), Some(CancelReason::Timeout));
    }
}
