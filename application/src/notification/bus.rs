//! Multi-subscriber publish mechanism for finished channel results.
//!
//! Subscribers are capability objects implementing [`ResultSubscriber`],
//! stored in subscription order and addressed by an opaque
//! [`SubscriptionToken`]. Publishing delivers a result to every current
//! subscriber in order. A subscriber that returns an error **or panics** is
//! logged and skipped; the remaining subscribers still run.

use relay_domain::ReconciledResult;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

/// Error a subscriber may report for one result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscriberError {
    #[error("Subscriber failed: {0}")]
    Failed(String),
}

/// Registration token returned by [`NotificationBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(u64);

impl SubscriptionToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// A downstream consumer of channel results (UI, business-rule processors).
pub trait ResultSubscriber: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    fn on_result(&self, result: &ReconciledResult) -> Result<(), SubscriberError>;
}

/// Adapter turning a closure into a [`ResultSubscriber`].
pub struct FnSubscriber<F> {
    name: String,
    handler: F,
}

impl<F> FnSubscriber<F>
where
    F: Fn(&ReconciledResult) -> Result<(), SubscriberError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

impl<F> ResultSubscriber for FnSubscriber<F>
where
    F: Fn(&ReconciledResult) -> Result<(), SubscriberError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_result(&self, result: &ReconciledResult) -> Result<(), SubscriberError> {
        (self.handler)(result)
    }
}

/// Outcome of one [`NotificationBus::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Notification Bus.
///
/// The subscriber list is guarded by a lock that is only held to mutate it
/// or to take a snapshot; handlers run outside the lock, so a handler may
/// itself subscribe or unsubscribe without deadlocking.
pub struct NotificationBus {
    subscribers: RwLock<Vec<(SubscriptionToken, Arc<dyn ResultSubscriber>)>>,
    next_token: AtomicU64,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_token: AtomicU64::new(1),
        }
    }

    /// Append a subscriber; it receives results published from now on.
    pub fn subscribe(&self, subscriber: Arc<dyn ResultSubscriber>) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        debug!(
            "Bus: subscribed '{}' (token {})",
            subscriber.name(),
            token.0
        );
        let mut subscribers = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        subscribers.push((token, subscriber));
        token
    }

    /// Remove a subscriber. Returns `false` if the token was already removed.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut subscribers = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        match subscribers.iter().position(|(t, _)| *t == token) {
            Some(index) => {
                let (_, subscriber) = subscribers.remove(index);
                debug!(
                    "Bus: unsubscribed '{}' (token {})",
                    subscriber.name(),
                    token.0
                );
                true
            }
            None => false,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        let subscribers = self.subscribers.read().unwrap_or_else(|e| e.into_inner());
        subscribers.len()
    }

    /// Deliver `result` to every current subscriber in subscription order.
    pub fn publish(&self, result: &ReconciledResult) -> PublishReport {
        let snapshot: Vec<Arc<dyn ResultSubscriber>> = {
            let subscribers = self.subscribers.read().unwrap_or_else(|e| e.into_inner());
            subscribers.iter().map(|(_, s)| Arc::clone(s)).collect()
        };

        let mut report = PublishReport::default();
        for subscriber in snapshot {
            match catch_unwind(AssertUnwindSafe(|| subscriber.on_result(result))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    warn!(
                        "Bus: subscriber '{}' failed on {}: {}",
                        subscriber.name(),
                        result.request_id,
                        e
                    );
                }
                Err(panic) => {
                    report.failed += 1;
                    warn!(
                        "Bus: subscriber '{}' panicked on {}: {}",
                        subscriber.name(),
                        result.request_id,
                        panic_message(panic.as_ref())
                    );
                }
            }
        }
        report
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_domain::{ChannelKind, ChannelMeta, RequestId};
    use std::sync::Mutex;

    fn result() -> ReconciledResult {
        let meta = ChannelMeta::new(
            RequestId::from("auxiliary-request-1-0"),
            ChannelKind::Auxiliary,
            "q",
        );
        ReconciledResult::success(&meta, "m", "c", "text")
    }

    fn recorder(
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    ) -> Arc<dyn ResultSubscriber> {
        Arc::new(FnSubscriber::new(name, move |_| {
            log.lock().unwrap().push(name);
            Ok(())
        }))
    }

    #[test]
    fn test_publishes_in_subscription_order() {
        let bus = NotificationBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(recorder("first", Arc::clone(&log)));
        bus.subscribe(recorder("second", Arc::clone(&log)));
        bus.subscribe(recorder("third", Arc::clone(&log)));

        let report = bus.publish(&result());
        assert_eq!(report.delivered, 3);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bus = NotificationBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let token = bus.subscribe(recorder("only", Arc::clone(&log)));

        assert!(bus.unsubscribe(token));
        assert!(!bus.unsubscribe(token));
        assert_eq!(bus.subscriber_count(), 0);

        bus.publish(&result());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failing_subscriber_does_not_blind_others() {
        let bus = NotificationBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(recorder("before", Arc::clone(&log)));
        bus.subscribe(Arc::new(FnSubscriber::new("erroring", |_| {
            Err(SubscriberError::Failed("nope".to_string()))
        })));
        bus.subscribe(Arc::new(FnSubscriber::new("panicking", |_| {
            panic!("handler exploded")
        })));
        bus.subscribe(recorder("after", Arc::clone(&log)));

        let report = bus.publish(&result());
        assert_eq!(report, PublishReport { delivered: 2, failed: 2 });
        assert_eq!(*log.lock().unwrap(), vec!["before", "after"]);
    }

    #[test]
    fn test_tokens_are_unique() {
        let bus = NotificationBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = bus.subscribe(recorder("a", Arc::clone(&log)));
        let b = bus.subscribe(recorder("b", Arc::clone(&log)));
        assert_ne!(a, b);
        assert!(bus.unsubscribe(a));
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_handler_may_unsubscribe_itself() {
        let bus = Arc::new(NotificationBus::new());
        let slot: Arc<Mutex<Option<SubscriptionToken>>> = Arc::new(Mutex::new(None));

        let bus_ref = Arc::clone(&bus);
        let slot_ref = Arc::clone(&slot);
        let token = bus.subscribe(Arc::new(FnSubscriber::new("once", move |_| {
            if let Some(token) = slot_ref.lock().unwrap().take() {
                bus_ref.unsubscribe(token);
            }
            Ok(())
        })));
        *slot.lock().unwrap() = Some(token);

        assert_eq!(bus.publish(&result()).delivered, 1);
        assert_eq!(bus.publish(&result()).delivered, 0);
    }
}
