//! Named business-rule processors run over successful results.
//!
//! A [`ProcessorRegistry`] is itself a bus subscriber: every successful
//! result it receives is handed to each enabled [`ResultProcessor`] in
//! registration order. One processor failing (or panicking) produces a
//! failed [`ProcessOutcome`] and does not stop the others.

use super::bus::{ResultSubscriber, SubscriberError};
use chrono::{DateTime, Utc};
use relay_domain::ReconciledResult;
use serde::Serialize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessorError {
    #[error("{0}")]
    Failed(String),
}

/// A rule that extracts structured data from a finished answer.
pub trait ResultProcessor: Send + Sync {
    /// Unique name; registering a second processor with the same name
    /// replaces the first.
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn process(&self, result: &ReconciledResult) -> Result<serde_json::Value, ProcessorError>;
}

/// Result of running one processor on one result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessOutcome {
    pub processor: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Registered processor metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorInfo {
    pub name: String,
    pub description: String,
    pub enabled: bool,
}

struct Registered {
    processor: Arc<dyn ResultProcessor>,
    enabled: bool,
}

/// Ordered set of named processors.
pub struct ProcessorRegistry {
    processors: RwLock<Vec<Registered>>,
    last_outcomes: Mutex<Vec<ProcessOutcome>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self {
            processors: RwLock::new(Vec::new()),
            last_outcomes: Mutex::new(Vec::new()),
        }
    }

    /// Register an enabled processor, replacing any with the same name.
    pub fn register(&self, processor: Arc<dyn ResultProcessor>) {
        let mut processors = self.processors.write().unwrap_or_else(|e| e.into_inner());
        match processors
            .iter_mut()
            .find(|r| r.processor.name() == processor.name())
        {
            Some(existing) => {
                debug!("Processors: replacing '{}'", processor.name());
                existing.processor = processor;
                existing.enabled = true;
            }
            None => {
                debug!("Processors: registered '{}'", processor.name());
                processors.push(Registered {
                    processor,
                    enabled: true,
                });
            }
        }
    }

    /// Enable or disable a processor by name. Returns `false` if unknown.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let mut processors = self.processors.write().unwrap_or_else(|e| e.into_inner());
        match processors.iter_mut().find(|r| r.processor.name() == name) {
            Some(registered) => {
                registered.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn processors(&self) -> Vec<ProcessorInfo> {
        let processors = self.processors.read().unwrap_or_else(|e| e.into_inner());
        processors
            .iter()
            .map(|r| ProcessorInfo {
                name: r.processor.name().to_string(),
                description: r.processor.description().to_string(),
                enabled: r.enabled,
            })
            .collect()
    }

    /// Run every enabled processor on `result`, in registration order.
    pub fn process(&self, result: &ReconciledResult) -> Vec<ProcessOutcome> {
        let enabled: Vec<Arc<dyn ResultProcessor>> = {
            let processors = self.processors.read().unwrap_or_else(|e| e.into_inner());
            processors
                .iter()
                .filter(|r| r.enabled)
                .map(|r| Arc::clone(&r.processor))
                .collect()
        };

        enabled
            .iter()
            .map(|processor| {
                let name = processor.name().to_string();
                let outcome = catch_unwind(AssertUnwindSafe(|| processor.process(result)));
                match outcome {
                    Ok(Ok(data)) => ProcessOutcome {
                        processor: name,
                        success: true,
                        data: Some(data),
                        error: None,
                        timestamp: Utc::now(),
                    },
                    Ok(Err(e)) => {
                        warn!("Processor '{}' failed: {}", name, e);
                        ProcessOutcome {
                            processor: name,
                            success: false,
                            data: None,
                            error: Some(e.to_string()),
                            timestamp: Utc::now(),
                        }
                    }
                    Err(_) => {
                        warn!("Processor '{}' panicked", name);
                        ProcessOutcome {
                            processor: name,
                            success: false,
                            data: None,
                            error: Some("processor panicked".to_string()),
                            timestamp: Utc::now(),
                        }
                    }
                }
            })
            .collect()
    }

    /// Outcomes of the most recently processed result.
    pub fn last_outcomes(&self) -> Vec<ProcessOutcome> {
        self.last_outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSubscriber for ProcessorRegistry {
    fn name(&self) -> &str {
        "processors"
    }

    fn on_result(&self, result: &ReconciledResult) -> Result<(), SubscriberError> {
        if !result.is_success() {
            return Ok(());
        }
        let outcomes = self.process(result);
        debug!(
            "Processors: {} outcomes for {}",
            outcomes.len(),
            result.request_id
        );
        *self.last_outcomes.lock().unwrap_or_else(|e| e.into_inner()) = outcomes;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_domain::{ChannelError, ChannelKind, ChannelMeta, RequestId};

    struct Length;

    impl ResultProcessor for Length {
        fn name(&self) -> &str {
            "length"
        }

        fn description(&self) -> &str {
            "counts characters"
        }

        fn process(&self, result: &ReconciledResult) -> Result<serde_json::Value, ProcessorError> {
            Ok(serde_json::json!({ "chars": result.text.chars().count() }))
        }
    }

    struct Broken;

    impl ResultProcessor for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn process(&self, _: &ReconciledResult) -> Result<serde_json::Value, ProcessorError> {
            Err(ProcessorError::Failed("no rules loaded".to_string()))
        }
    }

    struct Exploding;

    impl ResultProcessor for Exploding {
        fn name(&self) -> &str {
            "exploding"
        }

        fn process(&self, _: &ReconciledResult) -> Result<serde_json::Value, ProcessorError> {
            panic!("boom")
        }
    }

    fn meta() -> ChannelMeta {
        ChannelMeta::new(
            RequestId::from("auxiliary-request-1-0"),
            ChannelKind::Auxiliary,
            "q",
        )
    }

    #[test]
    fn test_failures_are_isolated_per_processor() {
        let registry = ProcessorRegistry::new();
        registry.register(Arc::new(Broken));
        registry.register(Arc::new(Exploding));
        registry.register(Arc::new(Length));

        let outcomes = registry.process(&ReconciledResult::success(&meta(), "", "", "four"));
        assert_eq!(outcomes.len(), 3);
        assert!(!outcomes[0].success);
        assert_eq!(outcomes[0].error.as_deref(), Some("no rules loaded"));
        assert!(!outcomes[1].success);
        assert!(outcomes[2].success);
        assert_eq!(outcomes[2].data, Some(serde_json::json!({ "chars": 4 })));
    }

    #[test]
    fn test_disabled_processors_are_skipped() {
        let registry = ProcessorRegistry::new();
        registry.register(Arc::new(Length));
        assert!(registry.set_enabled("length", false));
        assert!(!registry.set_enabled("missing", false));

        let outcomes = registry.process(&ReconciledResult::success(&meta(), "", "", "x"));
        assert!(outcomes.is_empty());
        assert!(!registry.processors()[0].enabled);
    }

    #[test]
    fn test_same_name_replaces() {
        let registry = ProcessorRegistry::new();
        registry.register(Arc::new(Length));
        registry.register(Arc::new(Length));
        let infos = registry.processors();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].description, "counts characters");
    }

    #[test]
    fn test_subscriber_ignores_failed_results() {
        let registry = ProcessorRegistry::new();
        registry.register(Arc::new(Length));

        let failed = ReconciledResult::failure(&meta(), "", "", &ChannelError::Timeout);
        registry.on_result(&failed).unwrap();
        assert!(registry.last_outcomes().is_empty());

        let ok = ReconciledResult::success(&meta(), "", "", "hello");
        registry.on_result(&ok).unwrap();
        assert_eq!(registry.last_outcomes().len(), 1);
    }
}
