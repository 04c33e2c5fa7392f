//! In-memory history of published results.

use super::bus::{ResultSubscriber, SubscriberError};
use relay_domain::{ReconciledResult, ResultStatus};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Filter for [`ResultHistory::entries`].
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    /// Substring that must appear in the query or the text.
    pub query: Option<String>,
    pub status: Option<ResultStatus>,
    /// Keep only the most recent `limit` matches.
    pub limit: Option<usize>,
}

impl HistoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_status(mut self, status: ResultStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, result: &ReconciledResult) -> bool {
        if let Some(status) = self.status
            && result.status != status
        {
            return false;
        }
        match self.query.as_deref() {
            Some(needle) => result.query.contains(needle) || result.text.contains(needle),
            None => true,
        }
    }
}

/// Bounded, process-local record of results, oldest first.
///
/// Subscribe it to the [`NotificationBus`](super::NotificationBus) to keep
/// every published result. Nothing is persisted.
pub struct ResultHistory {
    entries: Mutex<VecDeque<ReconciledResult>>,
    capacity: usize,
}

impl ResultHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&self, result: ReconciledResult) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(result);
    }

    pub fn entries(&self, filter: &HistoryFilter) -> Vec<ReconciledResult> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let matched: Vec<ReconciledResult> = entries
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        match filter.limit {
            Some(limit) if matched.len() > limit => matched[matched.len() - limit..].to_vec(),
            _ => matched,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl ResultSubscriber for ResultHistory {
    fn name(&self) -> &str {
        "history"
    }

    fn on_result(&self, result: &ReconciledResult) -> Result<(), SubscriberError> {
        self.record(result.clone());
        Ok(())
    }
}
