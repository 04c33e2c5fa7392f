//! Notification Bus and its stock subscribers.
//!
//! - [`NotificationBus`]: ordered, failure-isolated fan-out of results
//! - [`ResultHistory`]: bounded in-memory record of published results
//! - [`ProcessorRegistry`]: named business-rule processors

pub mod bus;
pub mod history;
pub mod processor;

pub use bus::{
    FnSubscriber, NotificationBus, PublishReport, ResultSubscriber, SubscriberError,
    SubscriptionToken,
};
pub use history::{HistoryFilter, ResultHistory};
pub use processor::{
    ProcessOutcome, ProcessorError, ProcessorInfo, ProcessorRegistry, ResultProcessor,
};
