//! Application layer for dual-relay
//!
//! This crate contains the async orchestration core: the request lifecycle
//! registry, the channel orchestrator, the notification bus, port
//! definitions, and application configuration. It depends only on the
//! domain layer.

pub mod config;
pub mod lifecycle;
pub mod notification;
pub mod orchestration;
pub mod ports;

// Re-export commonly used types
pub use config::OrchestratorConfig;
pub use lifecycle::{CancelHandle, CancelReason, RegistryError, RequestRegistry};
pub use notification::{
    FnSubscriber, HistoryFilter, NotificationBus, ProcessOutcome, ProcessorError, ProcessorInfo,
    ProcessorRegistry, PublishReport, ResultHistory, ResultProcessor, ResultSubscriber,
    SubscriberError, SubscriptionToken,
};
pub use orchestration::{
    ChannelHandle, ChannelOrchestrator, OrchestratorError, TurnHandles, TurnResults,
};
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    stream_transport::{ByteStream, StreamTransport, TransportError, TransportResponse},
};
