//! Infrastructure layer for dual-relay
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the HTTP streaming transport, configuration
//! file loading, conversation logging, and result processors.

pub mod config;
pub mod dify;
pub mod logging;
pub mod processors;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileAuxiliaryConfig, FileConfig, FileLoggingConfig,
    FileOrchestratorConfig, FilePrimaryConfig, TargetSettings,
};
pub use dify::{DifyError, DifyTransport};
pub use logging::JsonlConversationLogger;
pub use processors::AddressRecognitionProcessor;
