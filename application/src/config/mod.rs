//! Application-level configuration.
//!
//! - [`OrchestratorConfig`]: channel timing, auxiliary query shaping, history size

pub mod orchestrator_config;

pub use orchestrator_config::{
    DEFAULT_AUXILIARY_DELAY, DEFAULT_BATCH_SPACING, DEFAULT_IDLE_TIMEOUT, OrchestratorConfig,
};
