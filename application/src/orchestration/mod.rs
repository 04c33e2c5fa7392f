//! Channel Orchestrator
//!
//! - [`ChannelOrchestrator`]: submits turns, standalone and batched auxiliary queries
//! - [`ChannelHandle`] / [`TurnHandles`]: observe and await running channels

mod channel;
pub mod handle;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod testing;

pub use handle::{ChannelHandle, TurnHandles, TurnResults};
pub use orchestrator::{ChannelOrchestrator, OrchestratorError};
