//! Channel vocabulary: which side of a turn a channel serves, where it is
//! in its lifecycle, and the single result it produces.

pub mod result;
pub mod state;

pub use result::{ChannelMeta, ReconciledResult, ResultStatus};
pub use state::{ChannelKind, ChannelState};
