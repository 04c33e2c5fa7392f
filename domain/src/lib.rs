//! Domain layer for dual-relay
//!
//! This crate contains the pure, runtime-free core of the streaming request
//! engine. It has no dependencies on transports, async runtimes, or UI.
//!
//! # Core Concepts
//!
//! ## Channel
//!
//! One streaming request/response exchange for a single logical turn. A
//! turn always has a **primary** channel and may have an **auxiliary**
//! channel against a second target. Each channel moves through
//! [`ChannelState`] and produces exactly one [`ReconciledResult`].
//!
//! ## Frames and events
//!
//! The transport body is an SSE stream. [`FrameParser`] turns raw chunks into
//! [`StreamEvent`]s; [`ContentReconciler`] folds them into one text buffer,
//! replacing (never appending) on every cumulative `delta` snapshot.

pub mod channel;
pub mod core;
pub mod stream;

// Re-export commonly used types
pub use channel::{ChannelKind, ChannelMeta, ChannelState, ReconciledResult, ResultStatus};
pub use crate::core::{
    error::ChannelError,
    request_id::RequestId,
    turn::{ConversationContext, FileAttachment, StreamRequest, Turn},
};
pub use stream::{
    ContentReconciler, FrameIds, FrameParser, ReconcileStep, StreamEvent, WireFrame,
};
