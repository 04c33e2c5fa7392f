//! Stream processing: frames → events → one reconciled result.
//!
//! - [`parser::FrameParser`]: SSE bytes to [`event::StreamEvent`]s
//! - [`reconciler::ContentReconciler`]: events to a single text buffer and
//!   a terminal [`ReconciledResult`](crate::ReconciledResult)

pub mod event;
pub mod parser;
pub mod reconciler;

pub use event::{FrameIds, StreamEvent, WireFrame};
pub use parser::{DEFAULT_MAX_LINE_BYTES, FrameParser};
pub use reconciler::{ContentReconciler, ReconcileStep};
