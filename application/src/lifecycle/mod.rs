//! Request Lifecycle Registry
//!
//! Tracks every in-flight request by [`RequestId`](relay_domain::RequestId),
//! owns its cancellation capability, and enforces at-most-once cancellation
//! plus an idle-timeout deadline per request.

pub mod cancel;
pub mod registry;

pub use cancel::{CancelHandle, CancelReason};
pub use registry::{RegistryError, RequestRegistry};
