//! Core domain concepts shared across all subdomains.
//!
//! - [`request_id::RequestId`]: opaque, never-reused request identity
//! - [`turn::Turn`]: one logical user turn and the payload sent upstream
//! - [`error::ChannelError`]: why a channel ended without an answer

pub mod error;
pub mod request_id;
pub mod turn;
