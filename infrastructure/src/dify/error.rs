//! Error types for the Dify adapter

use relay_application::TransportError;
use thiserror::Error;

/// Errors raised while building or using a [`DifyTransport`](super::DifyTransport)
#[derive(Error, Debug)]
pub enum DifyError {
    #[error("api_base cannot be empty")]
    EmptyApiBase,

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl From<DifyError> for TransportError {
    fn from(error: DifyError) -> Self {
        TransportError::Connection(error.to_string())
    }
}
