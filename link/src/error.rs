//! Unified error handling for the link layer.

use thiserror::Error;

/// All possible errors from the link layer.
#[derive(Debug, Error)]
pub enum LinkError {
    // Transport errors
    #[error("no peripheral is bound")]
    NotConnected,

    #[error("peripheral disconnected mid-request")]
    Disconnected,

    #[error("frame decode failed: {0}")]
    Decode(String),

    #[error("session invalidated")]
    SessionInvalidated,

    // Protocol errors
    #[error("unexpected response to {request}: got {got}")]
    UnexpectedResponse {
        request: &'static str,
        got: &'static str,
    },

    #[error("peripheral rejected command: {0}")]
    Device(String),

    // Replica and persistence errors
    #[error("archive item not found: {0}")]
    ItemNotFound(String),

    #[error("manifest store error: {0}")]
    Store(String),

    #[error("engine error: {0}")]
    Engine(#[from] ferry_engine::Error),
}

/// Result type alias for link operations.
pub type Result<T> = std::result::Result<T, LinkError>;
