//! Error types for forgechain

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ChainError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("invalid peer address: {0}")]
    InvalidPeerAddress(String),

    #[error("peer error: {0}")]
    PeerError(String),

    #[error("invalid chain: {0}")]
    InvalidChain(String),

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("mining was cancelled")]
    MiningCancelled,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
