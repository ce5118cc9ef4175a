//! Error types for the ESC/POS transport

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// Connect did not complete in time or failed at the transport level
    ///
    /// Every connect failure collapses into this variant.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// `ensure_connected` was called before `connect` recorded a host and port
    #[error("Printer not configured: call connect() first")]
    NotConfigured,

    /// Write attempted with no open channel
    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    /// A pending status query was torn down before any reply arrived
    #[error("Connection closed while waiting for printer reply")]
    ConnectionClosed,

    /// Parameters rejected by the command encoder
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;

impl From<serde_json::Error> for PrintError {
    fn from(e: serde_json::Error) -> Self {
        PrintError::InvalidConfig(e.to_string())
    }
}
