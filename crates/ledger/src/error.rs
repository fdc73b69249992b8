//! Error types for ledger clients

use thiserror::Error;

/// Result type for ledger client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while talking to a ledger node
#[derive(Debug, Error)]
pub enum ClientError {
    /// A fetch was attempted before `dial`
    #[error("ledger client is not dialed")]
    NotDialed,

    /// Endpoint could not be parsed
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not what the method returns
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Node answered with a JSON-RPC error object
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Node has no block at the requested height (yet)
    #[error("block not found: {0}")]
    NotFound(String),
}

impl ClientError {
    /// Create an RPC error
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
        }
    }

    /// Check if the node simply has no block at the requested height
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
