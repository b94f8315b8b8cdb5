/*
[INPUT]:  Error sources (HTTP, API, serialization, wallet signer, session store)
[OUTPUT]: Structured error types with retry and auth classification
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the MERT session adapter
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error (code {code}): {message}")]
    Api { code: i32, message: String },

    /// Bearer token was rejected (HTTP 401)
    #[error("Unauthorized, session token is missing, invalid or expired")]
    Unauthorized,

    /// Wallet connect was rejected (bad signature or expired challenge)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// User declined the signature request in the wallet
    #[error("Signature request rejected by user")]
    UserRejected,

    /// Wallet is locked, gone, or otherwise unable to sign
    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session store could not be read or written
    #[error("Session store error: {0}")]
    Storage(#[from] std::io::Error),

    /// Request timed out
    #[error("Request timeout after {duration}s")]
    Timeout { duration: u64 },
}

impl ExchangeError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ExchangeError::Http(err) => !err.is_status() || err.is_timeout(),
            ExchangeError::Timeout { .. } | ExchangeError::InvalidResponse(_) => true,
            ExchangeError::Api { code, .. } => *code >= 500,
            _ => false,
        }
    }

    /// Check if error indicates authentication failure
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ExchangeError::Unauthorized | ExchangeError::Authentication { .. }
        )
    }

    /// Check if error came from the wallet rather than the backend
    pub fn is_wallet_error(&self) -> bool {
        matches!(
            self,
            ExchangeError::UserRejected | ExchangeError::WalletUnavailable(_)
        )
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        ExchangeError::Api {
            code: status.as_u16() as i32,
            message: message.into(),
        }
    }
}

/// Result type alias for MERT session operations
pub type Result<T> = std::result::Result<T, ExchangeError>;
