//! Error types for the noLimit SDK

use thiserror::Error;

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, NoLimitError>;

/// Main error type for SDK operations
#[derive(Error, Debug)]
pub enum NoLimitError {
    /// Payment was required but no signer is configured
    #[error("Authorization error: {message}")]
    Auth { message: String },

    /// The server broke the payment protocol (malformed 402 body, repeated 402)
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Non-payment HTTP failure, network failure or timeout
    #[error("Transport error{}: {message}", .status.map(|s| format!(" (status {})", s)).unwrap_or_default())]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 encoding/decoding error
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invalid caller input
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Key material or signing failure
    #[error("Wallet error: {message}")]
    Wallet { message: String },

    /// Transaction decoding, signing or submission failure
    #[error("Transaction error: {message}")]
    Transaction { message: String },

    /// Mixer service failure
    #[error("Mixer error: {message}")]
    Mixer { message: String },
}

impl NoLimitError {
    /// Create an authorization error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a transport error carrying an HTTP status and body
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            message: body.into(),
        }
    }

    /// Create a transport error without a status (connection, timeout)
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a wallet error
    pub fn wallet(message: impl Into<String>) -> Self {
        Self::Wallet {
            message: message.into(),
        }
    }

    /// Create a transaction error
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction {
            message: message.into(),
        }
    }

    /// Create a mixer error
    pub fn mixer(message: impl Into<String>) -> Self {
        Self::Mixer {
            message: message.into(),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// HTTP status carried by a transport error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for NoLimitError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else {
            err.to_string()
        };
        Self::Transport {
            status: err.status().map(|s| s.as_u16()),
            message,
        }
    }
}
