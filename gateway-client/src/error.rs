//! Error types for the gateway client

use thiserror::Error;

/// Errors that can occur while talking to the cloud gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Credentials are missing, rejected or expired
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Network or HTTP transport error
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Response body was not the expected JSON envelope
    #[error("Response parsing error: {0}")]
    Parse(String),

    /// The gateway answered with a non-zero envelope code
    #[error("Gateway error {code}: {message}")]
    Backend { code: i64, message: String },
}

impl From<reqwest::Error> for GatewayError {
    fn from(error: reqwest::Error) -> Self {
        GatewayError::Network(error.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        GatewayError::Parse(error.to_string())
    }
}

/// Type alias for results that can return a GatewayError
pub type Result<T> = std::result::Result<T, GatewayError>;
