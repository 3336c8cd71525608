use gateway_client::GatewayError;
use thiserror::Error;

/// High-level API errors for speaker operations
///
/// This enum separates the failures that end a whole command (authentication,
/// transport, lookup) from [`ApiError::CommandFailure`], which reports a single
/// rejected bus call and can be handled per device or per track.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The account collaborator could not authenticate the request
    #[error("Authentication failure: {0}")]
    AuthFailure(String),

    /// Network communication error
    ///
    /// Transport errors are never retried here; retry policy belongs to the
    /// account implementation.
    #[error("Transport error: {0}")]
    Transport(String),

    /// No device in the current listing matches the identifier
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The device listing could not be fetched
    #[error("Device registry unavailable: {0}")]
    RegistryUnavailable(String),

    /// A gateway bus call returned a non-success response
    #[error("Command {method} failed with code {code}: {message}")]
    CommandFailure {
        method: String,
        code: i64,
        message: String,
    },

    /// Invalid parameter value
    ///
    /// Covers volume out of range and similar caller mistakes that are caught
    /// before any request is sent.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Response parsing error
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl ApiError {
    /// Whether the failure is confined to one command and the caller may
    /// carry on with other devices or tracks
    pub fn is_command_failure(&self) -> bool {
        matches!(self, ApiError::CommandFailure { .. })
    }

    pub(crate) fn command(method: &str, error: GatewayError) -> Self {
        match error {
            GatewayError::Backend { code, message } => ApiError::CommandFailure {
                method: method.to_string(),
                code,
                message,
            },
            other => other.into(),
        }
    }
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

/// Convert from GatewayError to ApiError
impl From<GatewayError> for ApiError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::Auth(msg) => ApiError::AuthFailure(msg),
            GatewayError::Network(msg) => ApiError::Transport(msg),
            GatewayError::Http { status, body } => {
                ApiError::Transport(format!("HTTP {}: {}", status, body))
            }
            GatewayError::Parse(msg) => ApiError::ParseError(msg),
            GatewayError::Backend { code, message } => ApiError::CommandFailure {
                method: "request".to_string(),
                code,
                message,
            },
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        ApiError::ParseError(error.to_string())
    }
}
