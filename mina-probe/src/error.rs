//! Error types for duration probing.

use std::fmt;

/// Error type for probe operations.
#[derive(Debug)]
pub enum ProbeError {
    /// The resource could not be fetched (connection failure, error status)
    Network(String),
    /// The URL cannot be probed at all
    Unsupported(String),
    /// Neither probe window contained a readable audio header
    DurationUnavailable(String),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Network(msg) => write!(f, "Network error: {}", msg),
            ProbeError::Unsupported(msg) => write!(f, "Unsupported resource: {}", msg),
            ProbeError::DurationUnavailable(url) => write!(f, "Duration unavailable for {}", url),
        }
    }
}

impl std::error::Error for ProbeError {}

impl From<reqwest::Error> for ProbeError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_builder() {
            ProbeError::Unsupported(error.to_string())
        } else {
            ProbeError::Network(error.to_string())
        }
    }
}

/// Convenience Result type alias for probe operations.
pub type Result<T> = std::result::Result<T, ProbeError>;
