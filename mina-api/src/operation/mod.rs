//! Operation framework for gateway bus calls
//!
//! Every bus call is a method name addressed to a subsystem path on one
//! device, carrying a JSON message. An operation type ties those three
//! together with a typed request and a typed response.

pub mod macros;

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::service::Service;

/// Raw result of a successful bus call
#[derive(Debug, Clone, PartialEq)]
pub struct UbusResponse {
    /// Envelope code (always 0 for a response that reached the caller)
    pub code: i64,
    pub message: String,
    /// The `data` member of the envelope
    pub data: Value,
}

impl UbusResponse {
    /// Build a response from a gateway envelope, rejecting a nested failure
    /// code inside `data`
    pub fn from_envelope(method: &str, envelope: Value) -> Result<Self, ApiError> {
        let code = envelope.get("code").and_then(Value::as_i64).unwrap_or(0);
        let message = envelope
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let data = envelope.get("data").cloned().unwrap_or(Value::Null);

        if let Some(inner) = data.get("code").and_then(Value::as_i64) {
            if inner != 0 {
                let message = data
                    .get("message")
                    .or_else(|| data.get("info"))
                    .and_then(Value::as_str)
                    .unwrap_or(&message)
                    .to_string();
                return Err(ApiError::CommandFailure {
                    method: method.to_string(),
                    code: inner,
                    message,
                });
            }
        }

        Ok(Self { code, message, data })
    }

    /// Decode the JSON document the device embeds as a string in `data.info`
    pub fn info<T: serde::de::DeserializeOwned>(&self) -> Result<T, ApiError> {
        let info = self
            .data
            .get("info")
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::ParseError("response has no info document".to_string()))?;
        Ok(serde_json::from_str(info)?)
    }
}

/// Base trait for all gateway bus operations
pub trait UbusOperation {
    /// The request type for this operation
    type Request: Serialize;

    /// The response type for this operation
    type Response;

    /// The subsystem this operation is addressed to
    const SERVICE: Service;

    /// The bus method name
    const METHOD: &'static str;

    /// Build the JSON message sent with the call
    fn build_message(request: &Self::Request) -> Result<Value, ApiError> {
        Ok(serde_json::to_value(request)?)
    }

    /// Turn the raw bus response into the typed response
    fn parse_response(response: UbusResponse) -> Result<Self::Response, ApiError>;

    fn metadata() -> OperationMetadata {
        OperationMetadata {
            service: Self::SERVICE.name(),
            path: Self::SERVICE.path(),
            method: Self::METHOD,
        }
    }
}

/// Metadata about a bus operation, mostly for logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationMetadata {
    pub service: &'static str,
    pub path: &'static str,
    pub method: &'static str,
}
