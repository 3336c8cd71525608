//! Private gateway client for the Mina cloud RPC service
//!
//! This crate provides a minimal client for the vendor's HTTPS gateway that
//! fronts the smart speakers. It attaches the request-scoped `requestId`
//! nonce and the client identification header, delegates the authenticated
//! exchange to an [`Account`], and unwraps the `{code, message, data}` envelope.

mod account;
mod error;

pub use account::{Account, Credentials, TokenFileAccount, TokenStore};
pub use error::{GatewayError, Result};

use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::{Map, Value};
use tracing::debug;

/// Base URL of the speaker gateway
pub const GATEWAY_BASE_URL: &str = "https://api2.mina.mi.com";

/// Service name the account uses to pick credentials for the gateway
pub const MICO_SERVICE: &str = "micoapi";

/// Prefix of every `requestId` nonce
pub const REQUEST_ID_PREFIX: &str = "app_ios_";

const REQUEST_ID_TOKEN_LEN: usize = 30;

const CLIENT_USER_AGENT: &str = "MiHome/6.0.103 (com.xiaomi.mihome; build:6.0.103.1; iOS 14.4.0) Alamofire/6.0.103 MICO/iOSApp/appStore/6.0.103";

/// Generate a fresh `app_ios_<30 alphanumerics>` request id
pub fn request_id() -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REQUEST_ID_TOKEN_LEN)
        .map(char::from)
        .collect();
    format!("{}{}", REQUEST_ID_PREFIX, token)
}

/// A minimal client for the speaker gateway
#[derive(Clone)]
pub struct GatewayClient {
    account: Arc<dyn Account>,
    base_url: String,
}

impl GatewayClient {
    /// Create a client against the production gateway
    pub fn new(account: Arc<dyn Account>) -> Self {
        Self::with_base_url(account, GATEWAY_BASE_URL)
    }

    /// Create a client against a custom gateway location
    pub fn with_base_url(account: Arc<dyn Account>, base_url: impl Into<String>) -> Self {
        Self {
            account,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `uri`, carrying the request id as a query parameter
    pub async fn get(&self, uri: &str) -> Result<Value> {
        let separator = if uri.contains('?') { '&' } else { '?' };
        let uri = format!("{}{}requestId={}", uri, separator, request_id());
        self.request(&uri, None).await
    }

    /// POST `fields` to `uri`, carrying the request id inside the body
    pub async fn post(&self, uri: &str, mut fields: Map<String, Value>) -> Result<Value> {
        fields.insert("requestId".to_string(), Value::String(request_id()));
        self.request(uri, Some(&fields)).await
    }

    async fn request(&self, uri: &str, body: Option<&Map<String, Value>>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, uri);
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        debug!(%url, post = body.is_some(), "gateway request");
        let envelope = self
            .account
            .request(MICO_SERVICE, &url, body, &headers)
            .await?;

        Self::extract_data(envelope)
    }

    /// Check the envelope code and return the whole envelope on success
    fn extract_data(envelope: Value) -> Result<Value> {
        if !envelope.is_object() {
            return Err(GatewayError::Parse(format!(
                "expected a JSON object, got {}",
                envelope
            )));
        }

        let code = envelope.get("code").and_then(Value::as_i64).unwrap_or(0);
        if code != 0 {
            let message = envelope
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(GatewayError::Backend { code, message });
        }

        Ok(envelope)
    }
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
