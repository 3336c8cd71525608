//! The account collaborator boundary
//!
//! Everything credential related (login, token refresh, retry on expiry) lives
//! behind the [`Account`] trait. The gateway client only hands it a fully formed
//! request and receives the parsed JSON envelope back.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{GatewayError, Result};

/// Authenticated request issuer for a vendor cloud service.
///
/// `body` of `None` means a GET request, otherwise the fields are POSTed.
/// Implementations return the parsed JSON response; any error is treated as
/// fatal for the command that issued it.
#[async_trait]
pub trait Account: Send + Sync {
    async fn request(
        &self,
        service: &str,
        url: &str,
        body: Option<&Map<String, Value>>,
        headers: &HeaderMap,
    ) -> Result<Value>;
}

/// User credentials as supplied by the environment
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Reject obviously unusable credentials before any network traffic
    pub fn validate(&self) -> Result<()> {
        if self.user.trim().is_empty() {
            return Err(GatewayError::Auth("user name is empty".to_string()));
        }
        if self.password.is_empty() {
            return Err(GatewayError::Auth("password is empty".to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// On-disk session cache written by the vendor login flow.
///
/// Each service entry is a `[ssecurity, serviceToken]` pair keyed by service name.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenStore {
    #[serde(rename = "userId")]
    user_id: Value,
    #[serde(rename = "deviceId", default)]
    device_id: Option<String>,
    #[serde(flatten)]
    services: HashMap<String, Value>,
}

impl TokenStore {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| GatewayError::Auth(format!("unreadable token store: {}", e)))
    }

    /// The account user id, which the store may hold as a number or a string
    pub fn user_id(&self) -> String {
        match &self.user_id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    /// The service token for `service`, if the store holds one
    pub fn service_token(&self, service: &str) -> Option<&str> {
        self.services
            .get(service)?
            .as_array()?
            .get(1)?
            .as_str()
    }
}

/// [`Account`] backed by a cached session token file.
///
/// Logging in is not performed here: a missing or rejected service token
/// surfaces as [`GatewayError::Auth`].
pub struct TokenFileAccount {
    http: reqwest::Client,
    user: String,
    token_path: PathBuf,
    token: RwLock<Option<TokenStore>>,
}

impl TokenFileAccount {
    pub fn new(http: reqwest::Client, credentials: &Credentials, token_path: impl Into<PathBuf>) -> Result<Self> {
        credentials.validate()?;
        Ok(Self {
            http,
            user: credentials.user.clone(),
            token_path: token_path.into(),
            token: RwLock::new(None),
        })
    }

    /// `~/.mi.token`, the location the vendor tooling writes to
    pub fn default_token_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".mi.token"))
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    async fn load(&self) -> Result<TokenStore> {
        if let Some(store) = self.token.read().await.as_ref() {
            return Ok(store.clone());
        }

        let json = tokio::fs::read_to_string(&self.token_path).await.map_err(|e| {
            GatewayError::Auth(format!(
                "no session for {} at {}: {}",
                self.user,
                self.token_path.display(),
                e
            ))
        })?;
        let store = TokenStore::from_json(&json)?;
        *self.token.write().await = Some(store.clone());
        Ok(store)
    }

    async fn forget(&self) {
        *self.token.write().await = None;
    }
}

#[async_trait]
impl Account for TokenFileAccount {
    async fn request(
        &self,
        service: &str,
        url: &str,
        body: Option<&Map<String, Value>>,
        headers: &HeaderMap,
    ) -> Result<Value> {
        let store = self.load().await?;
        let service_token = store.service_token(service).ok_or_else(|| {
            GatewayError::Auth(format!("no {} token cached for {}", service, self.user))
        })?;

        let cookie = format!("userId={}; serviceToken={}", store.user_id(), service_token);
        let cookie = HeaderValue::from_str(&cookie)
            .map_err(|e| GatewayError::Auth(format!("invalid token: {}", e)))?;

        let request = match body {
            None => self.http.get(url),
            Some(fields) => self.http.post(url).form(&form_fields(fields)),
        };

        debug!(service, url, "issuing account request");
        let response = request
            .headers(headers.clone())
            .header(COOKIE, cookie)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.forget().await;
            return Err(GatewayError::Auth(format!("{} rejected the session token", service)));
        }
        let text = response.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: Value = serde_json::from_str(&text)?;
        let code = envelope.get("code").and_then(Value::as_i64).unwrap_or(0);
        let message = envelope.get("message").and_then(Value::as_str).unwrap_or_default();
        if code != 0 && message.to_lowercase().contains("auth") {
            self.forget().await;
            return Err(GatewayError::Auth(message.to_string()));
        }

        Ok(envelope)
    }
}

/// Flatten a JSON object into form fields; strings are sent verbatim
fn form_fields(fields: &Map<String, Value>) -> Vec<(String, String)> {
    fields
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const STORE: &str = r#"{
        "deviceId": "ABCDEF0123456789",
        "userId": 123456789,
        "passToken": "pass",
        "micoapi": ["ssecurity==", "service-token-value"]
    }"#;

    #[test]
    fn test_token_store_parsing() {
        let store = TokenStore::from_json(STORE).unwrap();
        assert_eq!(store.user_id(), "123456789");
        assert_eq!(store.device_id(), Some("ABCDEF0123456789"));
        assert_eq!(store.service_token("micoapi"), Some("service-token-value"));
        assert_eq!(store.service_token("xiaomiio"), None);
    }

    #[test]
    fn test_token_store_rejects_garbage() {
        assert!(matches!(TokenStore::from_json("not json"), Err(GatewayError::Auth(_))));
    }

    #[test]
    fn test_credentials_validation() {
        assert!(Credentials::new("user@example.com", "secret").validate().is_ok());
        assert!(Credentials::new("", "secret").validate().is_err());
        assert!(Credentials::new("user", "").validate().is_err());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let debug = format!("{:?}", Credentials::new("user", "hunter2"));
        assert!(debug.contains("user"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_form_fields_keep_strings_verbatim() {
        let fields = json!({"deviceId": "abc", "message": "{\"a\":1}", "count": 2});
        let mut pairs = form_fields(fields.as_object().unwrap());
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("count".to_string(), "2".to_string()),
                ("deviceId".to_string(), "abc".to_string()),
                ("message".to_string(), "{\"a\":1}".to_string()),
            ]
        );
    }
}
