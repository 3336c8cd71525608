//! Test helpers: a recording account that answers gateway requests from
//! canned envelopes

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gateway_client::{Account, GatewayClient, GatewayError};
use reqwest::header::HeaderMap;
use serde_json::{json, Map, Value};

/// One request as seen by the account
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub body: Option<Map<String, Value>>,
}

impl RecordedCall {
    /// Bus method of a ubus POST
    pub fn method(&self) -> Option<&str> {
        self.body.as_ref()?.get("method")?.as_str()
    }

    /// Decoded `message` field of a ubus POST
    pub fn message(&self) -> Option<Value> {
        let raw = self.body.as_ref()?.get("message")?.as_str()?;
        serde_json::from_str(raw).ok()
    }

    pub fn device_id(&self) -> Option<&str> {
        self.body.as_ref()?.get("deviceId")?.as_str()
    }
}

/// Canned answer for one request
#[derive(Debug, Clone)]
pub enum Reply {
    Envelope(Value),
    Fail(String),
    Unauthorized,
}

/// Account double that records every call
pub struct RecordingAccount {
    listing: Mutex<Reply>,
    by_method: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingAccount {
    pub fn new(listing: Value) -> Arc<Self> {
        Arc::new(Self {
            listing: Mutex::new(Reply::Envelope(listing)),
            by_method: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Account whose listing comes from `tests/fixtures/device_list.json`
    pub fn with_fixture_listing() -> Arc<Self> {
        Self::new(load_fixture("device_list.json"))
    }

    pub fn set_listing(&self, reply: Reply) {
        *self.listing.lock().unwrap() = reply;
    }

    pub fn reply_to(&self, method: &str, reply: Reply) {
        self.by_method
            .lock()
            .unwrap()
            .insert(method.to_string(), reply);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn listing_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.url.contains("/admin/v2/device_list"))
            .count()
    }

    pub fn ubus_calls(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.url.ends_with("/remote/ubus"))
            .collect()
    }
}

pub fn success_envelope() -> Value {
    json!({"code": 0, "message": "Success", "data": {"code": 0, "info": "{}"}})
}

pub fn load_fixture(filename: &str) -> Value {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(filename);

    let raw = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", filename, e));
    serde_json::from_str(&raw).unwrap_or_else(|e| panic!("Bad fixture {}: {}", filename, e))
}

pub fn gateway(account: Arc<RecordingAccount>) -> GatewayClient {
    GatewayClient::with_base_url(account, "https://gateway.test")
}

#[async_trait]
impl Account for RecordingAccount {
    async fn request(
        &self,
        _service: &str,
        url: &str,
        body: Option<&Map<String, Value>>,
        _headers: &HeaderMap,
    ) -> gateway_client::Result<Value> {
        self.calls.lock().unwrap().push(RecordedCall {
            url: url.to_string(),
            body: body.cloned(),
        });

        let reply = if url.contains("/admin/v2/device_list") {
            self.listing.lock().unwrap().clone()
        } else {
            let method = body
                .and_then(|b| b.get("method"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            self.by_method
                .lock()
                .unwrap()
                .get(method)
                .cloned()
                .unwrap_or_else(|| Reply::Envelope(success_envelope()))
        };

        match reply {
            Reply::Envelope(envelope) => Ok(envelope),
            Reply::Fail(msg) => Err(GatewayError::Network(msg)),
            Reply::Unauthorized => Err(GatewayError::Auth("401 Unauthorized".to_string())),
        }
    }
}
