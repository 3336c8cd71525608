//! Device records from the gateway listing
//!
//! The listing endpoint returns an array of loosely typed records. Only the
//! fields needed for resolution and dispatch are decoded here; anything else
//! the backend sends is ignored.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Capability flag that makes a device reachable by broadcast regardless of
/// positional targeting
pub const REMOTE_TTS_CAPABILITY: &str = "yunduantts";

/// Identifier of a device as known to the gateway (`deviceID`)
///
/// Only the registry and decoded listings produce these, so every id that
/// reaches the dispatcher has been seen in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A speaker from the account's device listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "deviceID")]
    pub device_id: DeviceId,
    /// Hardware model string, used only to pick a dispatch scheme
    #[serde(default)]
    pub hardware: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub alias: String,
    #[serde(rename = "miotDID", default, deserialize_with = "lenient_string")]
    pub miot_did: String,
    #[serde(rename = "serialNumber", default)]
    pub serial_number: String,
    #[serde(default)]
    pub presence: String,
    #[serde(default, deserialize_with = "enabled_capabilities")]
    pub capabilities: BTreeSet<String>,
}

impl Device {
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    /// Whether the device advertises remote text-to-speech
    pub fn supports_remote_tts(&self) -> bool {
        self.has_capability(REMOTE_TTS_CAPABILITY)
    }

    /// Whether `identifier` names this device by id, miot id, name or alias
    pub fn matches(&self, identifier: &str) -> bool {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return false;
        }
        self.device_id.as_str() == identifier
            || self.miot_did == identifier
            || self.name.eq_ignore_ascii_case(identifier)
            || self.alias.eq_ignore_ascii_case(identifier)
    }
}

/// Decode the `data` array of a listing response, preserving backend order.
///
/// Records without a `deviceID` are skipped.
pub fn parse_listing(data: &Value) -> Vec<Device> {
    let Some(records) = data.as_array() else {
        return Vec::new();
    };

    records
        .iter()
        .filter_map(|record| match Device::deserialize(record) {
            Ok(device) if !device.device_id.as_str().is_empty() => Some(device),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("skipping unreadable device record: {}", e);
                None
            }
        })
        .collect()
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// The backend sends capabilities as a map of flag name to 0/1 (sometimes
/// bools or strings); keep the names whose value is truthy
fn enabled_capabilities<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(map) = value else {
        return Ok(BTreeSet::new());
    };

    Ok(map
        .into_iter()
        .filter(|(_, flag)| match flag {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0),
            Value::String(s) => !s.is_empty() && s != "0",
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
            Value::Null => false,
        })
        .map(|(name, _)| name)
        .collect())
}
