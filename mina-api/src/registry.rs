//! Device registry
//!
//! Resolves user-facing identifiers to [`DeviceId`]s and hardware classes. The
//! listing is fetched lazily on first use and then served from memory until
//! [`DeviceRegistry::refresh`] is called.

use std::sync::Arc;

use gateway_client::{GatewayClient, GatewayError};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::device::{parse_listing, Device, DeviceId};
use crate::error::{ApiError, Result};

const DEVICE_LIST_URI: &str = "/admin/v2/device_list";

/// Lazily populated, never evicted view of the account's devices
pub struct DeviceRegistry {
    gateway: GatewayClient,
    master: u32,
    listing: Mutex<Option<Arc<Vec<Device>>>>,
}

impl DeviceRegistry {
    pub fn new(gateway: GatewayClient) -> Self {
        Self {
            gateway,
            master: 0,
            listing: Mutex::new(None),
        }
    }

    /// Fetch a listing straight from the gateway, bypassing the cache
    pub async fn fetch_listing(&self, master: u32) -> Result<Vec<Device>> {
        let uri = format!("{}?master={}", DEVICE_LIST_URI, master);
        let envelope = self.gateway.get(&uri).await.map_err(|e| match e {
            GatewayError::Auth(msg) => ApiError::AuthFailure(msg),
            other => ApiError::RegistryUnavailable(other.to_string()),
        })?;

        let devices = parse_listing(envelope.get("data").unwrap_or(&Value::Null));
        debug!(count = devices.len(), "fetched device listing");
        Ok(devices)
    }

    /// The cached listing, fetching it on first use
    pub async fn devices(&self) -> Result<Arc<Vec<Device>>> {
        let mut listing = self.listing.lock().await;
        if let Some(devices) = listing.as_ref() {
            return Ok(Arc::clone(devices));
        }

        let devices = Arc::new(self.fetch_listing(self.master).await?);
        *listing = Some(Arc::clone(&devices));
        Ok(devices)
    }

    /// Re-list devices and replace the cache
    pub async fn refresh(&self) -> Result<Arc<Vec<Device>>> {
        let devices = Arc::new(self.fetch_listing(self.master).await?);
        *self.listing.lock().await = Some(Arc::clone(&devices));
        Ok(devices)
    }

    /// Find the device named by `identifier`
    ///
    /// An exact `deviceID` match wins; otherwise the first device whose miot
    /// id, name or alias matches is returned.
    pub async fn device(&self, identifier: &str) -> Result<Device> {
        let devices = self.devices().await?;
        let identifier = identifier.trim();

        devices
            .iter()
            .find(|device| device.device_id.as_str() == identifier)
            .or_else(|| devices.iter().find(|device| device.matches(identifier)))
            .cloned()
            .ok_or_else(|| ApiError::DeviceNotFound(identifier.to_string()))
    }

    /// Resolve a device id, miot id, name or alias to a [`DeviceId`]
    pub async fn resolve(&self, identifier: &str) -> Result<DeviceId> {
        let device = self.device(identifier).await?;
        debug!(identifier, device_id = %device.device_id, "resolved device");
        Ok(device.device_id)
    }

    /// Hardware model of a resolved device
    pub async fn hardware_class_of(&self, device_id: &DeviceId) -> Result<String> {
        let devices = self.devices().await?;
        devices
            .iter()
            .find(|device| &device.device_id == device_id)
            .map(|device| device.hardware.clone())
            .ok_or_else(|| ApiError::DeviceNotFound(device_id.to_string()))
    }
}

impl std::fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("gateway", &self.gateway)
            .field("master", &self.master)
            .finish_non_exhaustive()
    }
}
