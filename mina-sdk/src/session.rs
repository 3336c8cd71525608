//! Interrupt state for the device a command is currently driving
//!
//! The command that owns playback records its device here; the interrupt
//! path only reads it, through [`ActiveDevice::interrupt`].

use std::sync::{Arc, Mutex};

use mina_api::{DeviceId, PlaybackCommand};
use tracing::{info, warn};

use crate::traits::Dispatcher;

/// Shared handle to the last-known active device
#[derive(Debug, Clone, Default)]
pub struct ActiveDevice {
    inner: Arc<Mutex<Option<DeviceId>>>,
}

impl ActiveDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, device: DeviceId) {
        *self.lock() = Some(device);
    }

    pub fn get(&self) -> Option<DeviceId> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().take();
    }

    fn take(&self) -> Option<DeviceId> {
        self.lock().take()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<DeviceId>> {
        // the guarded value is a plain Option, so a poisoned lock is still usable
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Best-effort stop of the active device
    ///
    /// The device is taken out of the handle first, so however many paths
    /// observe the same interrupt, at most one stop is sent. Returns whether a
    /// stop was attempted.
    pub async fn interrupt(&self, dispatcher: &dyn Dispatcher) -> bool {
        let Some(device) = self.take() else {
            return false;
        };

        info!(device = %device, "interrupted, stopping playback");
        if let Err(e) = dispatcher.dispatch(&device, &PlaybackCommand::stop()).await {
            warn!(device = %device, "stop after interrupt failed: {}", e);
        }
        true
    }
}
