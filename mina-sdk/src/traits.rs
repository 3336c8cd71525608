//! Seams between orchestration and the device backend

use async_trait::async_trait;
use mina_api::{DeviceId, MinaService, PlaybackCommand};

/// Resolves devices and sends them commands
///
/// [`MinaService`] is the production implementation; orchestration code only
/// talks to this trait.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn resolve(&self, identifier: &str) -> mina_api::Result<DeviceId>;

    async fn dispatch(&self, device: &DeviceId, command: &PlaybackCommand) -> mina_api::Result<()>;
}

#[async_trait]
impl Dispatcher for MinaService {
    async fn resolve(&self, identifier: &str) -> mina_api::Result<DeviceId> {
        self.registry().resolve(identifier).await
    }

    async fn dispatch(&self, device: &DeviceId, command: &PlaybackCommand) -> mina_api::Result<()> {
        MinaService::dispatch(self, device, command).await.map(|_| ())
    }
}
