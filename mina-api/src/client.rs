use std::sync::Arc;

use gateway_client::{Account, GatewayClient};
use serde_json::{Map, Value};
use tracing::debug;

use crate::command::{LoopMode, PlaybackCommand, TrackType, TransportOp};
use crate::device::{Device, DeviceId};
use crate::error::{ApiError, Result};
use crate::hardware::{HardwareRoutes, PlayScheme};
use crate::operation::{UbusOperation, UbusResponse};
use crate::operations::media_player::{
    GetPlayStatusOperation, PlayMusicOperation, PlayMusicRequest, PlayUrlOperation,
    PlayUrlOperationRequest, PlayerStatus, RawPlayStatusOperationRequest, SetLoopOperation,
    SetLoopOperationRequest, SetVolumeOperation, SetVolumeOperationRequest, TransportOperation,
    TransportOperationRequest,
};
use crate::operations::mi_brain::{
    ConversationMessage, NlpResultGetOperation, RawNlpResultOperationRequest,
    TextToSpeechOperation, TextToSpeechOperationRequest,
};
use crate::registry::DeviceRegistry;
use crate::service::Service;

const UBUS_URI: &str = "/remote/ubus";

/// Highest volume the media player accepts
pub const MAX_VOLUME: u8 = 100;

/// Command dispatcher for speakers behind the cloud gateway
///
/// All commands funnel through [`MinaService::ubus_request`]. Play-by-URL is
/// routed through the [`HardwareRoutes`] table using the device's hardware
/// class from the registry.
///
/// # Example
/// ```rust,ignore
/// let service = MinaService::new(GatewayClient::new(account));
/// let device = service.registry().resolve("Kitchen").await?;
/// service.play_by_url(&device, "http://example.com/a.mp3", TrackType::Normal).await?;
/// ```
#[derive(Clone)]
pub struct MinaService {
    gateway: GatewayClient,
    registry: Arc<DeviceRegistry>,
    routes: Arc<HardwareRoutes>,
}

impl MinaService {
    /// Create a dispatcher with the built-in hardware routing table
    pub fn new(gateway: GatewayClient) -> Self {
        Self::with_routes(gateway, HardwareRoutes::default())
    }

    /// Create a dispatcher with a custom hardware routing table
    pub fn with_routes(gateway: GatewayClient, routes: HardwareRoutes) -> Self {
        Self {
            registry: Arc::new(DeviceRegistry::new(gateway.clone())),
            gateway,
            routes: Arc::new(routes),
        }
    }

    /// Convenience constructor straight from an account
    pub fn from_account(account: Arc<dyn Account>) -> Self {
        Self::new(GatewayClient::new(account))
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn routes(&self) -> &HardwareRoutes {
        &self.routes
    }

    /// The account's devices in listing order (cached)
    pub async fn device_list(&self) -> Result<Arc<Vec<Device>>> {
        self.registry.devices().await
    }

    /// Execute a typed bus operation against a device
    pub async fn execute<Op: UbusOperation>(
        &self,
        device_id: &DeviceId,
        request: &Op::Request,
    ) -> Result<Op::Response> {
        let metadata = Op::metadata();
        debug!(service = metadata.service, method = metadata.method, "executing operation");

        let message = Op::build_message(request)?;
        let response = self
            .ubus_request(device_id, Op::METHOD, Op::SERVICE, message)
            .await?;
        Op::parse_response(response)
    }

    /// Send one raw bus call
    ///
    /// The message is JSON-encoded into the `message` field. A non-success
    /// answer comes back as [`ApiError::CommandFailure`].
    pub async fn ubus_request(
        &self,
        device_id: &DeviceId,
        method: &str,
        service: Service,
        message: Value,
    ) -> Result<UbusResponse> {
        let mut fields = Map::new();
        fields.insert("deviceId".to_string(), Value::from(device_id.as_str()));
        fields.insert("message".to_string(), Value::from(serde_json::to_string(&message)?));
        fields.insert("method".to_string(), Value::from(method));
        fields.insert("path".to_string(), Value::from(service.path()));

        debug!(device_id = %device_id, method, path = service.path(), %message, "ubus request");
        let envelope = self
            .gateway
            .post(UBUS_URI, fields)
            .await
            .map_err(|e| ApiError::command(method, e))?;

        UbusResponse::from_envelope(method, envelope)
    }

    /// Send any [`PlaybackCommand`]
    pub async fn dispatch(&self, device_id: &DeviceId, command: &PlaybackCommand) -> Result<UbusResponse> {
        match command {
            PlaybackCommand::TextToSpeech(text) => self.text_to_speech(device_id, text).await,
            PlaybackCommand::SetVolume(level) => self.player_set_volume(device_id, *level).await,
            PlaybackCommand::Transport(op) => self.player_operation(device_id, *op).await,
            PlaybackCommand::SetLoop(mode) => self.player_set_loop(device_id, *mode).await,
            PlaybackCommand::PlayUrl { url, track_type } => {
                self.play_by_url(device_id, url, *track_type).await
            }
        }
    }

    pub async fn text_to_speech(&self, device_id: &DeviceId, text: &str) -> Result<UbusResponse> {
        let request = TextToSpeechOperationRequest::new(text.to_string());
        self.execute::<TextToSpeechOperation>(device_id, &request).await
    }

    pub async fn player_set_volume(&self, device_id: &DeviceId, volume: u8) -> Result<UbusResponse> {
        if volume > MAX_VOLUME {
            return Err(ApiError::InvalidParameter(format!(
                "volume {} is out of range [0, {}]",
                volume, MAX_VOLUME
            )));
        }
        let request = SetVolumeOperationRequest::new(volume);
        self.execute::<SetVolumeOperation>(device_id, &request).await
    }

    pub async fn player_operation(&self, device_id: &DeviceId, op: TransportOp) -> Result<UbusResponse> {
        let request = TransportOperationRequest::new(op.as_str().to_string());
        self.execute::<TransportOperation>(device_id, &request).await
    }

    pub async fn player_play(&self, device_id: &DeviceId) -> Result<UbusResponse> {
        self.player_operation(device_id, TransportOp::Play).await
    }

    pub async fn player_pause(&self, device_id: &DeviceId) -> Result<UbusResponse> {
        self.player_operation(device_id, TransportOp::Pause).await
    }

    pub async fn player_stop(&self, device_id: &DeviceId) -> Result<UbusResponse> {
        self.player_operation(device_id, TransportOp::Stop).await
    }

    /// Set device-side repeat; this does not loop anything by itself
    pub async fn player_set_loop(&self, device_id: &DeviceId, mode: LoopMode) -> Result<UbusResponse> {
        let request = SetLoopOperationRequest::new(mode.code());
        self.execute::<SetLoopOperation>(device_id, &request).await
    }

    pub async fn player_get_status(&self, device_id: &DeviceId) -> Result<PlayerStatus> {
        self.execute::<GetPlayStatusOperation>(device_id, &RawPlayStatusOperationRequest::new())
            .await
    }

    /// Recent voice interactions, empty when the device reports none
    pub async fn get_latest_ask(&self, device_id: &DeviceId) -> Result<Vec<ConversationMessage>> {
        match self
            .execute::<NlpResultGetOperation>(device_id, &RawNlpResultOperationRequest::new())
            .await
        {
            Err(ApiError::CommandFailure { .. }) => Ok(Vec::new()),
            other => other,
        }
    }

    /// Play a URL using whichever scheme the device's hardware requires
    pub async fn play_by_url(
        &self,
        device_id: &DeviceId,
        url: &str,
        track_type: TrackType,
    ) -> Result<UbusResponse> {
        let hardware = self.registry.hardware_class_of(device_id).await?;
        let scheme = self.routes.scheme_for(&hardware);
        debug!(device_id = %device_id, %hardware, ?scheme, url, "play by url");

        match scheme {
            PlayScheme::MusicPayload => self.play_by_music_url(device_id, url, track_type).await,
            PlayScheme::DirectUrl => {
                let request = PlayUrlOperationRequest::new(url.to_string(), track_type.code());
                self.execute::<PlayUrlOperation>(device_id, &request).await
            }
        }
    }

    /// Play a URL through the structured music payload
    pub async fn play_by_music_url(
        &self,
        device_id: &DeviceId,
        url: &str,
        track_type: TrackType,
    ) -> Result<UbusResponse> {
        let request = PlayMusicRequest::new(url, track_type.code());
        self.execute::<PlayMusicOperation>(device_id, &request).await
    }
}

impl std::fmt::Debug for MinaService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MinaService")
            .field("gateway", &self.gateway)
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}
