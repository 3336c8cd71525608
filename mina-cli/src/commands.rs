//! Command execution against one authenticated session

use std::future::Future;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use gateway_client::{GatewayClient, TokenFileAccount};
use mina_api::{HardwareRoutes, MinaService, TrackType, UbusResponse};
use mina_probe::DurationProbe;
use mina_sdk::{broadcast, BroadcastTarget, ActiveDevice, PlaybackReport, Playlist, SdkError, Sequencer};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{Command, Config};

/// Everything one invocation shares: the HTTP session, the dispatcher and
/// the interrupt state
pub struct Session {
    http: reqwest::Client,
    service: MinaService,
    probe: DurationProbe,
    active: ActiveDevice,
    cancel: CancellationToken,
}

impl Session {
    pub fn open(config: &Config, cancel: CancellationToken) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("failed to create HTTP client")?;

        let token_path = config
            .token_path
            .clone()
            .ok_or_else(|| anyhow!("MI_TOKEN is not set"))?;
        let account = TokenFileAccount::new(http.clone(), &config.credentials, token_path)?;

        let mut routes = HardwareRoutes::default();
        routes.extend(config.music_api_hardware.iter().map(|model| model.trim()).filter(|m| !m.is_empty()));
        let service = MinaService::with_routes(GatewayClient::new(Arc::new(account)), routes);

        Ok(Self::new(http, service, cancel))
    }

    fn new(http: reqwest::Client, service: MinaService, cancel: CancellationToken) -> Self {
        Self {
            probe: DurationProbe::with_client(http.clone()),
            http,
            service,
            active: ActiveDevice::new(),
            cancel,
        }
    }

    /// Run the configured command and render its single line of output
    pub async fn execute(&self, config: &Config) -> Result<String> {
        match &config.command {
            Command::Mina { text } if text.is_empty() => {
                let devices = self.interruptible(self.service.device_list()).await?;
                Ok(serde_json::to_string_pretty(&*devices)?)
            }
            Command::Mina { text } => {
                self.broadcast(&text.join(" "), BroadcastTarget::All, None)
                    .await
            }
            Command::Say { text, target, volume } => {
                let target: BroadcastTarget = target.parse()?;
                self.broadcast(&text.join(" "), target, *volume).await
            }
            Command::Volume { level } => {
                let device = self.resolve(config).await?;
                render(self.interruptible(self.service.player_set_volume(&device, *level)).await?)
            }
            Command::Status => {
                let device = self.resolve(config).await?;
                let status = self.interruptible(self.service.player_get_status(&device)).await?;
                Ok(serde_json::to_string_pretty(&status)?)
            }
            Command::Ask => {
                let device = self.resolve(config).await?;
                let messages = self.interruptible(self.service.get_latest_ask(&device)).await?;
                Ok(serde_json::to_string_pretty(&messages)?)
            }
            Command::Play { url: Some(url) } => {
                let device = self.resolve(config).await?;
                self.active.set(device.clone());
                let response = self
                    .interruptible(self.service.play_by_url(&device, url, TrackType::Normal))
                    .await;
                self.active.clear();
                render(response?)
            }
            Command::Play { url: None } => {
                let device = self.resolve(config).await?;
                render(self.interruptible(self.service.player_play(&device)).await?)
            }
            Command::Pause => {
                let device = self.resolve(config).await?;
                render(self.interruptible(self.service.player_pause(&device)).await?)
            }
            Command::Stop => {
                let device = self.resolve(config).await?;
                render(self.interruptible(self.service.player_stop(&device)).await?)
            }
            Command::Loop { url } => {
                let device = config.device()?;
                // the sequencer watches the token itself and awaits its own stop
                let device = self.sequencer().play_loop(device, url).await?;
                Ok(format!("Looping {} on {}", url, device))
            }
            Command::PlayList { file, shuffle } => {
                let playlist = Playlist::from_file(file).await?;
                self.play_playlist(config, playlist, *shuffle).await
            }
            Command::PlayRemote { url, shuffle } => {
                let playlist = self
                    .interruptible(Playlist::fetch_catalog(&self.http, url))
                    .await?;
                self.play_playlist(config, playlist, *shuffle).await
            }
        }
    }

    fn sequencer(&self) -> Sequencer<'_> {
        Sequencer::new(&self.service, &self.probe)
            .with_cancellation(self.cancel.clone())
            .with_active_device(self.active.clone())
    }

    async fn resolve(&self, config: &Config) -> Result<mina_api::DeviceId> {
        let identifier = config.device()?;
        self.interruptible(self.service.registry().resolve(identifier)).await
    }

    async fn broadcast(&self, message: &str, target: BroadcastTarget, volume: Option<u8>) -> Result<String> {
        let devices = self.interruptible(self.service.device_list()).await?;
        let delivered = self
            .interruptible(broadcast(&self.service, &devices, target, Some(message), volume))
            .await?;
        if !delivered {
            return Err(anyhow!("broadcast to {} was not delivered", target));
        }
        Ok(json!(delivered).to_string())
    }

    async fn play_playlist(&self, config: &Config, playlist: Playlist, shuffle: bool) -> Result<String> {
        let device = config.device()?;
        info!(device, tracks = playlist.len(), shuffle, "starting playlist");
        let report = self
            .sequencer()
            .play_playlist(device, &playlist, shuffle)
            .await?;
        Ok(serde_json::to_string_pretty(&report_json(&report))?)
    }

    /// Race a one-shot `operation` against the interrupt signal
    ///
    /// On interrupt the operation is dropped and the active device, if any,
    /// gets one stop command. Sequencer runs must not go through here: dropping
    /// them would also drop a stop they already started.
    async fn interruptible<T, E>(&self, operation: impl Future<Output = std::result::Result<T, E>>) -> Result<T>
    where
        E: Into<anyhow::Error>,
    {
        tokio::select! {
            result = operation => result.map_err(Into::into),
            _ = self.cancel.cancelled() => {
                self.active.interrupt(&self.service).await;
                Err(SdkError::Cancelled.into())
            }
        }
    }
}

fn render(response: UbusResponse) -> Result<String> {
    let body = match response.data {
        Value::Null => json!({"code": response.code, "message": response.message}),
        data => data,
    };
    Ok(serde_json::to_string_pretty(&body)?)
}

fn report_json(report: &PlaybackReport) -> Value {
    json!({
        "device": report.device,
        "tracks": report
            .tracks
            .iter()
            .map(|track| json!({"url": track.url, "duration": track.duration}))
            .collect::<Vec<_>>(),
        "skipped": report.skipped,
        "paced_seconds": report.paced_seconds(),
    })
}
