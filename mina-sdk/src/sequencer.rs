//! Playback sequencer
//!
//! The speakers never report that a track finished, so chaining tracks means
//! probing each track's length and sleeping that long before sending the
//! next one. Every wait and every network call races the cancellation token.
//! When a run is cancelled or aborted by an error, the active device gets one
//! best-effort stop.
//!
//! A track whose length cannot be probed is played without pacing: the
//! sequencer logs a warning and moves straight on to the next track.

use std::future::Future;
use std::time::Duration;

use mina_api::{DeviceId, LoopMode, PlaybackCommand};
use mina_probe::DurationSource;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Result, SdkError};
use crate::playlist::{Playlist, Track};
use crate::session::ActiveDevice;
use crate::traits::Dispatcher;

/// Outcome of one playlist run
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackReport {
    pub device: DeviceId,
    /// Tracks in the order they were played, with probed durations filled in
    pub tracks: Vec<Track>,
    /// Tracks the device refused to play
    pub skipped: usize,
}

impl PlaybackReport {
    /// Seconds spent pacing, the sum of all probed durations
    pub fn paced_seconds(&self) -> f64 {
        self.tracks.iter().filter_map(|track| track.duration).sum()
    }
}

pub struct Sequencer<'a> {
    dispatcher: &'a dyn Dispatcher,
    durations: &'a dyn DurationSource,
    active: ActiveDevice,
    cancel: CancellationToken,
}

impl<'a> Sequencer<'a> {
    pub fn new(dispatcher: &'a dyn Dispatcher, durations: &'a dyn DurationSource) -> Self {
        Self {
            dispatcher,
            durations,
            active: ActiveDevice::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Stop at the next suspension point once `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Share the active-device handle with an outer interrupt path
    pub fn with_active_device(mut self, active: ActiveDevice) -> Self {
        self.active = active;
        self
    }

    pub fn active_device(&self) -> &ActiveDevice {
        &self.active
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Play every track of `playlist` on the device named by `identifier`
    ///
    /// With `shuffle`, a fresh permutation is played and `playlist` itself is
    /// left as it was. Ends with one stop command.
    pub async fn play_playlist(
        &self,
        identifier: &str,
        playlist: &Playlist,
        shuffle: bool,
    ) -> Result<PlaybackReport> {
        if playlist.is_empty() {
            return Err(SdkError::EmptyPlaylist);
        }

        let tracks = if shuffle {
            playlist.shuffled()
        } else {
            playlist.clone()
        };

        let outcome = self.run_playlist(identifier, tracks).await;
        self.finish(outcome).await
    }

    /// Play one URL on device-side single-track repeat
    ///
    /// Returns once the device accepted the command; the device keeps
    /// repeating on its own.
    pub async fn play_loop(&self, identifier: &str, url: &str) -> Result<DeviceId> {
        let outcome = self.run_loop(identifier, url).await;
        self.finish(outcome).await
    }

    async fn run_playlist(&self, identifier: &str, playlist: Playlist) -> Result<PlaybackReport> {
        let device = self.cancellable(self.dispatcher.resolve(identifier)).await??;
        self.active.set(device.clone());
        self.set_loop(&device, LoopMode::List).await?;

        let mut report = PlaybackReport {
            device: device.clone(),
            tracks: Vec::with_capacity(playlist.len()),
            skipped: 0,
        };

        let total = playlist.len();
        for (index, mut track) in playlist.into_iter().enumerate() {
            let started = Instant::now();
            info!(device = %device, track = index + 1, total, url = %track.url, "playing track");

            let command = PlaybackCommand::play_url(track.url.as_str());
            match self.cancellable(self.dispatcher.dispatch(&device, &command)).await? {
                Ok(()) => {}
                Err(e) if e.is_command_failure() => {
                    warn!(device = %device, url = %track.url, "device rejected track, skipping: {}", e);
                    report.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            match self.cancellable(self.durations.duration(&track.url)).await? {
                Ok(seconds) => match Duration::try_from_secs_f64(seconds) {
                    Ok(length) => {
                        track.duration = Some(seconds);
                        debug!(url = %track.url, seconds, "pacing track");
                        self.pace_until(started + length).await?;
                    }
                    Err(_) => warn!(url = %track.url, seconds, "unusable track duration, not waiting"),
                },
                Err(e) => warn!(url = %track.url, "duration probe failed, not waiting: {}", e),
            }

            report.tracks.push(track);
        }

        self.cancellable(self.dispatcher.dispatch(&device, &PlaybackCommand::stop()))
            .await??;
        self.active.clear();
        info!(device = %device, played = report.tracks.len(), skipped = report.skipped, "playlist finished");
        Ok(report)
    }

    async fn run_loop(&self, identifier: &str, url: &str) -> Result<DeviceId> {
        let device = self.cancellable(self.dispatcher.resolve(identifier)).await??;
        self.active.set(device.clone());
        self.set_loop(&device, LoopMode::Single).await?;

        let command = PlaybackCommand::play_url(url);
        self.cancellable(self.dispatcher.dispatch(&device, &command))
            .await??;
        self.active.clear();
        info!(device = %device, url, "looping track");
        Ok(device)
    }

    /// Loop mode is advisory; a device that refuses it still plays
    async fn set_loop(&self, device: &DeviceId, mode: LoopMode) -> Result<()> {
        let command = PlaybackCommand::SetLoop(mode);
        match self.cancellable(self.dispatcher.dispatch(device, &command)).await? {
            Ok(()) => Ok(()),
            Err(e) if e.is_command_failure() => {
                warn!(device = %device, ?mode, "could not set loop mode: {}", e);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn pace_until(&self, deadline: Instant) -> Result<()> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SdkError::Cancelled),
            _ = tokio::time::sleep_until(deadline) => Ok(()),
        }
    }

    async fn cancellable<F: Future>(&self, future: F) -> Result<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SdkError::Cancelled),
            output = future => Ok(output),
        }
    }

    /// Any failed run leaves the device stopped, whether it was cancelled
    /// or aborted by an error
    async fn finish<T>(&self, outcome: Result<T>) -> Result<T> {
        if outcome.is_err() {
            self.active.interrupt(self.dispatcher).await;
        }
        outcome
    }
}
