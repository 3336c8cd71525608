//! Broadcast fan-out of text-to-speech and volume to several devices

use std::fmt;
use std::str::FromStr;

use mina_api::{Device, DeviceId, PlaybackCommand};
use tracing::{debug, error};

use crate::error::{Result, SdkError};
use crate::traits::Dispatcher;

/// Which devices of a listing a broadcast addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BroadcastTarget {
    #[default]
    All,
    /// 1-based position in the listing
    Index(usize),
}

impl BroadcastTarget {
    /// Check an indexed target against the listing length
    pub fn validate(&self, device_count: usize) -> Result<()> {
        match *self {
            BroadcastTarget::Index(n) if n == 0 || n > device_count => Err(SdkError::InvalidTarget(
                format!("device {} requested, listing has {}", n, device_count),
            )),
            _ => Ok(()),
        }
    }

    fn selects(&self, position: usize) -> bool {
        match *self {
            BroadcastTarget::All => true,
            BroadcastTarget::Index(n) => n == position,
        }
    }
}

impl FromStr for BroadcastTarget {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(BroadcastTarget::All);
        }
        match s.parse::<usize>() {
            Ok(n) if n > 0 => Ok(BroadcastTarget::Index(n)),
            _ => Err(SdkError::InvalidTarget(format!(
                "'{}' is neither 'all' nor a 1-based device number",
                s
            ))),
        }
    }
}

impl fmt::Display for BroadcastTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BroadcastTarget::All => f.write_str("all"),
            BroadcastTarget::Index(n) => write!(f, "{}", n),
        }
    }
}

/// Send an optional volume and an optional message to the targeted devices
///
/// Devices are visited in listing order. A device is addressed when the
/// target selects its position or when it advertises remote TTS. Each
/// addressed device gets the volume first and the message only if that
/// succeeded. Iteration ends after the indexed target device, or at the first
/// device a command failed on. Returns whether the last addressed device
/// succeeded (`false` when none was addressed).
///
/// Rejected commands end the broadcast with `Ok(false)`; transport and
/// authentication errors are returned as errors.
pub async fn broadcast(
    dispatcher: &dyn Dispatcher,
    devices: &[Device],
    target: BroadcastTarget,
    message: Option<&str>,
    volume: Option<u8>,
) -> Result<bool> {
    target.validate(devices.len())?;

    let mut success = false;
    for (index, device) in devices.iter().enumerate() {
        let position = index + 1;
        let targeted = target.selects(position);
        if !targeted && !device.supports_remote_tts() {
            continue;
        }

        debug!(%target, position, device = %device.device_id, ?message, ?volume, "broadcast send");
        success = send_to(dispatcher, &device.device_id, message, volume).await?;
        if !success {
            error!(%target, position, device = %device.device_id, "broadcast send failed");
            break;
        }
        if targeted && target != BroadcastTarget::All {
            break;
        }
    }

    Ok(success)
}

async fn send_to(
    dispatcher: &dyn Dispatcher,
    device: &DeviceId,
    message: Option<&str>,
    volume: Option<u8>,
) -> Result<bool> {
    if let Some(level) = volume {
        if !deliver(dispatcher, device, PlaybackCommand::SetVolume(level)).await? {
            return Ok(false);
        }
    }
    match message {
        Some(text) => deliver(dispatcher, device, PlaybackCommand::TextToSpeech(text.to_string())).await,
        None => Ok(true),
    }
}

async fn deliver(dispatcher: &dyn Dispatcher, device: &DeviceId, command: PlaybackCommand) -> Result<bool> {
    match dispatcher.dispatch(device, &command).await {
        Ok(()) => Ok(true),
        Err(e) if e.is_command_failure() => {
            error!(device = %device, %command, "command rejected: {}", e);
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}
