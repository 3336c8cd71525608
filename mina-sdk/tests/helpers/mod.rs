//! Hand-rolled test doubles for the dispatcher and duration seams

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use mina_api::{ApiError, Device, DeviceId, PlaybackCommand};
use mina_probe::{DurationSource, ProbeError};
use mina_sdk::Dispatcher;
use serde_json::json;
use tokio::time::Instant;

/// A command as the dispatcher received it
#[derive(Debug, Clone)]
pub struct Sent {
    pub at: Instant,
    pub device: String,
    pub command: PlaybackCommand,
}

type FailureRule = Box<dyn Fn(&str, &PlaybackCommand) -> Option<ApiError> + Send + Sync>;

/// Dispatcher double: resolves against a fixed listing and records commands
pub struct RecordingDispatcher {
    devices: Vec<Device>,
    sent: Mutex<Vec<Sent>>,
    rules: Mutex<Vec<FailureRule>>,
}

impl RecordingDispatcher {
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            devices,
            sent: Mutex::new(Vec::new()),
            rules: Mutex::new(Vec::new()),
        }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Fail matching commands with the given error
    pub fn fail_when<F>(&self, rule: F)
    where
        F: Fn(&str, &PlaybackCommand) -> Option<ApiError> + Send + Sync + 'static,
    {
        self.rules.lock().unwrap().push(Box::new(rule));
    }

    /// Reject `command` on `device` with a backend failure code
    pub fn reject(&self, device: &str, command: PlaybackCommand) {
        let device = device.to_string();
        self.fail_when(move |target, sent| {
            (target == device && *sent == command).then(|| rejection(sent))
        });
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<PlaybackCommand> {
        self.sent().into_iter().map(|s| s.command).collect()
    }

    /// Device ids in the order they were addressed, with repeats collapsed
    pub fn addressed_devices(&self) -> Vec<String> {
        let mut devices: Vec<String> = Vec::new();
        for sent in self.sent() {
            if devices.last() != Some(&sent.device) {
                devices.push(sent.device);
            }
        }
        devices
    }
}

pub fn rejection(command: &PlaybackCommand) -> ApiError {
    ApiError::CommandFailure {
        method: command.to_string(),
        code: 500,
        message: "rejected".to_string(),
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn resolve(&self, identifier: &str) -> mina_api::Result<DeviceId> {
        self.devices
            .iter()
            .find(|device| device.matches(identifier))
            .map(|device| device.device_id.clone())
            .ok_or_else(|| ApiError::DeviceNotFound(identifier.to_string()))
    }

    async fn dispatch(&self, device: &DeviceId, command: &PlaybackCommand) -> mina_api::Result<()> {
        self.sent.lock().unwrap().push(Sent {
            at: Instant::now(),
            device: device.to_string(),
            command: command.clone(),
        });

        let rules = self.rules.lock().unwrap();
        match rules.iter().find_map(|rule| rule(device.as_str(), command)) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Duration source answering from a fixed table
#[derive(Default)]
pub struct FixedDurations {
    table: HashMap<String, f64>,
    probed: Mutex<Vec<String>>,
}

impl FixedDurations {
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self {
            table: entries
                .into_iter()
                .map(|(url, seconds)| (url.to_string(), seconds))
                .collect(),
            probed: Mutex::new(Vec::new()),
        }
    }

    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl DurationSource for FixedDurations {
    async fn duration(&self, url: &str) -> mina_probe::Result<f64> {
        self.probed.lock().unwrap().push(url.to_string());
        self.table
            .get(url)
            .copied()
            .ok_or_else(|| ProbeError::DurationUnavailable(url.to_string()))
    }
}

/// A listing record the way the gateway sends it
pub fn device(id: &str, name: &str, remote_tts: bool) -> Device {
    serde_json::from_value(json!({
        "deviceID": id,
        "name": name,
        "hardware": "LX06",
        "capabilities": {"yunduantts": if remote_tts { 1 } else { 0 }},
    }))
    .unwrap()
}

pub fn seconds_between(earlier: Instant, later: Instant) -> f64 {
    later.duration_since(earlier).as_secs_f64()
}
