//! Typed playback commands

use std::fmt;

/// Transport control actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportOp {
    Play,
    Pause,
    Stop,
}

impl TransportOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportOp::Play => "play",
            TransportOp::Pause => "pause",
            TransportOp::Stop => "stop",
        }
    }
}

/// Device-side repeat behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Repeat the current track
    Single,
    /// Repeat the whole list
    List,
}

impl LoopMode {
    /// Wire value of the `type` field
    pub fn code(&self) -> u8 {
        match self {
            LoopMode::Single => 0,
            LoopMode::List => 1,
        }
    }
}

/// How a track is announced on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackType {
    #[default]
    Normal,
    /// Lights the indicator on models that use the music payload
    Highlighted,
}

impl TrackType {
    /// Wire value of the `type` field
    pub fn code(&self) -> u8 {
        match self {
            TrackType::Normal => 2,
            TrackType::Highlighted => 1,
        }
    }
}

/// One command the dispatcher can send to a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackCommand {
    TextToSpeech(String),
    SetVolume(u8),
    Transport(TransportOp),
    SetLoop(LoopMode),
    PlayUrl { url: String, track_type: TrackType },
}

impl PlaybackCommand {
    pub fn play_url(url: impl Into<String>) -> Self {
        PlaybackCommand::PlayUrl {
            url: url.into(),
            track_type: TrackType::Normal,
        }
    }

    pub fn stop() -> Self {
        PlaybackCommand::Transport(TransportOp::Stop)
    }
}

impl fmt::Display for PlaybackCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackCommand::TextToSpeech(text) => write!(f, "TextToSpeech({})", text),
            PlaybackCommand::SetVolume(level) => write!(f, "SetVolume({})", level),
            PlaybackCommand::Transport(op) => write!(f, "Transport({})", op.as_str()),
            PlaybackCommand::SetLoop(mode) => write!(f, "SetLoop({:?})", mode),
            PlaybackCommand::PlayUrl { url, track_type } => {
                write!(f, "PlayUrl({}, {:?})", url, track_type)
            }
        }
    }
}
