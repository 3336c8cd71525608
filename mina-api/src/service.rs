/// Subsystems reachable over the gateway bus
///
/// Every bus call is addressed to one of these paths on the target device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Media player - playback, volume, loop mode, play-by-URL
    MediaPlayer,

    /// Voice brain - text to speech and conversation history
    MiBrain,
}

impl Service {
    /// Get the name of this service as a string
    pub fn name(&self) -> &'static str {
        match self {
            Service::MediaPlayer => "MediaPlayer",
            Service::MiBrain => "MiBrain",
        }
    }

    /// The bus path this service is addressed by
    pub fn path(&self) -> &'static str {
        match self {
            Service::MediaPlayer => "mediaplayer",
            Service::MiBrain => "mibrain",
        }
    }
}
