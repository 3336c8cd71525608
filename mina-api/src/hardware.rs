//! Hardware-to-command-scheme routing
//!
//! Speakers accept play-by-URL in one of two incompatible shapes. Which one a
//! model needs is plain data held in [`HardwareRoutes`]; the dispatcher only
//! asks it for a [`PlayScheme`].

use std::collections::BTreeSet;

/// Models known to require the structured music payload
pub const MUSIC_API_HARDWARE: &[&str] = &[
    "LX04", "LX05", "L05B", "L05C", "L06", "L06A", "X08A", "X10A", "X08C", "M01", "X08E", "X8F",
];

/// How a device expects play-by-URL to be encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayScheme {
    /// `player_play_music` with a nested item/stream descriptor
    MusicPayload,
    /// `player_play_url` with the URL as a flat field
    DirectUrl,
}

/// Lookup table from hardware model to [`PlayScheme`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareRoutes {
    music_api: BTreeSet<String>,
}

impl HardwareRoutes {
    /// A table that routes every model to [`PlayScheme::DirectUrl`]
    pub fn empty() -> Self {
        Self {
            music_api: BTreeSet::new(),
        }
    }

    /// Build a table from an explicit list of music-payload models
    pub fn from_models<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut routes = Self::empty();
        routes.extend(models);
        routes
    }

    /// Add models that must use the music payload
    pub fn extend<I, S>(&mut self, models: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.music_api.extend(
            models
                .into_iter()
                .map(|model| {
                    let model: String = model.into();
                    model.trim().to_string()
                })
                .filter(|model| !model.is_empty()),
        );
    }

    pub fn with_music_api(mut self, model: impl Into<String>) -> Self {
        let model: String = model.into();
        self.extend([model]);
        self
    }

    pub fn scheme_for(&self, hardware: &str) -> PlayScheme {
        if self.music_api.contains(hardware) {
            PlayScheme::MusicPayload
        } else {
            PlayScheme::DirectUrl
        }
    }

    pub fn music_api_models(&self) -> impl Iterator<Item = &str> {
        self.music_api.iter().map(String::as_str)
    }
}

impl Default for HardwareRoutes {
    fn default() -> Self {
        Self::from_models(MUSIC_API_HARDWARE.iter().copied())
    }
}
