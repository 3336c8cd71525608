//! Tracks and playlists
//!
//! A playlist is an ordered list of remote audio URLs. It comes either from a
//! local file with one URL per line or from a remote catalog that answers
//! with a JSON list (or, failing that, plain text in the file format).

use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SdkError};

/// One remote audio resource
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub url: String,
    /// Probed length in seconds; `None` until probed or when probing failed
    pub duration: Option<f64>,
}

impl Track {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            duration: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Playlist {
    tracks: Vec<Track>,
}

impl Playlist {
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tracks: urls.into_iter().map(Track::new).collect(),
        }
    }

    /// Parse the playlist file format
    ///
    /// One URL per line, read top to bottom. Blank lines and `#` lines (so
    /// extended M3U files load too) are skipped.
    pub fn parse(text: &str) -> Self {
        Self::from_urls(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SdkError::Playlist(format!("cannot read {}: {}", path.display(), e)))?;
        let playlist = Self::parse(&text);
        debug!(path = %path.display(), tracks = playlist.len(), "loaded playlist file");
        Ok(playlist)
    }

    /// Interpret a catalog response body
    ///
    /// Accepts a JSON array of URL strings or of objects carrying a `url`
    /// member; any other body is read as the plain playlist format.
    pub fn from_catalog(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Array(items)) => Self::from_urls(items.iter().filter_map(|item| {
                let url = match item {
                    Value::String(url) => url.as_str(),
                    Value::Object(entry) => entry.get("url").and_then(Value::as_str)?,
                    _ => return None,
                };
                let url = url.trim();
                (!url.is_empty()).then(|| url.to_string())
            })),
            _ => Self::parse(body),
        }
    }

    /// Query a remote catalog for a playlist
    pub async fn fetch_catalog(http: &reqwest::Client, url: &str) -> Result<Self> {
        let response = http
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| SdkError::Playlist(format!("catalog request failed: {}", e)))?;
        let body = response
            .text()
            .await
            .map_err(|e| SdkError::Playlist(format!("catalog body unreadable: {}", e)))?;

        let playlist = Self::from_catalog(&body);
        debug!(url, tracks = playlist.len(), "loaded remote catalog");
        Ok(playlist)
    }

    /// A new playlist holding the same tracks in random order
    pub fn shuffled(&self) -> Self {
        self.shuffled_with(&mut rand::thread_rng())
    }

    pub fn shuffled_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let mut tracks = self.tracks.clone();
        tracks.shuffle(rng);
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.tracks.iter()
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.tracks.iter().map(|track| track.url.as_str())
    }
}

impl FromIterator<Track> for Playlist {
    fn from_iter<T: IntoIterator<Item = Track>>(iter: T) -> Self {
        Self {
            tracks: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Playlist {
    type Item = Track;
    type IntoIter = std::vec::IntoIter<Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.into_iter()
    }
}
