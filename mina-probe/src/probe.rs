//! Range-fetch duration probe

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_RANGE, RANGE};
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, trace};

use crate::error::{ProbeError, Result};
use crate::header::duration_from_header;

/// Last byte of the first probe window
pub const FIRST_PROBE_BYTES: u64 = 500;

/// Last byte of the retry window, for files with large metadata blocks
pub const FALLBACK_PROBE_BYTES: u64 = 1000;

/// Extensions that mark a URL as a direct audio-file link
const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "m4a", "aac", "flac", "wav", "ogg", "oga", "opus", "ape", "wma", "amr", "mp4",
];

/// Anything that can report how long a remote track plays
#[async_trait]
pub trait DurationSource: Send + Sync {
    async fn duration(&self, url: &str) -> Result<f64>;
}

/// Probes remote audio by fetching a small byte range and reading the header
#[derive(Debug, Clone, Default)]
pub struct DurationProbe {
    http: Client,
}

#[derive(Default)]
struct Window {
    bytes: Vec<u8>,
    total_len: Option<u64>,
}

impl DurationProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe with an existing HTTP session
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    /// Canonical location of the resource
    ///
    /// Direct audio links are returned as-is. Anything else is fetched once
    /// (following redirects, without credentials) and the final URL is used.
    pub async fn resolve(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url).map_err(|e| ProbeError::Unsupported(format!("{}: {}", url, e)))?;
        if audio_extension(&parsed).is_some() {
            return Ok(url.to_string());
        }

        let response = self.http.get(parsed).send().await?;
        let resolved = response.url().to_string();
        debug!(url, %resolved, "resolved resource location");
        Ok(resolved)
    }

    /// Probe `url` for its duration in seconds
    ///
    /// Makes at most two range fetches. Unreadable data or an HTTP error status
    /// in both windows ends in [`ProbeError::DurationUnavailable`]; transport
    /// failures end the probe immediately with [`ProbeError::Network`].
    pub async fn probe(&self, url: &str) -> Result<f64> {
        let resolved = self.resolve(url).await?;
        let extension = Url::parse(&resolved)
            .ok()
            .and_then(|parsed| audio_extension(&parsed));

        for last_byte in [FIRST_PROBE_BYTES, FALLBACK_PROBE_BYTES] {
            let window = self.fetch_window(&resolved, last_byte).await?;
            match duration_from_header(&window.bytes, window.total_len, extension.as_deref()) {
                Some(seconds) => {
                    debug!(url = %resolved, last_byte, seconds, "probed duration");
                    return Ok(seconds);
                }
                None => debug!(url = %resolved, last_byte, fetched = window.bytes.len(), "no audio header in window"),
            }
        }

        Err(ProbeError::DurationUnavailable(url.to_string()))
    }

    async fn fetch_window(&self, url: &str, last_byte: u64) -> Result<Window> {
        let mut response = self
            .http
            .get(url)
            .header(RANGE, format!("bytes=0-{}", last_byte))
            .send()
            .await?;

        let status = response.status();
        // an error page is as unreadable as a non-audio body
        if !status.is_success() {
            debug!(url, %status, "probe window refused");
            return Ok(Window::default());
        }

        let total_len = if status == StatusCode::PARTIAL_CONTENT {
            content_range_total(response.headers())
        } else {
            response.content_length()
        };

        // Servers that ignore Range send the whole body; stop reading once the
        // window is full.
        let limit = (last_byte + 1) as usize;
        let mut bytes = Vec::with_capacity(limit);
        while bytes.len() < limit {
            match response.chunk().await? {
                Some(chunk) => bytes.extend_from_slice(&chunk),
                None => break,
            }
        }
        bytes.truncate(limit);

        trace!(url, %status, fetched = bytes.len(), ?total_len, "fetched probe window");
        Ok(Window { bytes, total_len })
    }
}

#[async_trait]
impl DurationSource for DurationProbe {
    async fn duration(&self, url: &str) -> Result<f64> {
        self.probe(url).await
    }
}

/// Lowercased audio extension of the URL's last path segment
fn audio_extension(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.last()?;
    let (_, extension) = segment.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();
    AUDIO_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

/// Total length from `Content-Range: bytes 0-500/12345`
fn content_range_total(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_RANGE)?
        .to_str()
        .ok()?
        .rsplit_once('/')?
        .1
        .trim()
        .parse()
        .ok()
}
