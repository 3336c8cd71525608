//! Duration probing for remote audio resources
//!
//! The speakers report no playback progress, so a player that wants to chain
//! tracks has to know each track's length up front. This crate reads it from
//! the first few hundred bytes of the resource: one HTTP range fetch of
//! `bytes=0-500`, and a second of `bytes=0-1000` when the header did not fit.
//!
//! # Quick Start
//!
//! ```no_run
//! # async fn run() -> Result<(), mina_probe::ProbeError> {
//! let seconds = mina_probe::probe_duration("http://example.com/track.mp3").await?;
//! println!("{:.1}s", seconds);
//! # Ok(())
//! # }
//! ```
//!
//! Container headers are parsed with symphonia. Plain constant-bitrate MPEG
//! streams without a frame count fall back to an estimate from the resource
//! length.

mod error;
mod header;
mod probe;

pub use error::{ProbeError, Result};
pub use probe::{DurationProbe, DurationSource, FALLBACK_PROBE_BYTES, FIRST_PROBE_BYTES};

/// Probe one URL with a fresh HTTP client.
///
/// For repeated probes build a [`DurationProbe`] and reuse it.
pub async fn probe_duration(url: &str) -> Result<f64> {
    DurationProbe::new().probe(url).await
}
