//! # Mina SDK
//!
//! Playback orchestration for Mina cloud smart speakers: playlists paced by
//! probed track durations, and text-to-speech broadcast across an account's
//! devices.
//!
//! ```rust,no_run
//! use mina_api::MinaService;
//! use mina_probe::DurationProbe;
//! use mina_sdk::{Playlist, Sequencer};
//!
//! # async fn run(service: MinaService) -> Result<(), mina_sdk::SdkError> {
//! let probe = DurationProbe::new();
//! let playlist = Playlist::from_file("songs.txt").await?;
//! let report = Sequencer::new(&service, &probe)
//!     .play_playlist("Living Room", &playlist, true)
//!     .await?;
//! println!("played {} tracks", report.tracks.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! mina-sdk (sequencer, broadcast)
//!     ↓
//! mina-api (registry, dispatcher)     mina-probe (durations)
//!     ↓
//! gateway-client (account, envelope)
//! ```

pub mod broadcast;
pub mod error;
pub mod logging;
pub mod playlist;
pub mod sequencer;
pub mod session;
pub mod traits;

pub use broadcast::{broadcast, BroadcastTarget};
pub use error::{Result, SdkError};
pub use playlist::{Playlist, Track};
pub use sequencer::{PlaybackReport, Sequencer};
pub use session::ActiveDevice;
pub use traits::Dispatcher;
