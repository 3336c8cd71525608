//! Typed API for Mina cloud smart speakers
//!
//! This crate sits on top of the private `gateway-client` crate and provides
//! the device registry and the command dispatcher. Every device command is a
//! bus call routed through the gateway's `/remote/ubus` endpoint.
//!
//! ```rust,ignore
//! use mina_api::{MinaService, PlaybackCommand};
//!
//! let service = MinaService::from_account(account);
//! let device = service.registry().resolve("Living Room").await?;
//! service.dispatch(&device, &PlaybackCommand::SetVolume(30)).await?;
//! ```

pub mod client;
pub mod command;
pub mod device;
pub mod error;
pub mod hardware;
pub mod operation;
pub mod operations;
pub mod registry;
pub mod service;

pub use client::{MinaService, MAX_VOLUME};
pub use command::{LoopMode, PlaybackCommand, TrackType, TransportOp};
pub use device::{Device, DeviceId, REMOTE_TTS_CAPABILITY};
pub use error::{ApiError, Result};
pub use hardware::{HardwareRoutes, PlayScheme, MUSIC_API_HARDWARE};
pub use operation::{UbusOperation, UbusResponse};
pub use operations::{ConversationMessage, PlayerStatus};
pub use registry::DeviceRegistry;
pub use service::Service;
