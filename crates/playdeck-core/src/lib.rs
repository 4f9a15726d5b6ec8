//! Playdeck Core - Player-control facade for Playdeck
//!
//! This crate wraps an opaque platform media player and provides:
//! - Load/play/pause/seek/mute/bitrate-cap operations
//! - One playback session at a time, with every observer scoped to it
//! - Readiness, progress, bitrate and interruption events as one stream
//! - An explicit startup step for the host audio session
//! - A headless HLS backend (feature `headless`)
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        Playdeck Core                          │
//! ├───────────────────────────────────────────────────────────────┤
//! │                                                               │
//! │   PlayerFacade ──commands──┐                                  │
//! │                            ▼                                  │
//! │                    ┌───────────────┐      ┌──────────────┐    │
//! │  native callbacks ─▶ Facade worker ├──────▶ EventStream  │    │
//! │  (any thread)      │  (one queue)  │      └──────────────┘    │
//! │                    └───────┬───────┘                          │
//! │                            │ owns                             │
//! │                    ┌───────┴───────┐                          │
//! │                    │PlaybackSession│── Subscriptions          │
//! │                    └───────┬───────┘                          │
//! │                            │                                  │
//! │             MediaPlatform / PlayerItem / NativePlayer         │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use playdeck_core::{headless::HeadlessPlatform, PlaybackEvent, PlayerConfig, PlayerFacade};
//! use std::sync::Arc;
//!
//! # async fn run() -> playdeck_core::Result<()> {
//! let platform = Arc::new(HeadlessPlatform::new()?);
//! let (facade, mut events) = PlayerFacade::spawn(platform, PlayerConfig::default())?;
//! facade.load("https://example.com/video.m3u8")?;
//!
//! while let Some(event) = events.next().await {
//!     if let PlaybackEvent::ProgressTick { current, total } = event {
//!         println!("{:?} / {:?}", current, total);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod event;
pub mod facade;
pub mod native;
pub mod session;
pub mod subscription;
pub mod types;

#[cfg(feature = "headless")]
pub mod headless;

pub use audio::{configure_audio_session, AudioCategory, AudioMode, AudioSession, AudioSessionConfig};
pub use config::PlayerConfig;
pub use error::{Error, PlaybackFailure, Result};
pub use event::{EventStream, PlaybackEvent, PlayerDelegate};
pub use facade::{PlayerFacade, PlayerSnapshot};
pub use native::{AssetStatus, MediaAsset, MediaPlatform, NativePlayer, PlayerItem};
pub use session::PlaybackSession;
pub use subscription::Subscription;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log library startup
pub fn init() {
    tracing::info!(version = VERSION, "Playdeck Core initialized");
}
