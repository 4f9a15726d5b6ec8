//! Native media collaborator boundary
//!
//! The facade drives an opaque platform player through these traits. A real
//! backend wraps the OS media framework; [`crate::headless`] provides one
//! without a decoder. Callbacks may be invoked from any thread.

use crate::subscription::Subscription;
use crate::types::{AccessLogEntry, InterruptionPhase, ItemStatus, SeekTolerance};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub type StatusCallback = Box<dyn Fn(ItemStatus) + Send + Sync>;
pub type AccessLogCallback = Box<dyn Fn(Vec<AccessLogEntry>) + Send + Sync>;
pub type TimeCallback = Box<dyn Fn(Duration) + Send + Sync>;
pub type InterruptionCallback = Box<dyn Fn(InterruptionPhase) + Send + Sync>;

/// Outcome of resolving an asset's "playable" property
pub enum AssetStatus {
    Loaded(Arc<dyn MediaAsset>),
    Failed(String),
    Cancelled,
    Unknown,
}

impl std::fmt::Debug for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetStatus::Loaded(asset) => write!(f, "Loaded({})", asset.url()),
            AssetStatus::Failed(reason) => write!(f, "Failed({})", reason),
            AssetStatus::Cancelled => write!(f, "Cancelled"),
            AssetStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Factory side of the platform media framework
#[async_trait]
pub trait MediaPlatform: Send + Sync {
    /// Resolve the resource's playable property
    async fn load_asset(&self, url: &Url) -> AssetStatus;

    /// Bind a resolved asset into an observable item
    fn make_item(&self, asset: Arc<dyn MediaAsset>) -> Arc<dyn PlayerItem>;

    /// Create a player for the item; the item starts preparing once attached
    fn make_player(&self, item: Arc<dyn PlayerItem>) -> Arc<dyn NativePlayer>;

    /// Register for process-wide audio interruptions
    fn observe_interruptions(&self, callback: InterruptionCallback) -> Subscription;
}

/// A remote media resource whose playable property has been resolved
pub trait MediaAsset: Send + Sync {
    fn url(&self) -> &Url;

    /// Lets a platform recover its own asset type in `make_item`
    fn as_any(&self) -> &dyn Any;
}

/// One playback attempt of an asset
pub trait PlayerItem: Send + Sync {
    fn status(&self) -> ItemStatus;

    /// Total duration; `None` while unknown or for live content
    fn duration(&self) -> Option<Duration>;

    fn preferred_peak_bit_rate(&self) -> f64;

    /// Advisory cap for the adaptive algorithm (0 = no cap)
    fn set_preferred_peak_bit_rate(&self, bits_per_second: f64);

    fn observe_status(&self, callback: StatusCallback) -> Subscription;

    /// Called with the whole access log each time an entry is appended
    fn observe_access_log(&self, callback: AccessLogCallback) -> Subscription;
}

/// Transport controls of the platform player
pub trait NativePlayer: Send + Sync {
    fn play(&self);
    fn pause(&self);
    fn rate(&self) -> f32;
    fn current_time(&self) -> Option<Duration>;
    fn seek(&self, to: Duration, tolerance: SeekTolerance);
    fn is_muted(&self) -> bool;
    fn set_muted(&self, muted: bool);
    fn add_periodic_time_observer(&self, interval: Duration, callback: TimeCallback) -> Subscription;
}
