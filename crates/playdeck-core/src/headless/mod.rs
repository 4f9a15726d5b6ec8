//! Headless media platform
//!
//! A native backend without a decoder. Assets resolve by fetching and parsing
//! the HLS playlist; items become ready once their media playlist yields a
//! duration; players advance a virtual clock. Useful for CLIs, CI and any host
//! that wants the facade's behavior without a media framework.

mod manifest;
mod player;

pub use manifest::{
    fetch_media_timeline, parse_presentation, select_variant, HlsManifest, MediaTimeline, Presentation, Variant,
};
pub use player::{HeadlessItem, HeadlessPlayer};

use crate::{
    audio::{AudioCategory, AudioMode, AudioSession, AudioSessionOptions},
    native::{AssetStatus, InterruptionCallback, MediaAsset, MediaPlatform, NativePlayer, PlayerItem},
    subscription::Subscription,
    types::InterruptionPhase,
    Result,
};
use async_trait::async_trait;
use reqwest::Client;
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Headless implementation of [`MediaPlatform`]
pub struct HeadlessPlatform {
    client: Client,
    interruptions: Arc<ObserverList<InterruptionPhase>>,
    audio: HeadlessAudioSession,
}

impl HeadlessPlatform {
    pub fn new() -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            interruptions: Arc::new(ObserverList::new()),
            audio: HeadlessAudioSession::default(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The host audio session of this platform
    pub fn audio_session(&self) -> &HeadlessAudioSession {
        &self.audio
    }

    /// Deliver a host audio interruption to every registered observer
    pub fn interrupt(&self, phase: InterruptionPhase) {
        info!(?phase, observers = self.interruptions.len(), "Simulated audio interruption");
        self.interruptions.notify(phase);
    }
}

#[async_trait]
impl MediaPlatform for HeadlessPlatform {
    async fn load_asset(&self, url: &Url) -> AssetStatus {
        match HlsManifest::fetch(&self.client, url).await {
            Ok(manifest) => {
                info!(
                    url = %url,
                    variants = manifest.variants().len(),
                    throughput = manifest.throughput_bps(),
                    "Asset playable"
                );
                AssetStatus::Loaded(Arc::new(HeadlessAsset { manifest }))
            }
            Err(e) => {
                warn!(url = %url, code = e.error_code(), error = %e, "Asset not playable");
                AssetStatus::Failed(e.to_string())
            }
        }
    }

    fn make_item(&self, asset: Arc<dyn MediaAsset>) -> Arc<dyn PlayerItem> {
        match asset.as_any().downcast_ref::<HeadlessAsset>() {
            Some(asset) => HeadlessItem::prepare(self.client.clone(), asset.manifest.clone()),
            None => {
                warn!(url = %asset.url(), "Asset was not resolved by the headless platform");
                HeadlessItem::failed("asset from another platform")
            }
        }
    }

    fn make_player(&self, item: Arc<dyn PlayerItem>) -> Arc<dyn NativePlayer> {
        Arc::new(HeadlessPlayer::new(item))
    }

    fn observe_interruptions(&self, callback: InterruptionCallback) -> Subscription {
        self.interruptions.add("interruption", callback)
    }
}

/// Resolved playlist
pub struct HeadlessAsset {
    manifest: HlsManifest,
}

impl HeadlessAsset {
    pub fn manifest(&self) -> &HlsManifest {
        &self.manifest
    }
}

impl MediaAsset for HeadlessAsset {
    fn url(&self) -> &Url {
        &self.manifest.url
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// In-process audio session; starts in `SoloAmbient` like a fresh app
pub struct HeadlessAudioSession {
    state: Mutex<(AudioCategory, AudioMode, AudioSessionOptions)>,
}

impl Default for HeadlessAudioSession {
    fn default() -> Self {
        Self {
            state: Mutex::new((AudioCategory::SoloAmbient, AudioMode::Default, AudioSessionOptions::default())),
        }
    }
}

impl HeadlessAudioSession {
    pub fn mode(&self) -> AudioMode {
        self.state.lock().map(|s| s.1).unwrap_or(AudioMode::Default)
    }

    pub fn options(&self) -> AudioSessionOptions {
        self.state.lock().map(|s| s.2).unwrap_or_default()
    }
}

impl AudioSession for HeadlessAudioSession {
    fn category(&self) -> AudioCategory {
        self.state.lock().map(|s| s.0).unwrap_or(AudioCategory::SoloAmbient)
    }

    fn set_category(
        &self,
        category: AudioCategory,
        mode: AudioMode,
        options: AudioSessionOptions,
    ) -> std::result::Result<(), String> {
        let mut state = self.state.lock().map_err(|e| e.to_string())?;
        *state = (category, mode, options);
        debug!(%category, ?mode, "Headless audio session updated");
        Ok(())
    }
}

pub(crate) type Observer<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Registry behind the headless `observe_*` calls
pub(crate) struct ObserverList<T> {
    next_id: AtomicU64,
    observers: Mutex<Vec<(u64, Observer<T>)>>,
}

impl<T: Clone + 'static> ObserverList<T> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            observers: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn add(self: &Arc<Self>, label: &'static str, callback: Box<dyn Fn(T) + Send + Sync>) -> Subscription {
        self.add_shared(label, Arc::from(callback))
    }

    pub(crate) fn add_shared(self: &Arc<Self>, label: &'static str, callback: Observer<T>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut observers) = self.observers.lock() {
            observers.push((id, callback));
        }

        let list = Arc::downgrade(self);
        Subscription::new(label, move || {
            if let Some(list) = list.upgrade() {
                list.remove(id);
            }
        })
    }

    fn remove(&self, id: u64) {
        if let Ok(mut observers) = self.observers.lock() {
            observers.retain(|(existing, _)| *existing != id);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.lock().map(|o| o.len()).unwrap_or(0)
    }

    /// Invoke every observer outside the lock
    pub(crate) fn notify(&self, value: T) {
        let observers: Vec<Observer<T>> = match self.observers.lock() {
            Ok(observers) => observers.iter().map(|(_, cb)| cb.clone()).collect(),
            Err(_) => return,
        };
        for observer in observers {
            observer(value.clone());
        }
    }
}
