//! Headless item and player
//!
//! Features:
//! - Item readiness from the media playlist timeline
//! - Variant selection under the preferred peak bitrate, recorded in the access log
//! - Virtual playback clock driven by tokio time
//! - Periodic time observer on a tokio interval

use super::manifest::{fetch_media_timeline, select_variant, HlsManifest, MediaTimeline, Presentation, Variant};
use super::{Observer, ObserverList};
use crate::{
    native::{AccessLogCallback, NativePlayer, PlayerItem, StatusCallback, TimeCallback},
    subscription::Subscription,
    types::{AccessLogEntry, ItemStatus, SeekTolerance},
    Result,
};
use reqwest::Client;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

struct ItemState {
    status: ItemStatus,
    duration: Option<Duration>,
    preferred_peak: f64,
    variant: Option<Variant>,
    access_log: Vec<AccessLogEntry>,
}

/// Player item over a fetched playlist
pub struct HeadlessItem {
    manifest: Option<HlsManifest>,
    state: Mutex<ItemState>,
    status_observers: Arc<ObserverList<ItemStatus>>,
    log_observers: Arc<ObserverList<Vec<AccessLogEntry>>>,
    preparation: Mutex<Option<JoinHandle<()>>>,
}

impl HeadlessItem {
    fn with_state(manifest: Option<HlsManifest>, status: ItemStatus) -> Self {
        Self {
            manifest,
            state: Mutex::new(ItemState {
                status,
                duration: None,
                preferred_peak: 0.0,
                variant: None,
                access_log: Vec::new(),
            }),
            status_observers: Arc::new(ObserverList::new()),
            log_observers: Arc::new(ObserverList::new()),
            preparation: Mutex::new(None),
        }
    }

    /// Item that starts preparing immediately. Must be called inside a tokio runtime.
    pub fn prepare(client: Client, manifest: HlsManifest) -> Arc<Self> {
        let item = Arc::new(Self::with_state(Some(manifest.clone()), ItemStatus::Unknown));

        let weak = Arc::downgrade(&item);
        let handle = tokio::spawn(async move {
            let start = match &manifest.presentation {
                Presentation::Multivariant { variants } => variants.first().cloned(),
                Presentation::Media(_) => None,
            };
            let outcome = resolve_timeline(&client, &manifest, start.as_ref()).await;
            if let Some(item) = weak.upgrade() {
                item.settle(outcome, start, manifest.throughput_bps());
            }
        });

        if let Ok(mut preparation) = item.preparation.lock() {
            *preparation = Some(handle);
        }
        item
    }

    /// Item that failed before preparing
    pub fn failed(reason: &str) -> Arc<Self> {
        Arc::new(Self::with_state(None, ItemStatus::Failed(reason.to_string())))
    }

    /// Variant currently selected, if the playlist has a ladder
    pub fn selected_variant(&self) -> Option<Variant> {
        self.state.lock().ok().and_then(|s| s.variant.clone())
    }

    pub fn access_log(&self) -> Vec<AccessLogEntry> {
        self.state.lock().map(|s| s.access_log.clone()).unwrap_or_default()
    }

    fn settle(&self, outcome: Result<MediaTimeline>, variant: Option<Variant>, throughput: f64) {
        let (status, log) = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            match outcome {
                Ok(timeline) => {
                    state.status = ItemStatus::ReadyToPlay;
                    state.duration = timeline.duration;
                    let log = variant.as_ref().map(|v| {
                        state.access_log.push(AccessLogEntry {
                            indicated_bitrate: v.bandwidth as f64,
                            observed_bitrate: throughput,
                        });
                        state.access_log.clone()
                    });
                    state.variant = variant;
                    info!(
                        duration = ?timeline.duration,
                        live = timeline.is_live,
                        segments = timeline.segments,
                        "Item ready to play"
                    );
                    (state.status.clone(), log)
                }
                Err(e) => {
                    warn!(code = e.error_code(), error = %e, "Item failed");
                    state.status = ItemStatus::Failed(e.to_string());
                    (state.status.clone(), None)
                }
            }
        };

        self.status_observers.notify(status);
        if let Some(log) = log {
            self.log_observers.notify(log);
        }
    }
}

async fn resolve_timeline(client: &Client, manifest: &HlsManifest, start: Option<&Variant>) -> Result<MediaTimeline> {
    match (&manifest.presentation, start) {
        (Presentation::Media(timeline), _) => Ok(*timeline),
        (Presentation::Multivariant { .. }, Some(variant)) => fetch_media_timeline(client, &variant.uri).await,
        (Presentation::Multivariant { .. }, None) => Err(crate::Error::ManifestParse(
            "multivariant playlist has no variants".into(),
        )),
    }
}

impl Drop for HeadlessItem {
    fn drop(&mut self) {
        if let Ok(mut preparation) = self.preparation.lock() {
            if let Some(handle) = preparation.take() {
                handle.abort();
            }
        }
    }
}

impl PlayerItem for HeadlessItem {
    fn status(&self) -> ItemStatus {
        self.state.lock().map(|s| s.status.clone()).unwrap_or(ItemStatus::Unknown)
    }

    fn duration(&self) -> Option<Duration> {
        self.state.lock().ok().and_then(|s| s.duration)
    }

    fn preferred_peak_bit_rate(&self) -> f64 {
        self.state.lock().map(|s| s.preferred_peak).unwrap_or(0.0)
    }

    fn set_preferred_peak_bit_rate(&self, bits_per_second: f64) {
        let log = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            state.preferred_peak = bits_per_second;
            if state.status != ItemStatus::ReadyToPlay {
                return;
            }
            let Some(manifest) = self.manifest.as_ref() else {
                return;
            };
            let Some(next) = select_variant(manifest.variants(), bits_per_second).cloned() else {
                return;
            };
            if state.variant.as_ref() == Some(&next) {
                return;
            }

            debug!(
                from = state.variant.as_ref().map(|v| v.bandwidth),
                to = next.bandwidth,
                cap = bits_per_second,
                "Variant switch"
            );
            state.access_log.push(AccessLogEntry {
                indicated_bitrate: next.bandwidth as f64,
                observed_bitrate: manifest.throughput_bps(),
            });
            state.variant = Some(next);
            state.access_log.clone()
        };
        self.log_observers.notify(log);
    }

    /// Also delivers the current status if the item has already settled.
    ///
    /// The observer is registered before the status is read, so a concurrent
    /// settle is seen at least once. A settled status may arrive twice.
    fn observe_status(&self, callback: StatusCallback) -> Subscription {
        let callback: Observer<ItemStatus> = Arc::from(callback);
        let subscription = self.status_observers.add_shared("item.status", callback.clone());

        let current = self.status();
        if current != ItemStatus::Unknown {
            callback(current);
        }
        subscription
    }

    fn observe_access_log(&self, callback: AccessLogCallback) -> Subscription {
        self.log_observers.add("item.access_log", callback)
    }
}

/// Virtual playback clock
struct Clock {
    /// Position at the last play/pause/seek
    base: Duration,
    /// Set while the clock runs
    resumed_at: Option<Instant>,
    rate: f32,
    muted: bool,
}

impl Clock {
    fn position(&self, duration: Option<Duration>) -> Duration {
        let elapsed = self.resumed_at.map(|t| t.elapsed()).unwrap_or_default();
        let position = self.base + elapsed;
        match duration {
            Some(end) => position.min(end),
            None => position,
        }
    }

    fn freeze(&mut self, duration: Option<Duration>) {
        self.base = self.position(duration);
        self.resumed_at = None;
        self.rate = 0.0;
    }
}

/// Player that advances a virtual clock instead of decoding
pub struct HeadlessPlayer {
    item: Arc<dyn PlayerItem>,
    clock: Arc<Mutex<Clock>>,
}

impl HeadlessPlayer {
    pub fn new(item: Arc<dyn PlayerItem>) -> Self {
        Self {
            item,
            clock: Arc::new(Mutex::new(Clock {
                base: Duration::ZERO,
                resumed_at: None,
                rate: 0.0,
                muted: false,
            })),
        }
    }
}

impl NativePlayer for HeadlessPlayer {
    fn play(&self) {
        if let Ok(mut clock) = self.clock.lock() {
            if clock.resumed_at.is_none() {
                clock.resumed_at = Some(Instant::now());
                clock.rate = 1.0;
                debug!(position = clock.base.as_secs_f64(), "Clock started");
            }
        }
    }

    fn pause(&self) {
        let duration = self.item.duration();
        if let Ok(mut clock) = self.clock.lock() {
            clock.freeze(duration);
            debug!(position = clock.base.as_secs_f64(), "Clock stopped");
        }
    }

    fn rate(&self) -> f32 {
        self.clock.lock().map(|c| c.rate).unwrap_or(0.0)
    }

    fn current_time(&self) -> Option<Duration> {
        if self.item.status() != ItemStatus::ReadyToPlay {
            return None;
        }
        let duration = self.item.duration();
        self.clock.lock().ok().map(|c| c.position(duration))
    }

    fn seek(&self, to: Duration, _tolerance: SeekTolerance) {
        let duration = self.item.duration();
        if let Ok(mut clock) = self.clock.lock() {
            clock.base = duration.map_or(to, |end| to.min(end));
            if clock.resumed_at.is_some() {
                clock.resumed_at = Some(Instant::now());
            }
            debug!(position = clock.base.as_secs_f64(), "Seek completed");
        }
    }

    fn is_muted(&self) -> bool {
        self.clock.lock().map(|c| c.muted).unwrap_or(false)
    }

    fn set_muted(&self, muted: bool) {
        if let Ok(mut clock) = self.clock.lock() {
            clock.muted = muted;
        }
    }

    fn add_periodic_time_observer(&self, interval: Duration, callback: TimeCallback) -> Subscription {
        let clock = Arc::downgrade(&self.clock);
        let item: Weak<dyn PlayerItem> = Arc::downgrade(&self.item);
        let period = interval.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let (Some(clock), Some(item)) = (clock.upgrade(), item.upgrade()) else {
                    break;
                };
                let duration = item.duration();
                let position = {
                    let Ok(mut clock) = clock.lock() else {
                        break;
                    };
                    if clock.resumed_at.is_none() {
                        continue;
                    }
                    let position = clock.position(duration);
                    if duration.is_some_and(|end| position >= end) {
                        clock.freeze(duration);
                        debug!("Reached end of item");
                    }
                    position
                };
                callback(position);
            }
        });

        Subscription::new("player.periodic_time", move || handle.abort())
    }
}
