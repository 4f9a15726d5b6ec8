//! Scripted media platform for facade tests
//!
//! Records every observer registration, removal and native release in a
//! journal, and lets tests decide when assets resolve and what the native
//! side reports.

#![allow(dead_code)]

use async_trait::async_trait;
use playdeck_core::native::{AccessLogCallback, InterruptionCallback, StatusCallback, TimeCallback};
use playdeck_core::{
    AccessLogEntry, AssetStatus, InterruptionPhase, ItemStatus, MediaAsset, MediaPlatform, NativePlayer,
    PlayerFacade, PlayerItem, SeekTolerance, Subscription,
};
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use url::Url;

/// Scripted result of resolving an asset
#[derive(Debug, Clone)]
pub enum Outcome {
    Playable,
    Failed(&'static str),
    Cancelled,
    Unknown,
}

#[derive(Default)]
pub struct Journal(Mutex<Vec<String>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

type Observers<T> = Arc<Mutex<Vec<(u64, Arc<dyn Fn(T) + Send + Sync>)>>>;

static NEXT_OBSERVER: AtomicU64 = AtomicU64::new(0);

fn register<T: 'static>(
    observers: &Observers<T>,
    journal: &Arc<Journal>,
    label: &'static str,
    callback: Box<dyn Fn(T) + Send + Sync>,
) -> Subscription {
    let id = NEXT_OBSERVER.fetch_add(1, Ordering::Relaxed);
    observers.lock().unwrap().push((id, Arc::from(callback)));
    journal.record(format!("add {}", label));

    let observers = Arc::downgrade(observers);
    let journal = journal.clone();
    Subscription::new(label, move || {
        if let Some(observers) = observers.upgrade() {
            observers.lock().unwrap().retain(|(existing, _)| *existing != id);
        }
        journal.record(format!("remove {}", label));
    })
}

fn snapshot<T>(observers: &Observers<T>) -> Vec<Arc<dyn Fn(T) + Send + Sync>> {
    observers.lock().unwrap().iter().map(|(_, cb)| cb.clone()).collect()
}

pub struct ScriptedPlatform {
    journal: Arc<Journal>,
    scripted: Mutex<HashMap<String, Outcome>>,
    pending: Mutex<HashMap<String, oneshot::Sender<Outcome>>>,
    interruptions: Observers<InterruptionPhase>,
    items: Mutex<Vec<Weak<ScriptedItem>>>,
    players: Mutex<Vec<Weak<ScriptedPlayer>>>,
}

impl ScriptedPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            journal: Arc::new(Journal::default()),
            scripted: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            interruptions: Arc::new(Mutex::new(Vec::new())),
            items: Mutex::new(Vec::new()),
            players: Mutex::new(Vec::new()),
        })
    }

    /// Resolve `url` immediately on its next load
    pub fn script(&self, url: &str, outcome: Outcome) {
        self.scripted.lock().unwrap().insert(url.to_string(), outcome);
    }

    /// Resolve a load that is (or is about to be) waiting on `url`
    pub async fn complete(&self, url: &str, outcome: Outcome) {
        for _ in 0..100 {
            if let Some(tx) = self.pending.lock().unwrap().remove(url) {
                let _ = tx.send(outcome);
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("no pending asset load for {}", url);
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.entries()
    }

    /// Most recent item still alive
    pub fn item(&self) -> Option<Arc<ScriptedItem>> {
        self.items.lock().unwrap().iter().rev().find_map(Weak::upgrade)
    }

    /// Most recent player still alive
    pub fn player(&self) -> Option<Arc<ScriptedPlayer>> {
        self.players.lock().unwrap().iter().rev().find_map(Weak::upgrade)
    }

    pub fn players_created(&self) -> usize {
        self.players.lock().unwrap().len()
    }

    pub fn set_status(&self, status: ItemStatus) {
        self.item().expect("no live item").set_status(status);
    }

    pub fn access_log(&self, entries: Vec<AccessLogEntry>) {
        self.item().expect("no live item").append_log(entries);
    }

    pub fn tick(&self, at: Duration) {
        self.player().expect("no live player").tick(at);
    }

    pub fn interrupt(&self, phase: InterruptionPhase) {
        for callback in snapshot(&self.interruptions) {
            callback(phase);
        }
    }
}

#[async_trait]
impl MediaPlatform for ScriptedPlatform {
    async fn load_asset(&self, url: &Url) -> AssetStatus {
        let key = url.to_string();
        let scripted = self.scripted.lock().unwrap().get(&key).cloned();
        let outcome = match scripted {
            Some(outcome) => outcome,
            None => {
                let (tx, rx) = oneshot::channel();
                self.pending.lock().unwrap().insert(key, tx);
                rx.await.unwrap_or(Outcome::Cancelled)
            }
        };

        match outcome {
            Outcome::Playable => AssetStatus::Loaded(Arc::new(ScriptedAsset { url: url.clone() })),
            Outcome::Failed(reason) => AssetStatus::Failed(reason.to_string()),
            Outcome::Cancelled => AssetStatus::Cancelled,
            Outcome::Unknown => AssetStatus::Unknown,
        }
    }

    fn make_item(&self, asset: Arc<dyn MediaAsset>) -> Arc<dyn PlayerItem> {
        self.journal.record("make item");
        let item = Arc::new(ScriptedItem {
            url: asset.url().clone(),
            journal: self.journal.clone(),
            status: Mutex::new(ItemStatus::Unknown),
            duration: Mutex::new(Some(Duration::from_secs(600))),
            peak: Mutex::new(0.0),
            status_observers: Arc::new(Mutex::new(Vec::new())),
            log_observers: Arc::new(Mutex::new(Vec::new())),
            log: Mutex::new(Vec::new()),
        });
        self.items.lock().unwrap().push(Arc::downgrade(&item));
        item
    }

    fn make_player(&self, item: Arc<dyn PlayerItem>) -> Arc<dyn NativePlayer> {
        self.journal.record("make player");
        let player = Arc::new(ScriptedPlayer {
            _item: item,
            journal: self.journal.clone(),
            calls: Mutex::new(Vec::new()),
            position: Mutex::new(Duration::ZERO),
            muted: Mutex::new(false),
            time_observers: Arc::new(Mutex::new(Vec::new())),
        });
        self.players.lock().unwrap().push(Arc::downgrade(&player));
        player
    }

    fn observe_interruptions(&self, callback: InterruptionCallback) -> Subscription {
        register(&self.interruptions, &self.journal, "interruption", callback)
    }
}

pub struct ScriptedAsset {
    url: Url,
}

impl MediaAsset for ScriptedAsset {
    fn url(&self) -> &Url {
        &self.url
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct ScriptedItem {
    url: Url,
    journal: Arc<Journal>,
    status: Mutex<ItemStatus>,
    duration: Mutex<Option<Duration>>,
    peak: Mutex<f64>,
    status_observers: Observers<ItemStatus>,
    log_observers: Observers<Vec<AccessLogEntry>>,
    log: Mutex<Vec<AccessLogEntry>>,
}

impl ScriptedItem {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn set_duration(&self, duration: Option<Duration>) {
        *self.duration.lock().unwrap() = duration;
    }

    pub fn set_status(&self, status: ItemStatus) {
        *self.status.lock().unwrap() = status.clone();
        for callback in snapshot(&self.status_observers) {
            callback(status.clone());
        }
    }

    pub fn append_log(&self, entries: Vec<AccessLogEntry>) {
        let log = {
            let mut log = self.log.lock().unwrap();
            log.extend(entries);
            log.clone()
        };
        for callback in snapshot(&self.log_observers) {
            callback(log.clone());
        }
    }

    /// Status callbacks as registered right now, for delivering late
    pub fn status_callbacks(&self) -> Vec<Arc<dyn Fn(ItemStatus) + Send + Sync>> {
        snapshot(&self.status_observers)
    }

    pub fn observer_count(&self) -> usize {
        self.status_observers.lock().unwrap().len() + self.log_observers.lock().unwrap().len()
    }
}

impl Drop for ScriptedItem {
    fn drop(&mut self) {
        self.journal.record("release item");
    }
}

impl PlayerItem for ScriptedItem {
    fn status(&self) -> ItemStatus {
        self.status.lock().unwrap().clone()
    }

    fn duration(&self) -> Option<Duration> {
        *self.duration.lock().unwrap()
    }

    fn preferred_peak_bit_rate(&self) -> f64 {
        *self.peak.lock().unwrap()
    }

    fn set_preferred_peak_bit_rate(&self, bits_per_second: f64) {
        *self.peak.lock().unwrap() = bits_per_second;
    }

    fn observe_status(&self, callback: StatusCallback) -> Subscription {
        register(&self.status_observers, &self.journal, "item.status", callback)
    }

    fn observe_access_log(&self, callback: AccessLogCallback) -> Subscription {
        register(&self.log_observers, &self.journal, "item.access_log", callback)
    }
}

pub struct ScriptedPlayer {
    _item: Arc<dyn PlayerItem>,
    journal: Arc<Journal>,
    calls: Mutex<Vec<String>>,
    position: Mutex<Duration>,
    muted: Mutex<bool>,
    time_observers: Observers<Duration>,
}

impl ScriptedPlayer {
    /// Transport calls in order: `play`, `pause`, `seek <ms> exact`, `mute <bool>`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_position(&self, position: Duration) {
        *self.position.lock().unwrap() = position;
    }

    pub fn tick(&self, at: Duration) {
        self.set_position(at);
        for callback in snapshot(&self.time_observers) {
            callback(at);
        }
    }

    pub fn time_observer_count(&self) -> usize {
        self.time_observers.lock().unwrap().len()
    }
}

impl Drop for ScriptedPlayer {
    fn drop(&mut self) {
        self.journal.record("release player");
    }
}

impl NativePlayer for ScriptedPlayer {
    fn play(&self) {
        self.calls.lock().unwrap().push("play".into());
    }

    fn pause(&self) {
        self.calls.lock().unwrap().push("pause".into());
    }

    fn rate(&self) -> f32 {
        match self.calls.lock().unwrap().iter().rev().find(|c| *c == "play" || *c == "pause") {
            Some(call) if call == "play" => 1.0,
            _ => 0.0,
        }
    }

    fn current_time(&self) -> Option<Duration> {
        Some(*self.position.lock().unwrap())
    }

    fn seek(&self, to: Duration, tolerance: SeekTolerance) {
        let mode = if tolerance == SeekTolerance::ZERO { "exact" } else { "tolerant" };
        self.calls.lock().unwrap().push(format!("seek {} {}", to.as_millis(), mode));
        self.set_position(to);
    }

    fn is_muted(&self) -> bool {
        *self.muted.lock().unwrap()
    }

    fn set_muted(&self, muted: bool) {
        self.calls.lock().unwrap().push(format!("mute {}", muted));
        *self.muted.lock().unwrap() = muted;
    }

    fn add_periodic_time_observer(&self, interval: Duration, callback: TimeCallback) -> Subscription {
        self.journal.record(format!("time interval {}ms", interval.as_millis()));
        register(&self.time_observers, &self.journal, "player.periodic_time", callback)
    }
}

/// Let spawned work run, then wait until the facade has drained its queue
pub async fn settle(facade: &PlayerFacade) {
    for _ in 0..5 {
        tokio::task::yield_now().await;
        let _ = facade.flush().await;
    }
}
