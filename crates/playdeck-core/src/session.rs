//! Playback Session - one (url, item, player) triple
//!
//! Owned exclusively by the facade worker. Holds:
//! - The state machine position for this attempt
//! - The native item and player once the asset resolves
//! - Every observer registered on their behalf
//! - The last access-log bitrate pair

use crate::{
    native::{NativePlayer, PlayerItem},
    subscription::{Subscription, SubscriptionSet},
    types::*,
    Error, Result,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use url::Url;

/// State of a single playback attempt
pub struct PlaybackSession {
    /// Unique session ID
    id: SessionId,
    /// Source URL
    url: Url,
    /// Current state
    state: PlaybackState,
    /// Native rate is non-zero
    is_playing: bool,
    /// Access-log samples and the applied cap
    bitrate: BitrateStats,
    // Declared before the native objects: observers are removed before the
    // player and item are released, including on plain drop.
    subscriptions: SubscriptionSet,
    player: Option<Arc<dyn NativePlayer>>,
    item: Option<Arc<dyn PlayerItem>>,
    /// Session start time
    start_time: Instant,
}

impl PlaybackSession {
    /// Create a session in `Loading`
    pub fn new(id: SessionId, url: Url) -> Self {
        Self {
            id,
            url,
            state: PlaybackState::Loading,
            is_playing: false,
            bitrate: BitrateStats::default(),
            subscriptions: SubscriptionSet::new(),
            player: None,
            item: None,
            start_time: Instant::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn bitrate(&self) -> BitrateStats {
        self.bitrate
    }

    pub fn item(&self) -> Option<&Arc<dyn PlayerItem>> {
        self.item.as_ref()
    }

    pub fn player(&self) -> Option<&Arc<dyn NativePlayer>> {
        self.player.as_ref()
    }

    /// Number of live observer registrations
    pub fn observer_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Transition to new state
    pub fn transition(&mut self, new_state: PlaybackState) -> Result<()> {
        let current = self.state;
        if !current.can_transition_to(new_state) {
            return Err(Error::InvalidStateTransition {
                from: current.to_string(),
                to: new_state.to_string(),
            });
        }

        self.state = new_state;
        self.is_playing = new_state == PlaybackState::Playing;

        info!(session_id = %self.id, from = %current, to = %new_state, "State transition");
        Ok(())
    }

    /// Keep the native item for this session
    pub fn bind_item(&mut self, item: Arc<dyn PlayerItem>) {
        self.item = Some(item);
    }

    /// Keep the native player for this session
    pub fn bind_player(&mut self, player: Arc<dyn NativePlayer>) {
        self.player = Some(player);
    }

    /// Take ownership of an observer registration
    pub fn adopt(&mut self, subscription: Subscription) {
        debug!(session_id = %self.id, observer = subscription.label(), "Observer registered");
        self.subscriptions.push(subscription);
    }

    pub fn set_preferred_peak(&mut self, bits_per_second: f64) {
        self.bitrate.preferred_peak = bits_per_second;
    }

    /// Fold an access log into the stored pair.
    ///
    /// Returns the new `(indicated, observed)` pair when it differs from the
    /// stored one.
    pub fn record_access_log(&mut self, entries: &[AccessLogEntry]) -> Option<(f64, f64)> {
        let last = entries.last()?;
        if last.indicated_bitrate == self.bitrate.indicated && last.observed_bitrate == self.bitrate.observed {
            return None;
        }
        self.bitrate.indicated = last.indicated_bitrate;
        self.bitrate.observed = last.observed_bitrate;
        Some((last.indicated_bitrate, last.observed_bitrate))
    }

    /// Remove every observer, then release the player and item
    pub fn detach(&mut self, reason: &str) {
        let observers = self.subscriptions.len();
        self.subscriptions.dispose_all();
        self.player = None;
        self.item = None;
        self.is_playing = false;

        info!(
            session_id = %self.id,
            reason,
            observers,
            watch_time = self.start_time.elapsed().as_secs_f64(),
            "Session detached"
        );
    }
}
