//! Player Facade - mediates between UI intent and the native player
//!
//! Coordinates:
//! - Session replacement and observer detachment
//! - Asset resolution and item preparation
//! - Native notifications re-dispatched onto one serialized queue
//! - Event emission and state snapshots
//!
//! All facade state lives in a single worker task. Handle calls, asset
//! resolution results and native callbacks are all messages on the worker's
//! queue, so state is only ever touched from one place and in order. Native
//! callbacks carry the id of the session that registered them; anything that
//! arrives for a superseded session is dropped.

use crate::{
    config::{validate_peak_bit_rate, PlayerConfig},
    error::PlaybackFailure,
    event::{EventStream, PlaybackEvent},
    native::{AssetStatus, MediaAsset, MediaPlatform, NativePlayer},
    session::PlaybackSession,
    types::*,
    Error, Result,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Point-in-time view of the facade
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    /// Current session, if any
    pub session: Option<SessionId>,
    /// Source URL of the current session
    pub url: Option<Url>,
    pub state: PlaybackState,
    pub is_playing: bool,
    pub is_muted: bool,
    pub bitrate: BitrateStats,
}

impl PlayerSnapshot {
    fn idle(preferred_peak: f64) -> Self {
        Self {
            session: None,
            url: None,
            state: PlaybackState::Idle,
            is_playing: false,
            is_muted: false,
            bitrate: BitrateStats {
                preferred_peak,
                ..Default::default()
            },
        }
    }
}

enum Command {
    Load { session: SessionId, url: Url },
    Play,
    Pause,
    SeekForward,
    SeekBackward,
    SeekTo(Duration),
    SetMuted(bool),
    SetPreferredPeakBitRate(f64),
}

enum Notification {
    Status(ItemStatus),
    Time(Duration),
    AccessLog(Vec<AccessLogEntry>),
    Interruption(InterruptionPhase),
}

enum Message {
    Command(Command),
    AssetResolved { session: SessionId, status: AssetStatus },
    Native { session: SessionId, notification: Notification },
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Handle to a running player facade
///
/// Operations enqueue and return immediately. Dropping the last handle tears
/// the current session down and stops the worker.
#[derive(Clone)]
pub struct PlayerFacade {
    tx: mpsc::UnboundedSender<Message>,
    snapshot_rx: watch::Receiver<PlayerSnapshot>,
}

impl PlayerFacade {
    /// Start a facade over `platform`. Must be called inside a tokio runtime.
    pub fn spawn(platform: Arc<dyn MediaPlatform>, config: PlayerConfig) -> Result<(Self, EventStream)> {
        config.validate()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(PlayerSnapshot::idle(config.preferred_peak_bit_rate));

        let worker = FacadeWorker {
            platform,
            preferred_peak: config.preferred_peak_bit_rate,
            config,
            session: None,
            inbox: tx.downgrade(),
            events: event_tx,
            snapshot: snapshot_tx,
        };
        tokio::spawn(worker.run(rx));

        Ok((Self { tx, snapshot_rx }, EventStream::new(event_rx)))
    }

    /// Start a new session for `url`, replacing any current one
    pub fn load(&self, url: &str) -> Result<SessionId> {
        let url = Url::parse(url)?;
        self.load_url(url)
    }

    pub fn load_url(&self, url: Url) -> Result<SessionId> {
        let session = SessionId::new();
        self.send(Message::Command(Command::Load { session, url }))?;
        Ok(session)
    }

    /// Resume playback; no-op unless a ready session is paused
    pub fn play(&self) {
        self.command(Command::Play);
    }

    /// Pause playback; no-op unless a ready session is playing
    pub fn pause(&self) {
        self.command(Command::Pause);
    }

    pub fn seek_forward(&self) {
        self.command(Command::SeekForward);
    }

    pub fn seek_backward(&self) {
        self.command(Command::SeekBackward);
    }

    /// Exact seek to an absolute position
    pub fn seek_to(&self, position: Duration) {
        self.command(Command::SeekTo(position));
    }

    pub fn set_muted(&self, muted: bool) {
        self.command(Command::SetMuted(muted));
    }

    /// Cap the bitrate the native adaptive algorithm may select (0 = no cap)
    pub fn set_preferred_peak_bit_rate(&self, bits_per_second: f64) -> Result<()> {
        validate_peak_bit_rate(bits_per_second)?;
        self.send(Message::Command(Command::SetPreferredPeakBitRate(bits_per_second)))
    }

    /// Latest published state
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Resolves once every message queued before this call has been handled
    pub async fn flush(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.send(Message::Flush(ack))?;
        done.await.map_err(|_| Error::FacadeClosed)
    }

    /// Detach the current session and stop the worker
    pub async fn shutdown(self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.send(Message::Shutdown(ack))?;
        done.await.map_err(|_| Error::FacadeClosed)
    }

    fn command(&self, command: Command) {
        if self.send(Message::Command(command)).is_err() {
            debug!("Command dropped, facade has shut down");
        }
    }

    fn send(&self, message: Message) -> Result<()> {
        self.tx.send(message).map_err(|_| Error::FacadeClosed)
    }
}

struct FacadeWorker {
    platform: Arc<dyn MediaPlatform>,
    config: PlayerConfig,
    /// Cap applied to every session on ready
    preferred_peak: f64,
    session: Option<PlaybackSession>,
    /// Weak so native callbacks never keep the worker alive
    inbox: mpsc::WeakUnboundedSender<Message>,
    events: mpsc::UnboundedSender<PlaybackEvent>,
    snapshot: watch::Sender<PlayerSnapshot>,
}

impl FacadeWorker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Message>) {
        while let Some(message) = rx.recv().await {
            match message {
                Message::Command(command) => self.handle_command(command),
                Message::AssetResolved { session, status } => self.asset_resolved(session, status),
                Message::Native { session, notification } => self.native(session, notification),
                Message::Flush(ack) => {
                    let _ = ack.send(());
                }
                Message::Shutdown(ack) => {
                    self.teardown("shutdown");
                    let _ = ack.send(());
                    return;
                }
            }
        }
        self.teardown("facade dropped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Load { session, url } => self.load(session, url),
            Command::Play => self.play(),
            Command::Pause => self.pause(),
            Command::SeekForward => self.seek_by(true),
            Command::SeekBackward => self.seek_by(false),
            Command::SeekTo(position) => self.seek_to(position),
            Command::SetMuted(muted) => self.set_muted(muted),
            Command::SetPreferredPeakBitRate(bps) => self.set_preferred_peak(bps),
        }
    }

    #[instrument(skip(self, url), fields(url = %url))]
    fn load(&mut self, id: SessionId, url: Url) {
        if let Some(mut previous) = self.session.take() {
            previous.detach("superseded");
        }

        info!(session_id = %id, "Loading content");
        let mut session = PlaybackSession::new(id, url.clone());
        session.set_preferred_peak(self.preferred_peak);
        self.session = Some(session);
        self.publish();

        let platform = self.platform.clone();
        let inbox = self.inbox.clone();
        tokio::spawn(async move {
            let status = platform.load_asset(&url).await;
            if let Some(tx) = inbox.upgrade() {
                let _ = tx.send(Message::AssetResolved { session: id, status });
            }
        });
    }

    fn asset_resolved(&mut self, id: SessionId, status: AssetStatus) {
        if !self.is_current(id) {
            debug!(session_id = %id, ?status, "Discarding asset resolution for superseded session");
            return;
        }
        if self.state() != PlaybackState::Loading {
            debug!(session_id = %id, state = %self.state(), "Asset resolution after session settled");
            return;
        }

        match status {
            AssetStatus::Loaded(asset) => self.prepare(id, asset),
            AssetStatus::Failed(reason) => self.fail(PlaybackFailure::AssetResolutionFailed(reason)),
            AssetStatus::Cancelled => self.fail(PlaybackFailure::AssetResolutionCancelled),
            AssetStatus::Unknown => self.fail(PlaybackFailure::AssetResolutionFailed("status unknown".into())),
        }
    }

    /// Build the item, register its observers, then attach it to a player
    fn prepare(&mut self, id: SessionId, asset: Arc<dyn MediaAsset>) {
        debug!(session_id = %id, url = %asset.url(), "Asset playable");
        let item = self.platform.make_item(asset);

        let mut subscriptions = vec![item.observe_status(self.notifier(id, Notification::Status))];
        if self.config.observe_access_log {
            subscriptions.push(item.observe_access_log(self.notifier(id, Notification::AccessLog)));
        }
        if self.config.observe_interruptions {
            subscriptions.push(
                self.platform
                    .observe_interruptions(self.notifier(id, Notification::Interruption)),
            );
        }

        // Observers are in place before attaching, so readiness is never missed
        let player = self.platform.make_player(item.clone());

        if let Some(session) = self.session.as_mut() {
            session.bind_item(item);
            session.bind_player(player);
            for subscription in subscriptions {
                session.adopt(subscription);
            }
        }
    }

    fn native(&mut self, id: SessionId, notification: Notification) {
        if !self.is_current(id) {
            debug!(session_id = %id, "Discarding notification from superseded session");
            return;
        }

        match notification {
            Notification::Status(status) => self.item_status(status),
            Notification::Time(current) => self.progress(current),
            Notification::AccessLog(entries) => self.access_log(&entries),
            Notification::Interruption(phase) => self.interruption(phase),
        }
    }

    fn item_status(&mut self, status: ItemStatus) {
        match status {
            ItemStatus::ReadyToPlay => self.ready(),
            ItemStatus::Failed(reason) => self.fail(PlaybackFailure::PlayerItemFailed(reason)),
            ItemStatus::Unknown => self.fail(PlaybackFailure::UnknownStatus),
        }
    }

    /// Start playback, announce readiness, start the progress timer, apply the cap
    fn ready(&mut self) {
        let Some(id) = self.session.as_ref().map(PlaybackSession::id) else {
            return;
        };
        let on_time = self.notifier(id, Notification::Time);
        let interval = self.config.progress_interval();
        let peak = self.preferred_peak;

        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.state() != PlaybackState::Loading {
            debug!(session_id = %id, state = %session.state(), "Ignoring repeated ready status");
            return;
        }
        let (Some(player), Some(item)) = (session.player().cloned(), session.item().cloned()) else {
            warn!(session_id = %id, "Ready status before player attached");
            return;
        };
        if let Err(e) = session.transition(PlaybackState::Ready) {
            warn!(session_id = %id, error = %e, "Cannot enter ready");
            return;
        }

        player.play();
        if let Err(e) = session.transition(PlaybackState::Playing) {
            warn!(session_id = %id, error = %e, "Cannot enter playing");
        }
        let _ = self.events.send(PlaybackEvent::Ready { session: id });

        session.adopt(player.add_periodic_time_observer(interval, on_time));

        item.set_preferred_peak_bit_rate(peak);
        session.set_preferred_peak(peak);
        debug!(session_id = %id, preferred_peak = peak, "Peak bitrate applied");

        self.publish();
    }

    /// Terminal failure: report once, then detach
    fn fail(&mut self, reason: PlaybackFailure) {
        if !reason.is_reportable() {
            debug!(code = reason.error_code(), %reason, "Ignoring transient failure");
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Err(e) = session.transition(PlaybackState::Failed) {
            debug!(session_id = %session.id(), error = %e, %reason, "Ignoring failure for settled session");
            return;
        }

        warn!(session_id = %session.id(), code = reason.error_code(), %reason, "Playback failed");
        session.detach("failed");
        let _ = self.events.send(PlaybackEvent::Failed {
            session: session.id(),
            reason,
        });
        self.publish();
    }

    fn progress(&mut self, current: Duration) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if !session.state().is_active() {
            return;
        }
        let total = session.item().and_then(|item| item.duration());
        let _ = self.events.send(PlaybackEvent::ProgressTick { current, total });
    }

    fn access_log(&mut self, entries: &[AccessLogEntry]) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.state() == PlaybackState::Failed {
            return;
        }
        if let Some((indicated, observed)) = session.record_access_log(entries) {
            debug!(session_id = %session.id(), indicated, observed, "Bitrate changed");
            let _ = self.events.send(PlaybackEvent::BitrateSample { indicated, observed });
            self.publish();
        }
    }

    fn interruption(&mut self, phase: InterruptionPhase) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        info!(session_id = %session.id(), ?phase, "Audio interruption");

        // The native layer pauses itself when an interruption begins
        if phase == InterruptionPhase::Began && session.state() == PlaybackState::Playing {
            if let Err(e) = session.transition(PlaybackState::Paused) {
                warn!(error = %e, "Cannot record interruption pause");
            }
        }
        let _ = self.events.send(PlaybackEvent::Interrupted(phase));
        self.publish();
    }

    fn play(&mut self) {
        let Some(session) = self.session.as_mut() else {
            debug!("play() without a session");
            return;
        };
        match session.state() {
            PlaybackState::Paused | PlaybackState::Ready => {
                if let Some(player) = session.player() {
                    player.play();
                }
                if let Err(e) = session.transition(PlaybackState::Playing) {
                    warn!(error = %e, "Cannot resume");
                }
            }
            PlaybackState::Playing => debug!("Already playing"),
            state => debug!(%state, "Cannot play from current state"),
        }
        self.publish();
    }

    fn pause(&mut self) {
        let Some(session) = self.session.as_mut() else {
            debug!("pause() without a session");
            return;
        };
        match session.state() {
            PlaybackState::Playing | PlaybackState::Ready => {
                if let Some(player) = session.player() {
                    player.pause();
                }
                if let Err(e) = session.transition(PlaybackState::Paused) {
                    warn!(error = %e, "Cannot pause");
                }
            }
            PlaybackState::Paused => debug!("Already paused"),
            state => debug!(%state, "Cannot pause from current state"),
        }
        self.publish();
    }

    fn seek_by(&mut self, forward: bool) {
        let step = self.config.seek_step();
        let Some(player) = self.active_player() else {
            debug!("seek without an active session");
            return;
        };
        let Some(current) = player.current_time() else {
            debug!("seek without a current position");
            return;
        };

        let target = if forward {
            current + step
        } else {
            current.saturating_sub(step)
        };
        info!(from = current.as_secs_f64(), to = target.as_secs_f64(), "Seeking");
        player.seek(target, SeekTolerance::ZERO);
    }

    fn seek_to(&mut self, position: Duration) {
        let Some(player) = self.active_player() else {
            debug!("seek without an active session");
            return;
        };
        info!(to = position.as_secs_f64(), "Seeking");
        player.seek(position, SeekTolerance::ZERO);
    }

    fn set_muted(&mut self, muted: bool) {
        let Some(player) = self.session.as_ref().and_then(|s| s.player().cloned()) else {
            debug!(muted, "set_muted() without a player");
            return;
        };
        if player.is_muted() != muted {
            player.set_muted(muted);
            debug!(muted, "Mute changed");
        }
        self.publish();
    }

    fn set_preferred_peak(&mut self, bits_per_second: f64) {
        self.preferred_peak = bits_per_second;
        if let Some(session) = self.session.as_mut() {
            if session.state().is_active() {
                if let Some(item) = session.item() {
                    item.set_preferred_peak_bit_rate(bits_per_second);
                }
            }
            session.set_preferred_peak(bits_per_second);
        }
        debug!(preferred_peak = bits_per_second, "Peak bitrate updated");
        self.publish();
    }

    fn teardown(&mut self, reason: &str) {
        if let Some(mut session) = self.session.take() {
            session.detach(reason);
        }
        self.publish();
    }

    /// Callback that re-dispatches a native notification onto the queue
    fn notifier<T: Send + 'static>(
        &self,
        session: SessionId,
        wrap: fn(T) -> Notification,
    ) -> Box<dyn Fn(T) + Send + Sync> {
        let inbox = self.inbox.clone();
        Box::new(move |value| {
            if let Some(tx) = inbox.upgrade() {
                let _ = tx.send(Message::Native {
                    session,
                    notification: wrap(value),
                });
            }
        })
    }

    fn is_current(&self, id: SessionId) -> bool {
        self.session.as_ref().is_some_and(|s| s.id() == id)
    }

    fn state(&self) -> PlaybackState {
        self.session
            .as_ref()
            .map(PlaybackSession::state)
            .unwrap_or(PlaybackState::Idle)
    }

    fn active_player(&self) -> Option<Arc<dyn NativePlayer>> {
        let session = self.session.as_ref()?;
        if !session.state().is_active() {
            return None;
        }
        session.player().cloned()
    }

    fn publish(&self) {
        let snapshot = match self.session.as_ref() {
            Some(session) => PlayerSnapshot {
                session: Some(session.id()),
                url: Some(session.url().clone()),
                state: session.state(),
                is_playing: session.is_playing(),
                is_muted: session.player().is_some_and(|p| p.is_muted()),
                bitrate: session.bitrate(),
            },
            None => PlayerSnapshot::idle(self.preferred_peak),
        };
        self.snapshot.send_replace(snapshot);
    }
}
