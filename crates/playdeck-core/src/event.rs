//! Playback event stream
//!
//! The facade reports everything the screen needs through one ordered stream
//! of [`PlaybackEvent`]s. Events are ephemeral; nothing is persisted.

use crate::error::PlaybackFailure;
use crate::types::{InterruptionPhase, SessionId};
use std::time::Duration;
use tokio::sync::mpsc;

/// Event emitted by the player facade
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// Item became ready and playback was started
    Ready { session: SessionId },

    /// Session ended in a terminal failure
    Failed {
        session: SessionId,
        reason: PlaybackFailure,
    },

    /// Periodic position update
    ProgressTick {
        current: Duration,
        /// `None` while the duration is unknown or indefinite
        total: Option<Duration>,
    },

    /// Access log reported a new bitrate pair
    BitrateSample { indicated: f64, observed: f64 },

    /// Host audio interruption
    Interrupted(InterruptionPhase),
}

impl PlaybackEvent {
    /// Progress as a fraction of total duration, clamped to `[0, 1]`
    pub fn progress_fraction(&self) -> Option<f64> {
        match self {
            PlaybackEvent::ProgressTick {
                current,
                total: Some(total),
            } if !total.is_zero() => Some((current.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)),
            _ => None,
        }
    }
}

/// Callback interface for hosts that prefer a delegate over a stream
pub trait PlayerDelegate: Send {
    fn on_ready(&mut self, session: SessionId);
    fn on_failed(&mut self, session: SessionId, reason: &PlaybackFailure);
    fn on_progress(&mut self, current: Duration, total: Option<Duration>);
    fn on_bitrate(&mut self, _indicated: f64, _observed: f64) {}
    fn on_interruption(&mut self, _phase: InterruptionPhase) {}
}

/// Receiving half of the facade's event stream
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<PlaybackEvent>,
}

impl EventStream {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<PlaybackEvent>) -> Self {
        Self { rx }
    }

    /// Next event; `None` once the facade has shut down and the stream drained
    pub async fn next(&mut self) -> Option<PlaybackEvent> {
        self.rx.recv().await
    }

    /// Next event if one is already queued
    pub fn try_next(&mut self) -> Option<PlaybackEvent> {
        self.rx.try_recv().ok()
    }

    /// Everything currently queued
    pub fn drain(&mut self) -> Vec<PlaybackEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Deliver events to `delegate` until the facade shuts down
    pub async fn forward_to<D: PlayerDelegate>(mut self, delegate: &mut D) {
        while let Some(event) = self.next().await {
            dispatch(delegate, &event);
        }
    }
}

/// Route one event to the matching delegate method
pub fn dispatch<D: PlayerDelegate + ?Sized>(delegate: &mut D, event: &PlaybackEvent) {
    match event {
        PlaybackEvent::Ready { session } => delegate.on_ready(*session),
        PlaybackEvent::Failed { session, reason } => delegate.on_failed(*session, reason),
        PlaybackEvent::ProgressTick { current, total } => delegate.on_progress(*current, *total),
        PlaybackEvent::BitrateSample { indicated, observed } => delegate.on_bitrate(*indicated, *observed),
        PlaybackEvent::Interrupted(phase) => delegate.on_interruption(*phase),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl PlayerDelegate for Recorder {
        fn on_ready(&mut self, _session: SessionId) {
            self.calls.push("ready".into());
        }

        fn on_failed(&mut self, _session: SessionId, reason: &PlaybackFailure) {
            self.calls.push(format!("failed:{}", reason.error_code()));
        }

        fn on_progress(&mut self, current: Duration, _total: Option<Duration>) {
            self.calls.push(format!("tick:{}", current.as_millis()));
        }
    }

    #[test]
    fn test_progress_fraction() {
        let tick = PlaybackEvent::ProgressTick {
            current: Duration::from_secs(30),
            total: Some(Duration::from_secs(120)),
        };
        assert_eq!(tick.progress_fraction(), Some(0.25));

        let live = PlaybackEvent::ProgressTick {
            current: Duration::from_secs(30),
            total: None,
        };
        assert_eq!(live.progress_fraction(), None);

        let overshoot = PlaybackEvent::ProgressTick {
            current: Duration::from_secs(200),
            total: Some(Duration::from_secs(120)),
        };
        assert_eq!(overshoot.progress_fraction(), Some(1.0));
    }

    #[tokio::test]
    async fn test_forward_to_delegate() {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = SessionId::new();
        tx.send(PlaybackEvent::Ready { session }).unwrap();
        tx.send(PlaybackEvent::ProgressTick {
            current: Duration::from_millis(500),
            total: Some(Duration::from_secs(10)),
        })
        .unwrap();
        tx.send(PlaybackEvent::Failed {
            session,
            reason: PlaybackFailure::AssetResolutionCancelled,
        })
        .unwrap();
        // Bitrate has a default no-op handler
        tx.send(PlaybackEvent::BitrateSample {
            indicated: 1.0,
            observed: 2.0,
        })
        .unwrap();
        drop(tx);

        let mut recorder = Recorder::default();
        EventStream::new(rx).forward_to(&mut recorder).await;
        assert_eq!(recorder.calls, vec!["ready", "tick:500", "failed:ASSET_CANCELLED"]);
    }
}
