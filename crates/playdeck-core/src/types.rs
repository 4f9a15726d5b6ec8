//! Core types for Playdeck

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Facade state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No session loaded
    Idle,
    /// Asset resolution or item preparation in flight
    Loading,
    /// Item reported ready to play
    Ready,
    /// Playback rate is non-zero
    Playing,
    /// Playback rate is zero
    Paused,
    /// Session ended in a terminal failure
    Failed,
}

impl PlaybackState {
    /// Check if transition to target state is valid within one session
    pub fn can_transition_to(&self, target: PlaybackState) -> bool {
        use PlaybackState::*;
        matches!(
            (self, target),
            // From Idle
            (Idle, Loading) |
            // From Loading
            (Loading, Ready) | (Loading, Failed) |
            // From Ready
            (Ready, Playing) | (Ready, Paused) | (Ready, Failed) |
            // From Playing
            (Playing, Paused) | (Playing, Failed) |
            // From Paused
            (Paused, Playing) | (Paused, Failed)
        )
    }

    /// Returns true once the item is ready and not failed
    pub fn is_active(&self) -> bool {
        matches!(self, PlaybackState::Ready | PlaybackState::Playing | PlaybackState::Paused)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Loading => write!(f, "loading"),
            PlaybackState::Ready => write!(f, "ready"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Failed => write!(f, "failed"),
        }
    }
}

/// Observable status of a native player item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    Unknown,
    ReadyToPlay,
    Failed(String),
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::Unknown => write!(f, "unknown"),
            ItemStatus::ReadyToPlay => write!(f, "readyToPlay"),
            ItemStatus::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Phase of a host audio interruption (phone call, alarm, other app)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptionPhase {
    Began,
    Ended,
}

/// One entry of a player item's access log
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccessLogEntry {
    /// Bitrate advertised by the selected variant, in bps
    pub indicated_bitrate: f64,
    /// Throughput measured while fetching media, in bps
    pub observed_bitrate: f64,
}

/// Allowed deviation around a seek target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeekTolerance {
    pub before: Duration,
    pub after: Duration,
}

impl SeekTolerance {
    /// Exact seek, never snapped to the nearest keyframe
    pub const ZERO: SeekTolerance = SeekTolerance {
        before: Duration::ZERO,
        after: Duration::ZERO,
    };
}

/// Bitrate bookkeeping for the current session
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BitrateStats {
    /// Most recent indicated bitrate from the access log, in bps
    pub indicated: f64,
    /// Most recent observed bitrate from the access log, in bps
    pub observed: f64,
    /// Cap handed to the native adaptive algorithm (0 = no cap)
    pub preferred_peak: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine() {
        assert!(PlaybackState::Idle.can_transition_to(PlaybackState::Loading));
        assert!(PlaybackState::Loading.can_transition_to(PlaybackState::Ready));
        assert!(PlaybackState::Loading.can_transition_to(PlaybackState::Failed));
        assert!(PlaybackState::Ready.can_transition_to(PlaybackState::Playing));
        assert!(PlaybackState::Playing.can_transition_to(PlaybackState::Paused));
        assert!(PlaybackState::Paused.can_transition_to(PlaybackState::Playing));

        // Failed is terminal for the session
        assert!(!PlaybackState::Failed.can_transition_to(PlaybackState::Playing));
        assert!(!PlaybackState::Failed.can_transition_to(PlaybackState::Ready));
        assert!(!PlaybackState::Loading.can_transition_to(PlaybackState::Playing));
        assert!(!PlaybackState::Idle.can_transition_to(PlaybackState::Playing));
    }

    #[test]
    fn test_active_states() {
        assert!(PlaybackState::Playing.is_active());
        assert!(PlaybackState::Paused.is_active());
        assert!(!PlaybackState::Loading.is_active());
        assert!(!PlaybackState::Failed.is_active());
    }
}
