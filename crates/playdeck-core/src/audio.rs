//! Host audio-session configuration
//!
//! The audio category is process-wide state. Hosts call
//! [`configure_audio_session`] once at startup, before any facade exists.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Audio session category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCategory {
    /// Silenced by the ring/silent switch
    Ambient,
    SoloAmbient,
    /// Keeps playing when the device is silenced
    Playback,
}

impl std::fmt::Display for AudioCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioCategory::Ambient => write!(f, "ambient"),
            AudioCategory::SoloAmbient => write!(f, "solo_ambient"),
            AudioCategory::Playback => write!(f, "playback"),
        }
    }
}

/// Audio session mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioMode {
    Default,
    MoviePlayback,
}

/// Category options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AudioSessionOptions {
    /// Let other apps' audio keep playing underneath
    pub mix_with_others: bool,
}

/// Audio session settings applied at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSessionConfig {
    pub category: AudioCategory,
    pub mode: AudioMode,
    pub mix_with_others: bool,
}

impl Default for AudioSessionConfig {
    fn default() -> Self {
        Self {
            category: AudioCategory::Playback,
            mode: AudioMode::MoviePlayback,
            mix_with_others: false,
        }
    }
}

/// Process-wide audio session of the host
pub trait AudioSession: Send + Sync {
    fn category(&self) -> AudioCategory;

    fn set_category(
        &self,
        category: AudioCategory,
        mode: AudioMode,
        options: AudioSessionOptions,
    ) -> std::result::Result<(), String>;
}

/// Apply `config` to the host audio session.
///
/// Skipped when the session already runs the requested category. Failure is
/// returned for the host to log; playback still works, only silent-switch
/// behavior differs.
pub fn configure_audio_session(session: &dyn AudioSession, config: &AudioSessionConfig) -> Result<()> {
    if session.category() == config.category {
        debug!(category = %config.category, "Audio session category already set");
        return Ok(());
    }

    let options = AudioSessionOptions {
        mix_with_others: config.mix_with_others,
    };
    session
        .set_category(config.category, config.mode, options)
        .map_err(Error::AudioSession)?;

    info!(
        category = %config.category,
        mode = ?config.mode,
        mix_with_others = config.mix_with_others,
        "Audio session configured"
    );
    Ok(())
}
