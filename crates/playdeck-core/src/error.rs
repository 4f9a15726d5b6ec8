//! Error types for Playdeck Core

use thiserror::Error;

/// Result type alias for facade operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned from fallible API calls
#[derive(Error, Debug)]
pub enum Error {
    // Input errors
    #[error("Invalid stream URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Session errors
    #[error("Invalid playback state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    // Manifest errors
    #[error("Failed to fetch manifest: {0}")]
    ManifestFetch(String),

    #[error("Failed to parse manifest: {0}")]
    ManifestParse(String),

    // Network errors
    #[cfg(feature = "headless")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    // Platform errors
    #[error("Audio session configuration failed: {0}")]
    AudioSession(String),

    #[error("Player facade has shut down")]
    FacadeClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the error code for logs and CLI output
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::InvalidStateTransition { .. } => "INVALID_STATE",
            Error::ManifestFetch(_) => "MANIFEST_FETCH",
            Error::ManifestParse(_) => "MANIFEST_PARSE",
            #[cfg(feature = "headless")]
            Error::Network(_) => "NETWORK",
            Error::AudioSession(_) => "AUDIO_SESSION",
            Error::FacadeClosed => "FACADE_CLOSED",
            Error::Io(_) => "IO",
        }
    }
}

/// Why a playback session ended without playing.
///
/// Every reportable failure is terminal for its session and surfaces as
/// exactly one `PlaybackEvent::Failed`. Nothing is retried; the caller decides
/// whether to load again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackFailure {
    #[error("Asset resolution failed: {0}")]
    AssetResolutionFailed(String),

    #[error("Asset resolution was cancelled")]
    AssetResolutionCancelled,

    #[error("Player item failed: {0}")]
    PlayerItemFailed(String),

    /// Native status `unknown`; transient, logged and ignored
    #[error("Player item status is unknown")]
    UnknownStatus,
}

impl PlaybackFailure {
    /// Returns true if this failure is delivered as a `Failed` event
    pub fn is_reportable(&self) -> bool {
        !matches!(self, PlaybackFailure::UnknownStatus)
    }

    /// Returns the failure code for logs and CLI output
    pub fn error_code(&self) -> &'static str {
        match self {
            PlaybackFailure::AssetResolutionFailed(_) => "ASSET_FAILED",
            PlaybackFailure::AssetResolutionCancelled => "ASSET_CANCELLED",
            PlaybackFailure::PlayerItemFailed(_) => "ITEM_FAILED",
            PlaybackFailure::UnknownStatus => "STATUS_UNKNOWN",
        }
    }
}
