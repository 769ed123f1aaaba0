//! Error types for Playhead Core

use thiserror::Error;

/// Result type alias for controller operations
pub type Result<T> = std::result::Result<T, Error>;

/// Controller error types
#[derive(Error, Debug)]
pub enum Error {
    // Surface errors
    #[error("Failed to load source: {0}")]
    Load(String),

    #[error("Playback surface error: {0}")]
    Surface(String),

    #[error("Seek to {target:.3}s failed: {reason}")]
    Seek { target: f64, reason: String },

    // Track errors
    #[error("Track {index} is not available for {kind} selection")]
    TrackSelection { kind: &'static str, index: i32 },

    // Storage errors
    #[error("Failed to persist progress for {key}: {reason}")]
    Persistence { key: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // State errors
    #[error("Invalid transport state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Playback session is closed")]
    SessionClosed,

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Wrap a failure reported by an external key-value store
    pub fn storage(err: anyhow::Error) -> Self {
        Error::Storage(format!("{err:#}"))
    }

    /// Returns true if the controller recovers from this error locally
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Seek { .. }
                | Error::TrackSelection { .. }
                | Error::Persistence { .. }
                | Error::Storage(_)
                | Error::Serialization(_)
        )
    }

    /// Returns true if this error should be surfaced to the user
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Error::Load(_) | Error::Surface(_))
    }

    /// Returns the error code used in logs and UI events
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Load(_) => "LOAD",
            Error::Surface(_) => "SURFACE",
            Error::Seek { .. } => "SEEK",
            Error::TrackSelection { .. } => "TRACK_SELECTION",
            Error::Persistence { .. } => "PERSISTENCE",
            Error::Storage(_) => "STORAGE",
            Error::Serialization(_) => "SERIALIZATION",
            Error::InvalidStateTransition { .. } => "INVALID_STATE",
            Error::SessionClosed => "SESSION_CLOSED",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }
}
