//! Core types for Playhead

use serde::{Deserialize, Serialize};
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

/// Identity of a content item, stable across app restarts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentKey {
    pub content_id: String,
    pub episode_id: Option<String>,
}

impl ContentKey {
    pub fn new(content_id: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            episode_id: None,
        }
    }

    pub fn episode(content_id: impl Into<String>, episode_id: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            episode_id: Some(episode_id.into()),
        }
    }

    /// Key under which watch progress is stored
    pub fn storage_key(&self) -> String {
        format!(
            "watchProgress:{}:{}",
            self.content_id,
            self.episode_id.as_deref().unwrap_or("_")
        )
    }
}

impl std::fmt::Display for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.episode_id {
            Some(episode) => write!(f, "{}/{}", self.content_id, episode),
            None => write!(f, "{}", self.content_id),
        }
    }
}

/// Transport state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportState {
    /// No source requested yet
    Idle,
    /// Source handed to the surface, waiting for the load event
    Loading,
    /// Content is playing
    Playing,
    /// Playback paused
    Paused,
    /// Waiting for the surface to confirm a new position
    Seeking,
    /// Stalled waiting for data
    Buffering,
    /// Playback reached the end of content
    Ended,
    /// Fatal surface error
    Error,
}

impl TransportState {
    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: TransportState) -> bool {
        use TransportState::*;
        matches!(
            (self, target),
            // From Idle
            (Idle, Loading) | (Idle, Error) |
            // From Loading
            (Loading, Playing) | (Loading, Paused) | (Loading, Error) |
            // From Playing
            (Playing, Paused) | (Playing, Seeking) | (Playing, Buffering) | (Playing, Ended) | (Playing, Error) |
            // From Paused
            (Paused, Playing) | (Paused, Seeking) | (Paused, Ended) | (Paused, Error) |
            // From Seeking
            (Seeking, Playing) | (Seeking, Paused) | (Seeking, Ended) | (Seeking, Error) |
            // From Buffering
            (Buffering, Playing) | (Buffering, Paused) | (Buffering, Seeking) | (Buffering, Ended) | (Buffering, Error) |
            // Restart
            (Ended, Idle) | (Error, Idle)
        )
    }

    /// Ended and Error only leave through an explicit restart
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransportState::Ended | TransportState::Error)
    }

    /// Whether commands may be sent to the surface in this state
    pub fn accepts_intents(&self) -> bool {
        matches!(
            self,
            TransportState::Playing
                | TransportState::Paused
                | TransportState::Seeking
                | TransportState::Buffering
        )
    }
}

impl std::fmt::Display for TransportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportState::Idle => write!(f, "idle"),
            TransportState::Loading => write!(f, "loading"),
            TransportState::Playing => write!(f, "playing"),
            TransportState::Paused => write!(f, "paused"),
            TransportState::Seeking => write!(f, "seeking"),
            TransportState::Buffering => write!(f, "buffering"),
            TransportState::Ended => write!(f, "ended"),
            TransportState::Error => write!(f, "error"),
        }
    }
}

/// How the video frame is fitted into the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    #[default]
    Contain,
    Cover,
    Stretch,
}

impl ResizeMode {
    /// Next mode in the user-facing cycle
    pub fn next(self) -> Self {
        match self {
            ResizeMode::Contain => ResizeMode::Cover,
            ResizeMode::Cover => ResizeMode::Stretch,
            ResizeMode::Stretch => ResizeMode::Contain,
        }
    }
}

impl std::fmt::Display for ResizeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResizeMode::Contain => write!(f, "contain"),
            ResizeMode::Cover => write!(f, "cover"),
            ResizeMode::Stretch => write!(f, "stretch"),
        }
    }
}

/// Audio or text track as reported by the playback surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRef {
    /// Surface-assigned track index
    pub index: i32,
    /// Language code (ISO 639-1 or 639-2)
    pub language: Option<String>,
    /// Human-readable title
    pub title: Option<String>,
    /// Surface-specific track type (codec or mime)
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl TrackRef {
    pub fn new(index: i32) -> Self {
        Self {
            index,
            language: None,
            title: None,
            kind: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

/// Audio track selection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum AudioSelection {
    #[default]
    SystemDefault,
    Track(TrackRef),
}

/// Subtitle track selection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum SubtitleSelection {
    #[default]
    Disabled,
    Track(TrackRef),
}

/// Request from the hosting screen to open a stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRequest {
    /// Resolved stream location, opaque to the controller
    pub uri: String,
    pub content_id: String,
    pub episode_id: Option<String>,
    /// Load paused instead of starting playback
    pub start_paused: bool,
}

impl OpenRequest {
    pub fn new(uri: impl Into<String>, content_id: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            content_id: content_id.into(),
            episode_id: None,
            start_paused: false,
        }
    }

    pub fn with_episode(mut self, episode_id: impl Into<String>) -> Self {
        self.episode_id = Some(episode_id.into());
        self
    }

    pub fn with_start_paused(mut self, start_paused: bool) -> Self {
        self.start_paused = start_paused;
        self
    }

    pub fn key(&self) -> ContentKey {
        ContentKey {
            content_id: self.content_id.clone(),
            episode_id: self.episode_id.clone(),
        }
    }
}

/// Snapshot reported upward to the hosting screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub current_time: f64,
    pub duration: f64,
    pub transport_state: TransportState,
    pub buffered_ahead: f64,
    pub playback_rate: f64,
    pub resize_mode: ResizeMode,
    /// Scrub preview position while a drag is in progress
    pub preview_time: Option<f64>,
    pub controls_visible: bool,
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            duration: 0.0,
            transport_state: TransportState::Idle,
            buffered_ahead: 0.0,
            playback_rate: 1.0,
            resize_mode: ResizeMode::Contain,
            preview_time: None,
            controls_visible: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_layout() {
        assert_eq!(ContentKey::new("tt0133093").storage_key(), "watchProgress:tt0133093:_");
        assert_eq!(
            ContentKey::episode("tt0944947", "s01e03").storage_key(),
            "watchProgress:tt0944947:s01e03"
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(TransportState::Ended.is_terminal());
        assert!(TransportState::Error.is_terminal());
        assert!(!TransportState::Buffering.is_terminal());

        // Terminal states only leave through Idle
        assert!(!TransportState::Error.can_transition_to(TransportState::Playing));
        assert!(!TransportState::Ended.can_transition_to(TransportState::Playing));
        assert!(TransportState::Ended.can_transition_to(TransportState::Idle));
    }

    #[test]
    fn test_intents_gated_outside_active_states() {
        assert!(!TransportState::Idle.accepts_intents());
        assert!(!TransportState::Loading.accepts_intents());
        assert!(!TransportState::Error.accepts_intents());
        assert!(!TransportState::Ended.accepts_intents());
        assert!(TransportState::Seeking.accepts_intents());
    }

    #[test]
    fn test_resize_mode_cycle() {
        let mode = ResizeMode::default();
        assert_eq!(mode.next(), ResizeMode::Cover);
        assert_eq!(mode.next().next(), ResizeMode::Stretch);
        assert_eq!(mode.next().next().next(), ResizeMode::Contain);
    }

    #[test]
    fn test_track_ref_type_field() {
        let track = TrackRef::new(2).with_language("en").with_kind("audio/mp4a-latm");
        let json = serde_json::to_value(&track).unwrap();
        assert_eq!(json["type"], "audio/mp4a-latm");
        assert_eq!(json["index"], 2);
    }
}
