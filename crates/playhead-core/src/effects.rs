//! Effects produced by the controller
//!
//! The controller never performs I/O itself. Each entry point returns the
//! effects to carry out, in order, and the runtime executes them.

use crate::gesture::{OverlayKind, OverlayValue};
use crate::store::{ResumePreference, WatchProgress};
use crate::surface::SurfaceCommand;
use crate::types::{ContentKey, ResizeMode};
use serde::{Deserialize, Serialize};

/// A single side effect requested by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Command for the playback surface
    Surface(SurfaceCommand),
    /// Notification for the hosting UI
    Ui(UiEvent),
    /// Upsert watch progress
    SaveProgress {
        key: ContentKey,
        progress: WatchProgress,
    },
    /// Remember the user's resume choice
    SavePreference(ResumePreference),
}

/// Notifications for the hosting UI layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UiEvent {
    /// On-screen controls shown or hidden
    ControlsVisibility { visible: bool },
    /// Show (or refresh) a transient indicator
    ShowOverlay { kind: OverlayKind, value: OverlayValue },
    /// Remove a transient indicator
    HideOverlay { kind: OverlayKind },
    /// Ask whether to continue from a saved position
    ResumePrompt { saved_time: f64 },
    /// Close the resume prompt
    DismissResumePrompt,
    /// Screen brightness level for the host to apply
    BrightnessChanged { level: f64 },
    /// Resize mode for the video view
    ResizeModeChanged { mode: ResizeMode },
    /// Scrub preview position, `None` once the drag ends
    PreviewTime { time: Option<f64> },
    /// Fatal playback failure with a retry/back affordance
    PlaybackError { code: String, message: String },
}

/// Accumulates effects for one controller step
#[derive(Debug, Default)]
pub struct Effects {
    items: Vec<Effect>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surface(&mut self, command: SurfaceCommand) {
        self.items.push(Effect::Surface(command));
    }

    pub fn ui(&mut self, event: UiEvent) {
        self.items.push(Effect::Ui(event));
    }

    pub fn push(&mut self, effect: Effect) {
        self.items.push(effect);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Effect> {
        self.items
    }
}
