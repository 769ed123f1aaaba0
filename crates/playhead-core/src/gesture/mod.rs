//! Gesture interpretation
//!
//! Converts raw pointer events into discrete [`Intent`]s:
//! - Zone routing (left/center/right bands between chrome margins)
//! - Tap, double tap, long-press, horizontal and vertical drags
//! - An explicit per-zone priority table for competing recognizers
//! - Transient overlay feedback

pub mod overlay;
pub mod recognizer;
pub mod zone;

pub use overlay::{OverlayKind, OverlayValue, Overlays};
pub use recognizer::{
    scrub_range, zone_rules, DoubleTapAction, GestureContext, GestureKind, GestureRecognizer,
    VerticalAction, ZoneRules,
};
pub use zone::{GestureZone, Viewport};

use serde::{Deserialize, Serialize};

/// Phase of a single-pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// Raw pointer input in view coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub x: f64,
    pub y: f64,
}

impl PointerEvent {
    pub fn down(x: f64, y: f64) -> Self {
        Self { phase: PointerPhase::Down, x, y }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self { phase: PointerPhase::Move, x, y }
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self { phase: PointerPhase::Up, x, y }
    }

    pub fn cancel() -> Self {
        Self { phase: PointerPhase::Cancel, x: 0.0, y: 0.0 }
    }
}

/// High-level request produced by gestures or on-screen buttons
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", content = "value", rename_all = "snake_case")]
pub enum Intent {
    ToggleControls,
    TogglePlayback,
    /// Relative seek in seconds
    SeekBy(f64),
    /// Absolute seek in seconds
    SeekTo(f64),
    /// Scrub preview position; never reaches the surface
    PreviewSeek(f64),
    /// Scrub aborted without seeking
    CancelPreview,
    /// Running signed total of a skip sequence
    PreviewSkip(f64),
    VolumeDelta(f64),
    BrightnessDelta(f64),
    CycleResizeMode,
    SetRate(f64),
    /// Long-press speed boost started or released
    SpeedBoost(bool),
}
