//! Playhead Core - Adaptive Playback Controller
//!
//! This crate drives a video playback surface on behalf of a hosting screen:
//! - Transport state machine (loading, playing, seeking, buffering, ...)
//! - Gesture interpretation (zones, taps, drags, long-press) into intents
//! - Resume decisions from saved watch progress
//! - Periodic and teardown persistence of watch progress
//! - Audio/subtitle track selection
//! - Controls auto-hide and transient overlays
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Player Runtime                          │
//! │        (tokio task: commands, surface events, timers)           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐   intents   ┌──────────────┐   commands       │
//! │  │   Gesture    │ ──────────► │   Playback   │ ─────────► Surface│
//! │  │  Recognizer  │             │   Machine    │ ◄───────── events │
//! │  └──────────────┘             └──────┬───────┘                  │
//! │                                      │ state                    │
//! │  ┌──────────────┐  ┌──────────────┐  │  ┌──────────────┐        │
//! │  │   Controls   │  │   Overlays   │  └─►│ Persistence  │        │
//! │  │  Visibility  │  │              │     │  Scheduler   │        │
//! │  └──────────────┘  └──────────────┘     └──────┬───────┘        │
//! │                                                │                │
//! │  ┌──────────────┐                       ┌──────┴───────┐        │
//! │  │    Resume    │ ◄──────────────────── │   Progress   │        │
//! │  │   Decision   │                       │    Store     │        │
//! │  └──────────────┘                       └──────────────┘        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`PlaybackController`] is deterministic: every entry point takes the
//! current monotonic time and returns the [`Effect`]s to carry out.
//! [`runtime::PlayerRuntime`] hosts a controller on a tokio task with real
//! timers, a [`PlaybackSurface`] and a [`ProgressStore`].

pub mod config;
pub mod controller;
pub mod controls;
pub mod effects;
pub mod error;
pub mod gesture;
pub mod persistence;
pub mod playback;
pub mod resume;
pub mod runtime;
pub mod store;
pub mod surface;
pub mod timers;
pub mod tracks;
pub mod types;

pub use config::ControllerConfig;
pub use controller::PlaybackController;
pub use effects::{Effect, UiEvent};
pub use error::{Error, Result};
pub use gesture::{
    GestureRecognizer, GestureZone, Intent, OverlayKind, OverlayValue, PointerEvent,
    PointerPhase, Viewport,
};
pub use playback::{PlaybackMachine, PlaybackSession};
pub use resume::{PromptAnswer, PromptChoice, ResumeDecision};
pub use runtime::{PlayerHandle, PlayerRuntime};
pub use store::{KeyValueStore, MemoryStore, ProgressStore, ResumePreference, WatchProgress};
pub use surface::{PlaybackSurface, RecordingSurface, SurfaceCommand, SurfaceEvent};
pub use tracks::{language_display_name, track_label, TrackSelector};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the controller library
pub fn init() {
    tracing::info!(version = VERSION, "Playhead Core initialized");
}
