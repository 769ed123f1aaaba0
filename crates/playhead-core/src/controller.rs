//! Playback controller
//!
//! Composes the state machine, gesture recognizer, overlays, controls
//! visibility and the persistence scheduler around one shared timer bag.
//! Every entry point:
//! 1. Fires timers that are due at `now`
//! 2. Handles its input
//! 3. Propagates transport changes to persistence and controls
//!
//! and returns the effects to execute, in order. Once closed the controller
//! ignores all input and emits nothing.

use crate::config::ControllerConfig;
use crate::controls::ControlsVisibility;
use crate::effects::{Effect, Effects, UiEvent};
use crate::gesture::{
    GestureContext, GestureRecognizer, Intent, OverlayKind, OverlayValue, Overlays, PointerEvent,
    PointerPhase, Viewport,
};
use crate::persistence::PersistenceScheduler;
use crate::playback::{PlaybackMachine, PlaybackSession};
use crate::resume::{self, PromptAnswer, ResumeDecision};
use crate::store::{ResumePreference, WatchProgress};
use crate::surface::SurfaceEvent;
use crate::timers::{TimerKind, Timers};
use crate::types::*;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Deterministic controller for one playback session
#[derive(Debug)]
pub struct PlaybackController {
    config: ControllerConfig,
    machine: PlaybackMachine,
    gestures: GestureRecognizer,
    overlays: Overlays,
    controls: ControlsVisibility,
    persistence: PersistenceScheduler,
    timers: Timers,
    preview_time: Option<f64>,
    last_state: TransportState,
    closed: bool,
}

impl PlaybackController {
    pub fn new(request: OpenRequest, config: ControllerConfig, viewport: Viewport) -> Self {
        Self {
            machine: PlaybackMachine::new(&request, &config),
            gestures: GestureRecognizer::new(&config, viewport),
            overlays: Overlays::new(config.overlay_dismiss()),
            controls: ControlsVisibility::new(config.controls_hide()),
            persistence: PersistenceScheduler::new(config.persist_interval()),
            timers: Timers::new(),
            preview_time: None,
            last_state: TransportState::Idle,
            closed: false,
            config,
        }
    }

    pub fn session(&self) -> &PlaybackSession {
        self.machine.session()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_prompting(&self) -> bool {
        self.machine.is_prompting()
    }

    pub fn controls_visible(&self) -> bool {
        self.controls.is_visible()
    }

    pub fn overlays(&self) -> &Overlays {
        &self.overlays
    }

    /// Earliest pending timer, for the host to wake up at
    pub fn next_deadline(&self) -> Option<Duration> {
        if self.closed {
            return None;
        }
        self.timers.next_deadline()
    }

    pub fn status(&self) -> PlaybackStatus {
        let session = self.machine.session();
        PlaybackStatus {
            current_time: session.current_time(),
            duration: session.duration(),
            transport_state: session.transport_state(),
            buffered_ahead: session.buffered_ahead(),
            playback_rate: session.playback_rate(),
            resize_mode: session.resize_mode(),
            preview_time: self.preview_time,
            controls_visible: self.controls.is_visible(),
        }
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Load the source; controls start visible
    pub fn open(&mut self, now: Duration) -> Vec<Effect> {
        self.step(now, |this, fx| {
            fx.ui(UiEvent::ControlsVisibility { visible: true });
            this.machine.start(fx);
        })
    }

    /// Apply the stored progress and preference once they have been read
    pub fn resolve_resume(
        &mut self,
        progress: Option<&WatchProgress>,
        preference: ResumePreference,
        now: Duration,
    ) -> Vec<Effect> {
        let decision = resume::decide(progress, preference, self.config.finished_threshold);
        info!(?decision, %preference, content = %self.machine.session().key(), "Resume decided");
        self.resolve_start(decision, now)
    }

    pub fn resolve_start(&mut self, decision: ResumeDecision, now: Duration) -> Vec<Effect> {
        self.step(now, |this, fx| {
            this.machine.resolve_start(decision, now, &mut this.timers, fx);
        })
    }

    pub fn answer_prompt(&mut self, answer: PromptAnswer, now: Duration) -> Vec<Effect> {
        self.step(now, |this, fx| {
            this.machine.answer_prompt(answer, now, &mut this.timers, fx);
        })
    }

    pub fn surface_event(&mut self, event: SurfaceEvent, now: Duration) -> Vec<Effect> {
        self.step(now, |this, fx| {
            let machine = &mut this.machine;
            let timers = &mut this.timers;
            match event {
                SurfaceEvent::Loaded { duration } => machine.on_loaded(duration, now, timers, fx),
                SurfaceEvent::Progress {
                    time,
                    playable_duration,
                    ..
                } => machine.on_progress(time, playable_duration, now, timers, fx),
                SurfaceEvent::Buffering { active } => machine.on_buffering(active),
                SurfaceEvent::SeekComplete { time } => machine.on_seek_complete(time, now, timers, fx),
                SurfaceEvent::Error { message } => machine.on_error(message, timers, fx),
                SurfaceEvent::AudioTracks { tracks } => machine.on_audio_tracks(tracks, fx),
                SurfaceEvent::TextTracks { tracks } => machine.on_text_tracks(tracks, fx),
                SurfaceEvent::Ended => machine.on_ended(timers),
            }
        })
    }

    /// Raw pointer input from the video area
    pub fn pointer(&mut self, event: PointerEvent, now: Duration) -> Vec<Effect> {
        self.step(now, |this, fx| {
            if event.phase == PointerPhase::Down {
                this.controls.touch(now, this.machine.state(), &mut this.timers);
            }
            let session = this.machine.session();
            let ctx = GestureContext {
                current_time: session.current_time(),
                duration: session.duration(),
            };
            let mut intents = Vec::new();
            this.gestures.handle(event, now, ctx, &mut this.timers, &mut intents);
            this.apply_intents(intents, now, fx);
        })
    }

    /// Intent from an on-screen button
    pub fn intent(&mut self, intent: Intent, now: Duration) -> Vec<Effect> {
        self.step(now, |this, fx| {
            if intent != Intent::ToggleControls {
                this.controls.show(now, this.machine.state(), &mut this.timers, fx);
            }
            this.apply_intent(intent, now, fx);
        })
    }

    pub fn select_audio(&mut self, selection: AudioSelection, now: Duration) -> Vec<Effect> {
        self.step(now, |this, fx| {
            this.machine.select_audio(selection, fx);
        })
    }

    pub fn select_subtitle(&mut self, selection: SubtitleSelection, now: Duration) -> Vec<Effect> {
        self.step(now, |this, fx| {
            this.machine.select_subtitle(selection, fx);
        })
    }

    /// The video view changed size; in-progress gestures are dropped
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if self.closed {
            return;
        }
        self.gestures.set_viewport(viewport);
        self.gestures.reset(&mut self.timers);
    }

    /// The host app moved to the background
    ///
    /// Playback pauses and progress is saved right away.
    pub fn enter_background(&mut self, now: Duration) -> Vec<Effect> {
        self.step(now, |this, fx| {
            this.gestures.reset(&mut this.timers);
            this.machine.pause(fx);
            this.persistence.save_now(this.machine.session(), fx);
        })
    }

    /// Fire every timer due at `now`
    pub fn advance(&mut self, now: Duration) -> Vec<Effect> {
        self.step(now, |_, _| {})
    }

    /// Reload after Ended or Error (the error screen's retry)
    pub fn restart(&mut self, now: Duration) -> Vec<Effect> {
        self.step(now, |this, fx| {
            if this.machine.restart(&mut this.timers, fx) {
                this.gestures.reset(&mut this.timers);
                this.clear_preview(fx);
            }
        })
    }

    /// Tear the session down
    ///
    /// Cancels every pending timer and emits the final progress save. Any
    /// later call is a no-op.
    #[instrument(skip(self), fields(session_id = %self.machine.session().id()))]
    pub fn close(&mut self, now: Duration) -> Vec<Effect> {
        if self.closed {
            return Vec::new();
        }
        let mut fx = Effects::new();
        self.persistence
            .final_save(self.machine.session(), &mut self.timers, &mut fx);
        let cancelled = self.timers.cancel_all();
        self.overlays.clear();
        self.closed = true;
        info!(
            cancelled_timers = cancelled,
            saves = self.persistence.saves(),
            position = self.machine.session().current_time(),
            "Session closed"
        );
        fx.into_vec()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn step(&mut self, now: Duration, f: impl FnOnce(&mut Self, &mut Effects)) -> Vec<Effect> {
        if self.closed {
            debug!("Input after close ignored");
            return Vec::new();
        }
        let mut fx = Effects::new();
        self.fire_due(now, &mut fx);
        f(self, &mut fx);
        self.sync_transport(now, &mut fx);
        fx.into_vec()
    }

    fn fire_due(&mut self, now: Duration, fx: &mut Effects) {
        // Handlers run at their own deadline so rescheduled timers keep cadence
        while let Some(at) = self.timers.next_deadline().filter(|at| *at <= now) {
            let Some(kind) = self.timers.pop_due(now) else {
                break;
            };
            self.on_timer(kind, at, fx);
            self.sync_transport(at, fx);
        }
    }

    fn on_timer(&mut self, kind: TimerKind, now: Duration, fx: &mut Effects) {
        match kind {
            TimerKind::DoubleTapWindow | TimerKind::LongPress | TimerKind::SkipDecay => {
                let mut intents = Vec::new();
                self.gestures.on_timer(kind, &mut intents);
                self.apply_intents(intents, now, fx);
            }
            TimerKind::ControlsHide => {
                self.controls
                    .on_hide_timer(self.machine.state(), &mut self.timers, fx);
            }
            TimerKind::Overlay(overlay) => self.overlays.expire(overlay, fx),
            TimerKind::PersistTick => {
                self.persistence
                    .on_tick(self.machine.session(), now, &mut self.timers, fx);
            }
            TimerKind::ResumePromptTimeout => {
                self.machine.on_prompt_timeout(now, &mut self.timers, fx);
            }
            TimerKind::SeekSettle => self.machine.on_seek_settled(),
            TimerKind::SeekTimeout => self.machine.on_seek_timeout(now, &mut self.timers, fx),
        }
    }

    fn sync_transport(&mut self, now: Duration, fx: &mut Effects) {
        let state = self.machine.state();
        if state == self.last_state {
            return;
        }
        let previous = std::mem::replace(&mut self.last_state, state);
        self.persistence
            .on_transport_change(previous, state, now, &mut self.timers);
        self.controls
            .on_transport_change(now, state, &mut self.timers, fx);
        if state.is_terminal() {
            self.gestures.reset(&mut self.timers);
            self.clear_preview(fx);
        }
    }

    fn apply_intents(&mut self, intents: Vec<Intent>, now: Duration, fx: &mut Effects) {
        for intent in intents {
            self.apply_intent(intent, now, fx);
        }
    }

    fn apply_intent(&mut self, intent: Intent, now: Duration, fx: &mut Effects) {
        debug!(?intent, "Applying intent");
        match intent {
            Intent::ToggleControls => {
                self.controls
                    .toggle(now, self.machine.state(), &mut self.timers, fx);
            }
            Intent::TogglePlayback => self.machine.toggle_playback(fx),
            Intent::SeekBy(delta) => {
                let target = self.machine.session().current_time() + delta;
                self.seek_to(target, now, fx);
            }
            Intent::SeekTo(target) => self.seek_to(target, now, fx),
            Intent::PreviewSeek(time) => {
                let time = self.machine.clamp_seek(time);
                self.preview_time = Some(time);
                fx.ui(UiEvent::PreviewTime { time: Some(time) });
                self.overlays.show(
                    OverlayKind::SeekPreview,
                    OverlayValue::Time(time),
                    now,
                    &mut self.timers,
                    fx,
                );
            }
            Intent::CancelPreview => self.clear_preview(fx),
            Intent::PreviewSkip(total) => {
                let kind = if total >= 0.0 {
                    OverlayKind::SkipForward
                } else {
                    OverlayKind::SkipBackward
                };
                self.overlays.show(
                    kind,
                    OverlayValue::Seconds(total.abs()),
                    now,
                    &mut self.timers,
                    fx,
                );
            }
            Intent::VolumeDelta(delta) => {
                if let Some(level) = self.machine.adjust_volume(delta, fx) {
                    self.overlays.show(
                        OverlayKind::Volume,
                        OverlayValue::Level(level),
                        now,
                        &mut self.timers,
                        fx,
                    );
                }
            }
            Intent::BrightnessDelta(delta) => {
                let level = self.machine.adjust_brightness(delta);
                fx.ui(UiEvent::BrightnessChanged { level });
                self.overlays.show(
                    OverlayKind::Brightness,
                    OverlayValue::Level(level),
                    now,
                    &mut self.timers,
                    fx,
                );
            }
            Intent::CycleResizeMode => {
                let mode = self.machine.cycle_resize_mode();
                fx.ui(UiEvent::ResizeModeChanged { mode });
                self.overlays.show(
                    OverlayKind::ResizeMode,
                    OverlayValue::Resize(mode),
                    now,
                    &mut self.timers,
                    fx,
                );
            }
            Intent::SetRate(rate) => {
                let before = self.machine.session().playback_rate();
                self.machine.set_rate(rate, fx);
                let after = self.machine.session().playback_rate();
                if after != before {
                    self.overlays.show(
                        OverlayKind::Speed,
                        OverlayValue::Rate(after),
                        now,
                        &mut self.timers,
                        fx,
                    );
                }
            }
            Intent::SpeedBoost(active) => {
                if let Some(rate) = self.machine.speed_boost(active, fx) {
                    if active {
                        self.overlays.show(
                            OverlayKind::Speed,
                            OverlayValue::Rate(rate),
                            now,
                            &mut self.timers,
                            fx,
                        );
                    } else {
                        self.overlays.hide(OverlayKind::Speed, &mut self.timers, fx);
                    }
                }
            }
        }
    }

    fn seek_to(&mut self, target: f64, now: Duration, fx: &mut Effects) {
        self.clear_preview(fx);
        self.machine.request_seek(target, now, &mut self.timers, fx);
    }

    fn clear_preview(&mut self, fx: &mut Effects) {
        if self.preview_time.take().is_some() {
            fx.ui(UiEvent::PreviewTime { time: None });
            self.overlays
                .hide(OverlayKind::SeekPreview, &mut self.timers, fx);
        }
    }
}
