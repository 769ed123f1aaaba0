//! Playback state machine
//!
//! Owns the [`PlaybackSession`] and is the only code that mutates it.
//! Handles:
//! - Transport transitions and their validation
//! - Buffering of the resume decision until the surface has loaded
//! - Seeks with a single in-flight target, settle delay and timeout
//! - Track, volume, rate and resize requests
//!
//! Intents arriving while the surface is not ready (Idle, Loading) or after
//! a terminal state (Ended, Error) are discarded, never queued.

use crate::config::ControllerConfig;
use crate::effects::{Effect, Effects, UiEvent};
use crate::resume::{PromptAnswer, ResumeDecision};
use crate::surface::SurfaceCommand;
use crate::timers::{TimerKind, Timers};
use crate::tracks::TrackSelector;
use crate::types::*;
use crate::Error;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const MIN_RATE: f64 = 0.25;
const MAX_RATE: f64 = 4.0;

/// State of one opened content item
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    id: SessionId,
    key: ContentKey,
    source_uri: String,
    current_time: f64,
    duration: f64,
    buffered_ahead: f64,
    transport_state: TransportState,
    playback_rate: f64,
    resize_mode: ResizeMode,
    selected_audio: AudioSelection,
    selected_subtitle: SubtitleSelection,
    volume: f64,
    brightness: f64,
}

impl PlaybackSession {
    fn new(request: &OpenRequest) -> Self {
        Self {
            id: SessionId::new(),
            key: request.key(),
            source_uri: request.uri.clone(),
            current_time: 0.0,
            duration: 0.0,
            buffered_ahead: 0.0,
            transport_state: TransportState::Idle,
            playback_rate: 1.0,
            resize_mode: ResizeMode::default(),
            selected_audio: AudioSelection::SystemDefault,
            selected_subtitle: SubtitleSelection::Disabled,
            volume: 1.0,
            brightness: 0.5,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn key(&self) -> &ContentKey {
        &self.key
    }

    pub fn source_uri(&self) -> &str {
        &self.source_uri
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn buffered_ahead(&self) -> f64 {
        self.buffered_ahead
    }

    pub fn transport_state(&self) -> TransportState {
        self.transport_state
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    pub fn resize_mode(&self) -> ResizeMode {
        self.resize_mode
    }

    pub fn selected_audio(&self) -> &AudioSelection {
        &self.selected_audio
    }

    pub fn selected_subtitle(&self) -> &SubtitleSelection {
        &self.selected_subtitle
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn brightness(&self) -> f64 {
        self.brightness
    }
}

/// The single in-flight seek
#[derive(Debug, Clone, Copy)]
struct SeekState {
    target: f64,
    /// Play/pause intent to restore once the seek lands
    resume_playing: bool,
    /// Reported positions are trusted only after the settle delay
    settled: bool,
    /// Latest target requested while this seek was in flight
    pending: Option<f64>,
}

/// Progress of the start decision handshake
#[derive(Debug, Clone, Copy, PartialEq)]
enum StartGate {
    Undecided,
    Decided(ResumeDecision),
    Prompting { saved_time: f64 },
    Started,
}

/// Transport state machine for one session
#[derive(Debug)]
pub struct PlaybackMachine {
    session: PlaybackSession,
    config: ControllerConfig,
    start_paused: bool,
    surface_ready: bool,
    /// Last paused flag sent to the surface
    surface_paused: Option<bool>,
    gate: StartGate,
    seek: Option<SeekState>,
    /// Whether playback should run once a stall clears
    play_intent: bool,
    /// Rate to restore when a speed boost ends
    boost_restore: Option<f64>,
    tracks: TrackSelector,
    /// The user picked a track; preferred languages no longer apply
    audio_chosen: bool,
    subtitle_chosen: bool,
}

impl PlaybackMachine {
    pub fn new(request: &OpenRequest, config: &ControllerConfig) -> Self {
        Self {
            session: PlaybackSession::new(request),
            config: config.clone(),
            start_paused: request.start_paused,
            surface_ready: false,
            surface_paused: None,
            gate: StartGate::Undecided,
            seek: None,
            play_intent: !request.start_paused,
            boost_restore: None,
            tracks: TrackSelector::new(
                config.preferred_audio_language.clone(),
                config.preferred_subtitle_language.clone(),
            ),
            audio_chosen: false,
            subtitle_chosen: false,
        }
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn state(&self) -> TransportState {
        self.session.transport_state
    }

    pub fn tracks(&self) -> &TrackSelector {
        &self.tracks
    }

    /// Whether the resume prompt is waiting for an answer
    pub fn is_prompting(&self) -> bool {
        matches!(self.gate, StartGate::Prompting { .. })
    }

    /// Target of the seek awaiting confirmation
    pub fn seek_in_flight(&self) -> Option<f64> {
        self.seek.map(|seek| seek.target)
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Hand the source to the surface
    pub fn start(&mut self, fx: &mut Effects) {
        if self.state() != TransportState::Idle {
            warn!(state = %self.state(), "Session already started");
            return;
        }
        if !self.transition(TransportState::Loading) {
            return;
        }
        self.surface_ready = false;
        self.surface_paused = None;
        self.tracks.clear();
        info!(
            session_id = %self.session.id,
            content = %self.session.key,
            "Loading source"
        );
        fx.surface(SurfaceCommand::Load {
            uri: self.session.source_uri.clone(),
        });
    }

    /// Reload after Ended or Error
    ///
    /// After an error playback continues where it failed; after the end it
    /// starts over.
    pub fn restart(&mut self, timers: &mut Timers, fx: &mut Effects) -> bool {
        let from = self.state();
        if !from.is_terminal() {
            debug!(state = %from, "Restart ignored outside a terminal state");
            return false;
        }

        let resume_from = if from == TransportState::Error {
            self.session.current_time
        } else {
            0.0
        };
        self.clear_seek(timers);
        timers.cancel(TimerKind::ResumePromptTimeout);
        self.boost_restore = None;
        self.session.playback_rate = 1.0;
        self.session.buffered_ahead = 0.0;
        self.session.current_time = 0.0;
        self.gate = StartGate::Decided(ResumeDecision::StartAt(resume_from));

        self.transition(TransportState::Idle);
        self.start(fx);
        true
    }

    /// Resume decision resolved by the store lookup
    ///
    /// Applied at most once: immediately when the surface has already
    /// loaded, otherwise on the first load event.
    pub fn resolve_start(
        &mut self,
        decision: ResumeDecision,
        now: Duration,
        timers: &mut Timers,
        fx: &mut Effects,
    ) {
        if self.gate != StartGate::Undecided {
            debug!(?decision, "Start decision already resolved, ignoring");
            return;
        }
        debug!(?decision, surface_ready = self.surface_ready, "Start decision resolved");
        self.gate = StartGate::Decided(decision);
        if self.surface_ready && self.state().accepts_intents() {
            self.apply_start(now, timers, fx);
        }
    }

    /// Answer to the resume prompt
    pub fn answer_prompt(
        &mut self,
        answer: PromptAnswer,
        now: Duration,
        timers: &mut Timers,
        fx: &mut Effects,
    ) -> bool {
        let StartGate::Prompting { saved_time } = self.gate else {
            debug!("No resume prompt pending");
            return false;
        };
        timers.cancel(TimerKind::ResumePromptTimeout);
        fx.ui(UiEvent::DismissResumePrompt);
        self.gate = StartGate::Started;

        // The remembered choice is stored before it takes effect
        if let Some(preference) = answer.remembered_preference() {
            fx.push(Effect::SavePreference(preference));
        }

        let start_time = answer.start_time(saved_time);
        info!(choice = ?answer.choice, start_time, "Resume prompt answered");
        self.begin_at(start_time, now, timers, fx);
        true
    }

    /// Unanswered prompt auto-dismisses and continues from the saved position
    pub fn on_prompt_timeout(&mut self, now: Duration, timers: &mut Timers, fx: &mut Effects) {
        if self.is_prompting() {
            info!("Resume prompt timed out");
            self.answer_prompt(PromptAnswer::resume(), now, timers, fx);
        }
    }

    fn apply_start(&mut self, now: Duration, timers: &mut Timers, fx: &mut Effects) {
        let StartGate::Decided(decision) = self.gate else {
            return;
        };

        match decision {
            ResumeDecision::StartAt(time) => {
                self.gate = StartGate::Started;
                self.begin_at(time, now, timers, fx);
            }
            ResumeDecision::PromptResume(saved_time) => {
                self.gate = StartGate::Prompting { saved_time };
                self.clear_seek(timers);
                self.enter_ready(false, fx);
                timers.schedule(
                    TimerKind::ResumePromptTimeout,
                    now + self.config.resume_prompt_timeout(),
                );
                fx.ui(UiEvent::ResumePrompt { saved_time });
            }
        }
    }

    fn begin_at(&mut self, time: f64, now: Duration, timers: &mut Timers, fx: &mut Effects) {
        let playing = !self.start_paused;
        if time > 0.0 {
            if !self.state().accepts_intents() {
                self.enter_ready(playing, fx);
            }
            self.seek_with(time, playing, now, timers, fx);
        } else {
            self.enter_ready(playing, fx);
        }
    }

    /// Move to Playing or Paused and sync the surface
    fn enter_ready(&mut self, playing: bool, fx: &mut Effects) {
        let target = if playing {
            TransportState::Playing
        } else {
            TransportState::Paused
        };
        if self.transition(target) {
            self.play_intent = playing;
            self.command_paused(!playing, fx);
        }
    }

    // =========================================================================
    // Surface events
    // =========================================================================

    pub fn on_loaded(&mut self, duration: f64, now: Duration, timers: &mut Timers, fx: &mut Effects) {
        self.session.duration = duration.max(0.0);

        if self.state() != TransportState::Loading {
            debug!(duration, state = %self.state(), "Duration updated");
            return;
        }

        self.surface_ready = true;
        info!(duration, session_id = %self.session.id, "Source loaded");

        match self.gate {
            StartGate::Decided(_) => self.apply_start(now, timers, fx),
            _ => {
                debug!("Loaded before the start decision, holding paused");
                self.enter_ready(false, fx);
            }
        }
        self.push_track_selection(fx);
    }

    pub fn on_progress(
        &mut self,
        time: f64,
        playable_duration: f64,
        now: Duration,
        timers: &mut Timers,
        fx: &mut Effects,
    ) {
        self.session.buffered_ahead = (playable_duration - time).max(0.0);

        match self.state() {
            TransportState::Seeking => {
                if let Some(seek) = self.seek {
                    let landed = (time - seek.target).abs() <= self.config.seek_tolerance_secs;
                    if seek.settled && landed {
                        self.session.current_time = time;
                        self.confirm_seek(now, timers, fx);
                    }
                }
                return;
            }
            TransportState::Playing | TransportState::Paused | TransportState::Buffering => {
                let current = self.session.current_time;
                // Small backward steps are reporting jitter
                if time >= current || current - time > self.config.seek_tolerance_secs {
                    self.session.current_time = time.max(0.0);
                }
            }
            _ => return,
        }

        if self.state() == TransportState::Buffering
            && self.session.buffered_ahead >= self.config.min_lookahead_secs
        {
            self.leave_stall();
        }

        if self.session.duration > 0.0 && time >= self.session.duration {
            self.on_ended(timers);
        }
    }

    pub fn on_buffering(&mut self, active: bool) {
        match (active, self.state()) {
            (true, TransportState::Playing) => {
                if self.session.buffered_ahead < self.config.min_lookahead_secs {
                    self.play_intent = true;
                    self.transition(TransportState::Buffering);
                }
            }
            (false, TransportState::Buffering) => self.leave_stall(),
            _ => {}
        }
    }

    pub fn on_seek_complete(&mut self, time: f64, now: Duration, timers: &mut Timers, fx: &mut Effects) {
        if self.state() != TransportState::Seeking {
            debug!(time, "Seek completion outside Seeking");
            return;
        }
        self.session.current_time = time.max(0.0);
        self.confirm_seek(now, timers, fx);
    }

    pub fn on_error(&mut self, message: String, timers: &mut Timers, fx: &mut Effects) {
        let state = self.state();
        if state.is_terminal() {
            debug!(message = %message, "Surface error after terminal state");
            return;
        }

        let err = if matches!(state, TransportState::Idle | TransportState::Loading) {
            Error::Load(message)
        } else {
            Error::Surface(message)
        };
        error!(code = err.error_code(), error = %err, session_id = %self.session.id, "Playback failed");

        self.clear_seek(timers);
        if self.is_prompting() {
            timers.cancel(TimerKind::ResumePromptTimeout);
            fx.ui(UiEvent::DismissResumePrompt);
            self.gate = StartGate::Started;
        }
        self.transition(TransportState::Error);
        fx.ui(UiEvent::PlaybackError {
            code: err.error_code().to_string(),
            message: err.to_string(),
        });
    }

    pub fn on_ended(&mut self, timers: &mut Timers) {
        if matches!(
            self.state(),
            TransportState::Playing
                | TransportState::Paused
                | TransportState::Buffering
                | TransportState::Seeking
        ) {
            self.clear_seek(timers);
            if self.session.duration > 0.0 {
                self.session.current_time = self.session.duration;
            }
            self.transition(TransportState::Ended);
        }
    }

    pub fn on_audio_tracks(&mut self, tracks: Vec<TrackRef>, fx: &mut Effects) {
        debug!(count = tracks.len(), "Audio tracks reported");
        self.tracks.set_audio_tracks(tracks);

        let mut resolved = self.tracks.resolve_audio(&self.session.selected_audio);
        if resolved == AudioSelection::SystemDefault && !self.audio_chosen {
            if let Some(preferred) = self.tracks.preferred_audio() {
                resolved = AudioSelection::Track(preferred.clone());
            }
        }
        self.store_audio(resolved, fx);
    }

    pub fn on_text_tracks(&mut self, tracks: Vec<TrackRef>, fx: &mut Effects) {
        debug!(count = tracks.len(), "Text tracks reported");
        self.tracks.set_subtitle_tracks(tracks);

        let mut resolved = self.tracks.resolve_subtitle(&self.session.selected_subtitle);
        if resolved == SubtitleSelection::Disabled && !self.subtitle_chosen {
            if let Some(preferred) = self.tracks.preferred_subtitle() {
                resolved = SubtitleSelection::Track(preferred.clone());
            }
        }
        self.store_subtitle(resolved, fx);
    }

    // =========================================================================
    // Timers
    // =========================================================================

    pub fn on_seek_settled(&mut self) {
        if let Some(seek) = self.seek.as_mut() {
            seek.settled = true;
        }
    }

    pub fn on_seek_timeout(&mut self, now: Duration, timers: &mut Timers, fx: &mut Effects) {
        let Some(seek) = self.seek.take() else {
            return;
        };
        timers.cancel(TimerKind::SeekSettle);

        let err = Error::Seek {
            target: seek.target,
            reason: "not confirmed by the surface".into(),
        };
        warn!(code = err.error_code(), error = %err, "Seek failed, restoring transport state");

        match seek.pending {
            Some(next) => self.issue_seek(next, seek.resume_playing, now, timers, fx),
            None => self.finish_seek(seek.resume_playing, fx),
        }
    }

    // =========================================================================
    // Intents
    // =========================================================================

    pub fn toggle_playback(&mut self, fx: &mut Effects) {
        if !self.accepts_transport_intent("toggle_playback") {
            return;
        }
        match self.state() {
            TransportState::Playing => {
                self.transition(TransportState::Paused);
                self.play_intent = false;
                self.command_paused(true, fx);
            }
            TransportState::Paused => {
                self.transition(TransportState::Playing);
                self.play_intent = true;
                self.command_paused(false, fx);
            }
            TransportState::Seeking => {
                if let Some(seek) = self.seek.as_mut() {
                    seek.resume_playing = !seek.resume_playing;
                    let paused = !seek.resume_playing;
                    self.command_paused(paused, fx);
                }
            }
            TransportState::Buffering => {
                self.play_intent = !self.play_intent;
                self.command_paused(!self.play_intent, fx);
            }
            _ => {}
        }
    }

    /// Stop playback whatever the transport is doing
    ///
    /// A seek or stall in progress lands paused instead of resuming.
    pub fn pause(&mut self, fx: &mut Effects) {
        if !self.accepts_surface_intent("pause") {
            return;
        }
        match self.state() {
            TransportState::Playing => {
                self.transition(TransportState::Paused);
                self.play_intent = false;
            }
            TransportState::Seeking => {
                if let Some(seek) = self.seek.as_mut() {
                    seek.resume_playing = false;
                }
            }
            TransportState::Buffering => self.play_intent = false,
            _ => {}
        }
        self.command_paused(true, fx);
    }

    /// Seek to an absolute position
    pub fn request_seek(&mut self, target: f64, now: Duration, timers: &mut Timers, fx: &mut Effects) {
        if !self.accepts_transport_intent("seek") {
            return;
        }
        let resume_playing = match self.state() {
            TransportState::Playing => true,
            TransportState::Seeking => self.seek.map_or(self.play_intent, |seek| seek.resume_playing),
            _ => self.play_intent && self.state() == TransportState::Buffering,
        };
        self.seek_with(target, resume_playing, now, timers, fx);
    }

    /// Clamp a seek target into `[0, duration - epsilon]`
    pub fn clamp_seek(&self, target: f64) -> f64 {
        if target.is_nan() {
            return 0.0;
        }
        let upper = if self.session.duration > 0.0 {
            (self.session.duration - self.config.end_epsilon_secs).max(0.0)
        } else {
            f64::MAX
        };
        target.clamp(0.0, upper)
    }

    pub fn set_rate(&mut self, rate: f64, fx: &mut Effects) {
        if !self.accepts_transport_intent("set_rate") {
            return;
        }
        let rate = rate.clamp(MIN_RATE, MAX_RATE);
        if self.boost_restore.is_some() {
            // Takes effect when the boost is released
            self.boost_restore = Some(rate);
            return;
        }
        self.session.playback_rate = rate;
        fx.surface(SurfaceCommand::SetRate { rate });
    }

    /// Start or end a temporary speed boost, returning the rate now in effect
    pub fn speed_boost(&mut self, active: bool, fx: &mut Effects) -> Option<f64> {
        if !self.session.transport_state.accepts_intents() {
            self.boost_restore = None;
            return None;
        }
        let rate = match (active, self.boost_restore) {
            (true, None) => {
                self.boost_restore = Some(self.session.playback_rate);
                self.config.speed_boost_rate
            }
            (false, Some(previous)) => {
                self.boost_restore = None;
                previous
            }
            _ => return None,
        };
        self.session.playback_rate = rate;
        fx.surface(SurfaceCommand::SetRate { rate });
        Some(rate)
    }

    /// Apply a volume change, returning the new level
    pub fn adjust_volume(&mut self, delta: f64, fx: &mut Effects) -> Option<f64> {
        if !self.accepts_surface_intent("volume") {
            return None;
        }
        let level = (self.session.volume + delta).clamp(0.0, 1.0);
        if level != self.session.volume {
            self.session.volume = level;
            fx.surface(SurfaceCommand::SetVolume { level });
        }
        Some(level)
    }

    /// Apply a brightness change, returning the new level
    pub fn adjust_brightness(&mut self, delta: f64) -> f64 {
        self.session.brightness = (self.session.brightness + delta).clamp(0.0, 1.0);
        self.session.brightness
    }

    pub fn cycle_resize_mode(&mut self) -> ResizeMode {
        self.session.resize_mode = self.session.resize_mode.next();
        self.session.resize_mode
    }

    /// Select an audio track; repeated selections are no-ops
    pub fn select_audio(&mut self, selection: AudioSelection, fx: &mut Effects) -> bool {
        if !self.accepts_surface_intent("select_audio") {
            return false;
        }
        self.audio_chosen = true;
        let resolved = self.tracks.resolve_audio(&selection);
        self.store_audio(resolved, fx)
    }

    /// Select a subtitle track; repeated selections are no-ops
    pub fn select_subtitle(&mut self, selection: SubtitleSelection, fx: &mut Effects) -> bool {
        if !self.accepts_surface_intent("select_subtitle") {
            return false;
        }
        self.subtitle_chosen = true;
        let resolved = self.tracks.resolve_subtitle(&selection);
        self.store_subtitle(resolved, fx)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn seek_with(
        &mut self,
        target: f64,
        resume_playing: bool,
        now: Duration,
        timers: &mut Timers,
        fx: &mut Effects,
    ) {
        let target = self.clamp_seek(target);

        if let Some(seek) = self.seek.as_mut() {
            // One surface seek at a time: the newest target waits its turn
            seek.resume_playing = resume_playing;
            if seek.pending.is_none() && seek.target == target {
                return;
            }
            debug!(in_flight = seek.target, next = target, "Superseding in-flight seek");
            seek.pending = Some(target);
            self.session.current_time = target;
            return;
        }

        if self.transition(TransportState::Seeking) {
            self.issue_seek(target, resume_playing, now, timers, fx);
        }
    }

    fn issue_seek(
        &mut self,
        target: f64,
        resume_playing: bool,
        now: Duration,
        timers: &mut Timers,
        fx: &mut Effects,
    ) {
        info!(from = self.session.current_time, to = target, "Seeking");
        self.seek = Some(SeekState {
            target,
            resume_playing,
            settled: false,
            pending: None,
        });
        self.session.current_time = target;
        timers.schedule(TimerKind::SeekSettle, now + self.config.seek_settle());
        timers.schedule(TimerKind::SeekTimeout, now + self.config.seek_timeout());
        fx.surface(SurfaceCommand::Seek { time: target });
    }

    fn confirm_seek(&mut self, now: Duration, timers: &mut Timers, fx: &mut Effects) {
        let Some(seek) = self.seek.take() else {
            return;
        };
        timers.cancel(TimerKind::SeekSettle);
        timers.cancel(TimerKind::SeekTimeout);

        match seek.pending {
            Some(next) if next != seek.target => {
                self.issue_seek(next, seek.resume_playing, now, timers, fx);
            }
            _ => {
                debug!(target = seek.target, "Seek confirmed");
                self.finish_seek(seek.resume_playing, fx);
            }
        }
    }

    fn finish_seek(&mut self, resume_playing: bool, fx: &mut Effects) {
        self.enter_ready(resume_playing, fx);
    }

    fn clear_seek(&mut self, timers: &mut Timers) {
        self.seek = None;
        timers.cancel(TimerKind::SeekSettle);
        timers.cancel(TimerKind::SeekTimeout);
    }

    fn leave_stall(&mut self) {
        let target = if self.play_intent {
            TransportState::Playing
        } else {
            TransportState::Paused
        };
        self.transition(target);
    }

    fn store_audio(&mut self, resolved: AudioSelection, fx: &mut Effects) -> bool {
        if resolved == self.session.selected_audio {
            return false;
        }
        self.session.selected_audio = resolved.clone();
        if self.state().accepts_intents() {
            fx.surface(SurfaceCommand::SelectAudioTrack { selection: resolved });
        }
        true
    }

    fn store_subtitle(&mut self, resolved: SubtitleSelection, fx: &mut Effects) -> bool {
        if resolved == self.session.selected_subtitle {
            return false;
        }
        self.session.selected_subtitle = resolved.clone();
        if self.state().accepts_intents() {
            fx.surface(SurfaceCommand::SelectTextTrack { selection: resolved });
        }
        true
    }

    /// Send selections made before the surface was ready
    fn push_track_selection(&mut self, fx: &mut Effects) {
        if !self.state().accepts_intents() {
            return;
        }
        if let AudioSelection::Track(_) = self.session.selected_audio {
            fx.surface(SurfaceCommand::SelectAudioTrack {
                selection: self.session.selected_audio.clone(),
            });
        }
        if let SubtitleSelection::Track(_) = self.session.selected_subtitle {
            fx.surface(SurfaceCommand::SelectTextTrack {
                selection: self.session.selected_subtitle.clone(),
            });
        }
    }

    fn command_paused(&mut self, paused: bool, fx: &mut Effects) {
        if self.surface_paused != Some(paused) {
            self.surface_paused = Some(paused);
            fx.surface(SurfaceCommand::SetPaused { paused });
        }
    }

    fn accepts_surface_intent(&self, intent: &'static str) -> bool {
        let state = self.state();
        if state.accepts_intents() {
            return true;
        }
        debug!(intent, state = %state, "Discarding intent");
        false
    }

    fn accepts_transport_intent(&self, intent: &'static str) -> bool {
        match self.gate {
            StartGate::Prompting { .. } => {
                debug!(intent, "Discarding intent while the resume prompt is open");
                return false;
            }
            StartGate::Undecided | StartGate::Decided(_) => {
                debug!(intent, "Discarding intent before the start position is applied");
                return false;
            }
            StartGate::Started => {}
        }
        self.accepts_surface_intent(intent)
    }

    fn transition(&mut self, next: TransportState) -> bool {
        let current = self.session.transport_state;
        if current == next {
            return true;
        }
        if !current.can_transition_to(next) {
            let err = Error::InvalidStateTransition {
                from: current.to_string(),
                to: next.to_string(),
            };
            warn!(error = %err, "Rejected transport transition");
            return false;
        }
        self.session.transport_state = next;
        info!(from = %current, to = %next, session_id = %self.session.id, "State transition");
        true
    }
}
