//! Integration tests for Playhead Core

use playhead_core::resume::decide;
use playhead_core::{
    ContentKey, ControllerConfig, Effect, Intent, OpenRequest, PlaybackController, PlayerRuntime,
    PointerEvent, ProgressStore, PromptAnswer, RecordingSurface, ResumeDecision, ResumePreference,
    SubtitleSelection, SurfaceCommand, SurfaceEvent, TrackRef, TransportState, UiEvent, Viewport,
    WatchProgress,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    playhead_core::init();
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn secs(value: u64) -> Duration {
    Duration::from_secs(value)
}

fn progress_event(time: f64) -> SurfaceEvent {
    SurfaceEvent::Progress {
        time,
        playable_duration: time + 30.0,
        seekable_duration: 3000.0,
    }
}

fn seeks(effects: &[Effect]) -> Vec<f64> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Surface(SurfaceCommand::Seek { time }) => Some(*time),
            _ => None,
        })
        .collect()
}

fn previews(effects: &[Effect]) -> Vec<f64> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Ui(UiEvent::PreviewTime { time: Some(time) }) => Some(*time),
            _ => None,
        })
        .collect()
}

fn saves(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::SaveProgress { .. }))
        .count()
}

/// Controller driven through open, resume and load, collecting every effect
struct Session {
    controller: PlaybackController,
    effects: Vec<Effect>,
}

impl Session {
    fn open(decision: ResumeDecision, duration: f64) -> Self {
        init_tracing();
        let mut controller = PlaybackController::new(
            OpenRequest::new("https://cdn.example.com/feature/master.m3u8", "tt0133093"),
            ControllerConfig::default(),
            Viewport::new(1000.0, 500.0).with_margins(40.0, 40.0),
        );
        let mut effects = controller.open(ms(0));
        effects.extend(controller.resolve_start(decision, ms(0)));
        effects.extend(controller.surface_event(SurfaceEvent::Loaded { duration }, ms(0)));
        Self { controller, effects }
    }

    /// Playing at `position` with no seek in flight
    fn playing_at(position: f64, duration: f64) -> Self {
        let mut session = Self::open(ResumeDecision::StartAt(0.0), duration);
        session.surface(progress_event(position), ms(10));
        session.effects.clear();
        session
    }

    fn surface(&mut self, event: SurfaceEvent, now: Duration) -> Vec<Effect> {
        let effects = self.controller.surface_event(event, now);
        self.effects.extend(effects.clone());
        effects
    }

    fn pointer(&mut self, event: PointerEvent, now: Duration) -> Vec<Effect> {
        let effects = self.controller.pointer(event, now);
        self.effects.extend(effects.clone());
        effects
    }

    fn intent(&mut self, intent: Intent, now: Duration) -> Vec<Effect> {
        let effects = self.controller.intent(intent, now);
        self.effects.extend(effects.clone());
        effects
    }

    fn advance(&mut self, now: Duration) -> Vec<Effect> {
        let effects = self.controller.advance(now);
        self.effects.extend(effects.clone());
        effects
    }

    fn tap(&mut self, x: f64, y: f64, down_at: u64) {
        self.pointer(PointerEvent::down(x, y), ms(down_at));
        self.pointer(PointerEvent::up(x, y), ms(down_at + 40));
    }
}

// =============================================================================
// Resume Decision Tests
// =============================================================================

#[test]
fn test_finished_content_always_starts_over() {
    for preference in [
        ResumePreference::AlwaysAsk,
        ResumePreference::AlwaysResume,
        ResumePreference::AlwaysStartOver,
    ] {
        for current_time in [570.0, 580.5, 599.0, 600.0] {
            let progress = WatchProgress::new(current_time, 600.0);
            assert_eq!(
                decide(Some(&progress), preference, 0.95),
                ResumeDecision::StartAt(0.0),
                "{current_time}s with {preference}"
            );
        }
    }
}

#[test]
fn test_always_resume_is_silent() {
    for current_time in [1.0, 120.0, 569.0] {
        let progress = WatchProgress::new(current_time, 600.0);
        assert_eq!(
            decide(Some(&progress), ResumePreference::AlwaysResume, 0.95),
            ResumeDecision::StartAt(current_time)
        );
    }

    let mut controller = PlaybackController::new(
        OpenRequest::new("file:///movie.mkv", "tt1"),
        ControllerConfig::default(),
        Viewport::default(),
    );
    let mut effects = controller.open(ms(0));
    effects.extend(controller.resolve_resume(
        Some(&WatchProgress::new(120.0, 600.0)),
        ResumePreference::AlwaysResume,
        ms(5),
    ));
    effects.extend(controller.surface_event(SurfaceEvent::Loaded { duration: 600.0 }, ms(20)));

    assert_eq!(seeks(&effects), vec![120.0]);
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::Ui(UiEvent::ResumePrompt { .. }))));
    assert!(!controller.is_prompting());
}

#[test]
fn test_nearly_finished_feature_opens_at_start() {
    let mut controller = PlaybackController::new(
        OpenRequest::new("file:///feature.mp4", "tt2"),
        ControllerConfig::default(),
        Viewport::default(),
    );
    let mut effects = controller.open(ms(0));
    effects.extend(controller.resolve_resume(
        Some(&WatchProgress::new(2900.0, 3000.0)),
        ResumePreference::AlwaysAsk,
        ms(0),
    ));
    effects.extend(controller.surface_event(SurfaceEvent::Loaded { duration: 3000.0 }, ms(30)));

    assert!(seeks(&effects).is_empty());
    assert!(!controller.is_prompting());
    assert_eq!(controller.status().transport_state, TransportState::Playing);
    assert_eq!(controller.status().current_time, 0.0);
}

#[test]
fn test_prompt_resume_with_remember() {
    let mut session = Session::open(ResumeDecision::PromptResume(600.0), 3000.0);
    assert!(session
        .effects
        .contains(&Effect::Ui(UiEvent::ResumePrompt { saved_time: 600.0 })));
    assert_eq!(session.controller.status().transport_state, TransportState::Paused);

    let effects = session
        .controller
        .answer_prompt(PromptAnswer::resume().remembered(), ms(2_000));

    let preference_at = effects
        .iter()
        .position(|effect| *effect == Effect::SavePreference(ResumePreference::AlwaysResume))
        .expect("preference saved");
    let seek_at = effects
        .iter()
        .position(|effect| *effect == Effect::Surface(SurfaceCommand::Seek { time: 600.0 }))
        .expect("seek issued");
    assert!(preference_at < seek_at);

    session.surface(SurfaceEvent::SeekComplete { time: 600.0 }, ms(2_200));
    let status = session.controller.status();
    assert_eq!(status.transport_state, TransportState::Playing);
    assert_eq!(status.current_time, 600.0);
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[tokio::test]
async fn test_progress_round_trip() {
    let store = ProgressStore::in_memory();
    let key = ContentKey::episode("tt0903747", "s01e01");

    store
        .save_progress(&key, &WatchProgress::new(120.0, 600.0))
        .await
        .unwrap();
    let loaded = store.load_progress(&key).await.unwrap().unwrap();

    assert_eq!(loaded.watched_fraction(), Some(0.2));
    assert!(store.load_progress(&ContentKey::new("tt0903747")).await.unwrap().is_none());
}

#[test]
fn test_persistence_ticks_only_while_playing() {
    let mut session = Session::playing_at(0.5, 3000.0);
    let mut saved_at = Vec::new();

    for second in 1..=22u64 {
        let now = secs(second);
        if second == 12 {
            session.intent(Intent::TogglePlayback, now);
        }
        if second == 20 {
            session.intent(Intent::TogglePlayback, now);
        }
        let position = if (12..20).contains(&second) { 12.0 } else { second as f64 };
        let effects = session.surface(progress_event(position), now);
        if saves(&effects) > 0 {
            saved_at.push(second);
        }
    }
    assert_eq!(saved_at, vec![5, 10]);

    let teardown = session.controller.close(secs(22));
    assert_eq!(saves(&teardown), 1);
    assert!(matches!(
        teardown.as_slice(),
        [Effect::SaveProgress { progress, .. }] if progress.current_time == 22.0
    ));
}

#[test]
fn test_teardown_skips_empty_progress() {
    let mut controller = PlaybackController::new(
        OpenRequest::new("file:///movie.mp4", "tt3"),
        ControllerConfig::default(),
        Viewport::default(),
    );
    controller.open(ms(0));
    controller.surface_event(SurfaceEvent::Error { message: "unsupported codec".into() }, ms(50));

    assert!(controller.close(ms(100)).is_empty());
}

// =============================================================================
// Gesture Tests
// =============================================================================

#[test]
fn test_triple_double_tap_single_seek() {
    let mut session = Session::playing_at(600.0, 3000.0);

    for start in [100, 300, 500] {
        session.tap(900.0, 250.0, start);
        session.tap(900.0, 250.0, start + 80);
    }
    assert!(seeks(&session.effects).is_empty());
    assert!(session
        .effects
        .contains(&Effect::Ui(UiEvent::ShowOverlay {
            kind: playhead_core::OverlayKind::SkipForward,
            value: playhead_core::OverlayValue::Seconds(30.0),
        })));

    session.advance(ms(2_000));
    assert_eq!(seeks(&session.effects), vec![630.0]);
}

#[test]
fn test_drag_release_single_seek() {
    let mut session = Session::playing_at(1000.0, 3000.0);

    session.pointer(PointerEvent::down(700.0, 250.0), ms(100));
    for (i, x) in [720.0, 745.0, 770.0, 790.0, 815.0].into_iter().enumerate() {
        session.pointer(PointerEvent::moved(x, 252.0), ms(120 + 16 * i as u64));
    }
    assert!(seeks(&session.effects).is_empty());
    let previewed = previews(&session.effects);
    assert_eq!(previewed.len(), 5);
    assert_eq!(session.controller.status().preview_time, previewed.last().copied());

    session.pointer(PointerEvent::up(815.0, 252.0), ms(220));
    assert_eq!(seeks(&session.effects), previewed.last().copied().into_iter().collect::<Vec<_>>());
    assert_eq!(session.controller.status().preview_time, None);
}

#[test]
fn test_vertical_drag_in_center_is_ignored() {
    let mut session = Session::playing_at(10.0, 600.0);

    session.pointer(PointerEvent::down(500.0, 150.0), ms(100));
    session.pointer(PointerEvent::moved(502.0, 300.0), ms(130));
    session.pointer(PointerEvent::up(502.0, 300.0), ms(160));

    assert!(!session.effects.iter().any(|effect| matches!(
        effect,
        Effect::Surface(SurfaceCommand::SetVolume { .. }) | Effect::Ui(UiEvent::BrightnessChanged { .. })
    )));
}

#[test]
fn test_tap_in_chrome_margin_ignored() {
    let mut session = Session::playing_at(10.0, 600.0);

    session.tap(500.0, 10.0, 100);
    session.advance(ms(1_000));

    assert!(session.controller.controls_visible());
}

// =============================================================================
// Seek Tests
// =============================================================================

#[test]
fn test_seek_boundaries() {
    let mut session = Session::playing_at(30.0, 600.0);

    let effects = session.intent(Intent::SeekBy(-100.0), ms(100));
    assert_eq!(seeks(&effects), vec![0.0]);
    session.surface(SurfaceEvent::SeekComplete { time: 0.0 }, ms(200));

    let effects = session.intent(Intent::SeekTo(600.0), ms(300));
    session.surface(SurfaceEvent::SeekComplete { time: 599.9 }, ms(400));
    let effects_past_end = session.intent(Intent::SeekTo(9_999.0), ms(500));

    let at_end = seeks(&effects);
    let past_end = seeks(&effects_past_end);
    assert_eq!(at_end.len(), 1);
    assert!((at_end[0] - 599.9).abs() < 1e-9);
    assert!((past_end[0] - 599.9).abs() < 1e-9);
}

#[test]
fn test_seek_timeout_restores_play_intent() {
    let mut session = Session::playing_at(30.0, 600.0);
    session.intent(Intent::TogglePlayback, ms(100));
    session.intent(Intent::SeekTo(200.0), ms(200));
    assert_eq!(session.controller.status().transport_state, TransportState::Seeking);

    session.advance(ms(6_000));
    assert_eq!(session.controller.status().transport_state, TransportState::Paused);
}

// =============================================================================
// Track Tests
// =============================================================================

#[test]
fn test_subtitle_disable_twice() {
    let mut session = Session::playing_at(10.0, 600.0);
    session.surface(
        SurfaceEvent::TextTracks {
            tracks: vec![
                TrackRef::new(0).with_language("en"),
                TrackRef::new(1).with_language("es"),
            ],
        },
        ms(20),
    );
    session
        .controller
        .select_subtitle(SubtitleSelection::Track(TrackRef::new(1)), ms(30));

    session
        .controller
        .select_subtitle(SubtitleSelection::Disabled, ms(40));
    let once = session.controller.session().selected_subtitle().clone();
    let second = session
        .controller
        .select_subtitle(SubtitleSelection::Disabled, ms(50));

    assert_eq!(once, SubtitleSelection::Disabled);
    assert_eq!(session.controller.session().selected_subtitle(), &once);
    assert!(second.is_empty());
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_load_error_then_retry() {
    let mut controller = PlaybackController::new(
        OpenRequest::new("https://cdn.example.com/missing.m3u8", "tt4"),
        ControllerConfig::default(),
        Viewport::default(),
    );
    controller.open(ms(0));
    controller.resolve_start(ResumeDecision::StartAt(0.0), ms(0));
    let effects = controller.surface_event(SurfaceEvent::Error { message: "HTTP 404".into() }, ms(80));

    assert!(effects.iter().any(|effect| matches!(
        effect,
        Effect::Ui(UiEvent::PlaybackError { code, .. }) if code == "LOAD"
    )));
    assert_eq!(controller.status().transport_state, TransportState::Error);
    assert!(controller.status().controls_visible);

    let effects = controller.restart(secs(5));
    assert!(matches!(
        effects.first(),
        Some(Effect::Surface(SurfaceCommand::Load { .. }))
    ));
    controller.surface_event(SurfaceEvent::Loaded { duration: 600.0 }, secs(6));
    assert_eq!(controller.status().transport_state, TransportState::Playing);
}

#[test]
fn test_close_cancels_pending_gestures() {
    let mut session = Session::playing_at(100.0, 600.0);
    session.tap(900.0, 250.0, 100);
    session.tap(900.0, 250.0, 180);

    let teardown = session.controller.close(ms(300));
    assert_eq!(saves(&teardown), 1);
    assert!(session.controller.advance(ms(5_000)).is_empty());
    assert!(seeks(&session.effects).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_runtime_prompt_flow() {
    init_tracing();
    let store = ProgressStore::in_memory();
    let key = ContentKey::new("tt0468569");
    store
        .save_progress(&key, &WatchProgress::new(600.0, 3000.0))
        .await
        .unwrap();

    let surface = RecordingSurface::new();
    let (handle, mut ui) = PlayerRuntime::spawn(
        OpenRequest::new("https://cdn.example.com/dark-knight.m3u8", "tt0468569"),
        ControllerConfig::default(),
        Viewport::default(),
        store.clone(),
        Box::new(surface.clone()),
    )
    .unwrap();
    handle
        .surface_event(SurfaceEvent::Loaded { duration: 3000.0 })
        .unwrap();

    loop {
        match ui.recv().await {
            Some(UiEvent::ResumePrompt { saved_time }) => {
                assert_eq!(saved_time, 600.0);
                break;
            }
            Some(_) => continue,
            None => panic!("runtime stopped before prompting"),
        }
    }

    handle
        .answer_prompt(PromptAnswer::resume().remembered())
        .unwrap();
    handle.close().await.unwrap();

    assert_eq!(
        store.load_preference().await.unwrap(),
        ResumePreference::AlwaysResume
    );
    assert_eq!(surface.seeks(), vec![600.0]);
    assert!(handle.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_runtime_saves_progress_on_tick() {
    init_tracing();
    let store = ProgressStore::in_memory();
    let (handle, _ui) = PlayerRuntime::spawn(
        OpenRequest::new("file:///episode.mp4", "tt0306414").with_episode("s01e02"),
        ControllerConfig::default(),
        Viewport::default(),
        store.clone(),
        Box::new(RecordingSurface::new()),
    )
    .unwrap();

    handle
        .surface_event(SurfaceEvent::Loaded { duration: 3600.0 })
        .unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    handle.surface_event(progress_event(42.0)).unwrap();
    tokio::time::sleep(Duration::from_secs(6)).await;

    let key = ContentKey::episode("tt0306414", "s01e02");
    let saved = store.load_progress(&key).await.unwrap().unwrap();
    assert_eq!(saved.current_time, 42.0);

    drop(handle);
}
