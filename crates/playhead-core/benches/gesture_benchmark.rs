//! Benchmark tests for gesture interpretation and controller steps
//!
//! Run with: cargo bench -p playhead-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

use playhead_core::gesture::GestureContext;
use playhead_core::timers::Timers;
use playhead_core::{
    ControllerConfig, GestureRecognizer, Intent, OpenRequest, PlaybackController, PointerEvent,
    ResumeDecision, SurfaceEvent, Viewport,
};

// ============================================================================
// Helpers
// ============================================================================

fn viewport() -> Viewport {
    Viewport::new(1920.0, 1080.0).with_margins(80.0, 120.0)
}

fn playing_controller() -> PlaybackController {
    let mut controller = PlaybackController::new(
        OpenRequest::new("https://cdn.example.com/bench/master.m3u8", "bench"),
        ControllerConfig::default(),
        viewport(),
    );
    controller.open(Duration::ZERO);
    controller.resolve_start(ResumeDecision::StartAt(0.0), Duration::ZERO);
    controller.surface_event(SurfaceEvent::Loaded { duration: 5400.0 }, Duration::ZERO);
    controller
}

/// Down, `moves` drag updates across the right zone, up
fn drag_events(moves: usize) -> Vec<PointerEvent> {
    let mut events = vec![PointerEvent::down(1300.0, 540.0)];
    events.extend((1..=moves).map(|i| PointerEvent::moved(1300.0 + i as f64 * 4.0, 542.0)));
    events.push(PointerEvent::up(1300.0 + moves as f64 * 4.0, 542.0));
    events
}

// ============================================================================
// Recognizer Benchmarks
// ============================================================================

fn bench_zone_routing(c: &mut Criterion) {
    let viewport = viewport();

    c.bench_function("zone_at", |b| {
        b.iter(|| {
            for x in (0..1920).step_by(40) {
                black_box(viewport.zone_at(black_box(x as f64), 540.0));
            }
        })
    });
}

fn bench_drag_recognition(c: &mut Criterion) {
    let config = ControllerConfig::default();
    let ctx = GestureContext {
        current_time: 1200.0,
        duration: 5400.0,
    };

    let mut group = c.benchmark_group("Drag Recognition");

    for &moves in &[5usize, 60, 240] {
        let events = drag_events(moves);
        group.bench_with_input(BenchmarkId::new("scrub", moves), &events, |b, events| {
            b.iter(|| {
                let mut recognizer = GestureRecognizer::new(&config, viewport());
                let mut timers = Timers::new();
                let mut intents: Vec<Intent> = Vec::with_capacity(events.len());
                for (i, event) in events.iter().enumerate() {
                    let now = Duration::from_millis(i as u64 * 16);
                    recognizer.handle(*event, now, ctx, &mut timers, &mut intents);
                }
                black_box(intents.len())
            });
        });
    }

    group.finish();
}

// ============================================================================
// Controller Benchmarks
// ============================================================================

fn bench_controller_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("Controller Steps");

    group.bench_function("progress_event", |b| {
        let mut controller = playing_controller();
        let mut tick = 0u64;
        b.iter(|| {
            tick += 1;
            let time = (tick % 5000) as f64;
            black_box(controller.surface_event(
                SurfaceEvent::Progress {
                    time,
                    playable_duration: time + 30.0,
                    seekable_duration: 5400.0,
                },
                Duration::from_millis(tick),
            ))
        });
    });

    group.bench_function("drag_and_release", |b| {
        let events = drag_events(60);
        b.iter(|| {
            let mut controller = playing_controller();
            for (i, event) in events.iter().enumerate() {
                black_box(controller.pointer(*event, Duration::from_millis(100 + i as u64 * 16)));
            }
        });
    });

    group.bench_function("status", |b| {
        let controller = playing_controller();
        b.iter(|| black_box(controller.status()));
    });

    group.finish();
}

criterion_group!(
    gesture_benches,
    bench_zone_routing,
    bench_drag_recognition,
);

criterion_group!(
    controller_benches,
    bench_controller_steps,
);

criterion_main!(gesture_benches, controller_benches);
