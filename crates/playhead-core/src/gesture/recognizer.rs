//! Gesture recognizer
//!
//! A single-pointer state machine with an explicit priority table:
//! - A pan wins over every press recognizer once movement exceeds the slop;
//!   its axis is the dominant component of the motion.
//! - A vertical pan only exists where the zone has a vertical action. A
//!   mostly-vertical motion elsewhere fails and fires nothing.
//! - A long-press wins over tap once the press has been held long enough.
//! - A tap waits for the double-tap window to lapse before it fires. A double
//!   tap consumes both taps, so it never also toggles the controls.

use super::{GestureZone, Intent, PointerEvent, PointerPhase, Viewport};
use crate::config::ControllerConfig;
use crate::timers::{TimerKind, Timers};
use std::time::Duration;
use tracing::{debug, trace};

/// Gesture kinds the recognizer can settle on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Tap,
    DoubleTap,
    LongPress,
    HorizontalDrag,
    VerticalDrag,
}

/// Action of a double tap in a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoubleTapAction {
    SkipBackward,
    SkipForward,
    CycleResizeMode,
}

/// Action of a vertical drag in a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAction {
    Brightness,
    Volume,
}

/// Recognizers present in a zone
///
/// Every zone has a tap (toggle controls) and a horizontal drag (scrub).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneRules {
    pub double_tap: Option<DoubleTapAction>,
    pub vertical: Option<VerticalAction>,
    pub long_press: bool,
}

/// Priority table per zone
pub fn zone_rules(zone: GestureZone) -> ZoneRules {
    match zone {
        GestureZone::Left => ZoneRules {
            double_tap: Some(DoubleTapAction::SkipBackward),
            vertical: Some(VerticalAction::Brightness),
            long_press: true,
        },
        GestureZone::Center => ZoneRules {
            double_tap: Some(DoubleTapAction::CycleResizeMode),
            vertical: None,
            long_press: true,
        },
        GestureZone::Right => ZoneRules {
            double_tap: Some(DoubleTapAction::SkipForward),
            vertical: Some(VerticalAction::Volume),
            long_press: true,
        },
    }
}

/// Seconds of seek covered by a drag across the full width
///
/// Longer content gets a coarser scrub.
pub fn scrub_range(duration: f64) -> f64 {
    match duration {
        d if d <= 5.0 * 60.0 => 30.0,
        d if d <= 30.0 * 60.0 => 60.0,
        d if d <= 60.0 * 60.0 => 90.0,
        _ => 120.0,
    }
}

/// Playback facts the recognizer needs to anchor seeks
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GestureContext {
    pub current_time: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, Copy)]
struct PendingTap {
    zone: GestureZone,
    at: Duration,
    media_time: f64,
}

#[derive(Debug, Clone, Copy)]
struct SkipSequence {
    direction: f64,
    anchor: f64,
    total: f64,
}

impl SkipSequence {
    fn target(&self) -> f64 {
        self.anchor + self.total
    }
}

#[derive(Debug, Clone, Copy)]
enum Tracking {
    Idle,
    Pressed {
        zone: GestureZone,
        origin_x: f64,
        origin_y: f64,
    },
    LongPress,
    Scrub {
        origin_x: f64,
        anchor: f64,
        range: f64,
        duration: f64,
        preview: Option<f64>,
    },
    Vertical {
        action: VerticalAction,
        last_y: f64,
    },
    /// Press outside any zone, or a motion no recognizer accepts
    Rejected,
}

/// Converts pointer events into intents
#[derive(Debug)]
pub struct GestureRecognizer {
    viewport: Viewport,
    slop: f64,
    double_tap_window: Duration,
    skip_decay: Duration,
    skip_increment: f64,
    long_press: Duration,
    tracking: Tracking,
    pending_tap: Option<PendingTap>,
    skip: Option<SkipSequence>,
    last_gesture: Option<GestureKind>,
}

impl GestureRecognizer {
    pub fn new(config: &ControllerConfig, viewport: Viewport) -> Self {
        Self {
            viewport,
            slop: config.touch_slop_px,
            double_tap_window: config.double_tap_window(),
            skip_decay: config.skip_decay(),
            skip_increment: config.skip_increment_secs,
            long_press: config.long_press(),
            tracking: Tracking::Idle,
            pending_tap: None,
            skip: None,
            last_gesture: None,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Most recently recognized gesture
    pub fn last_gesture(&self) -> Option<GestureKind> {
        self.last_gesture
    }

    /// Signed total of the running skip sequence
    pub fn pending_skip(&self) -> Option<f64> {
        self.skip.map(|seq| seq.total)
    }

    /// Feed one pointer event
    pub fn handle(
        &mut self,
        event: PointerEvent,
        now: Duration,
        ctx: GestureContext,
        timers: &mut Timers,
        out: &mut Vec<Intent>,
    ) {
        trace!(phase = ?event.phase, x = event.x, y = event.y, "Pointer event");
        match event.phase {
            PointerPhase::Down => self.on_down(event, now, timers, out),
            PointerPhase::Move => self.on_move(event, ctx, timers, out),
            PointerPhase::Up => self.on_up(now, ctx, timers, out),
            PointerPhase::Cancel => self.on_cancel(timers, out),
        }
    }

    /// Handle a gesture timer firing
    pub fn on_timer(&mut self, kind: TimerKind, out: &mut Vec<Intent>) {
        match kind {
            TimerKind::DoubleTapWindow => {
                if let Some(tap) = self.pending_tap.take() {
                    debug!(zone = ?tap.zone, "Double tap failed, firing tap");
                    self.recognized(GestureKind::Tap);
                    out.push(Intent::ToggleControls);
                }
            }
            TimerKind::LongPress => {
                if let Tracking::Pressed { zone, .. } = self.tracking {
                    if zone_rules(zone).long_press {
                        self.tracking = Tracking::LongPress;
                        self.recognized(GestureKind::LongPress);
                        out.push(Intent::SpeedBoost(true));
                    }
                }
            }
            TimerKind::SkipDecay => {
                if let Some(seq) = self.skip.take() {
                    debug!(anchor = seq.anchor, total = seq.total, "Skip sequence committed");
                    out.push(Intent::SeekTo(seq.target()));
                }
            }
            _ => {}
        }
    }

    /// Drop all in-progress recognition and cancel its timers
    pub fn reset(&mut self, timers: &mut Timers) {
        timers.cancel(TimerKind::DoubleTapWindow);
        timers.cancel(TimerKind::LongPress);
        timers.cancel(TimerKind::SkipDecay);
        self.tracking = Tracking::Idle;
        self.pending_tap = None;
        self.skip = None;
    }

    fn on_down(&mut self, event: PointerEvent, now: Duration, timers: &mut Timers, out: &mut Vec<Intent>) {
        // A press without a release for the previous one ends that gesture
        self.on_cancel(timers, out);

        match self.viewport.zone_at(event.x, event.y) {
            Some(zone) => {
                self.tracking = Tracking::Pressed {
                    zone,
                    origin_x: event.x,
                    origin_y: event.y,
                };
                timers.schedule(TimerKind::LongPress, now + self.long_press);
            }
            None => self.tracking = Tracking::Rejected,
        }
    }

    fn on_move(&mut self, event: PointerEvent, ctx: GestureContext, timers: &mut Timers, out: &mut Vec<Intent>) {
        match self.tracking {
            Tracking::Pressed { zone, origin_x, origin_y } => {
                let dx = event.x - origin_x;
                let dy = event.y - origin_y;
                if dx.hypot(dy) <= self.slop {
                    return;
                }
                timers.cancel(TimerKind::LongPress);

                if dx.abs() >= dy.abs() {
                    self.recognized(GestureKind::HorizontalDrag);
                    self.tracking = Tracking::Scrub {
                        origin_x,
                        anchor: ctx.current_time,
                        range: scrub_range(ctx.duration),
                        duration: ctx.duration,
                        preview: None,
                    };
                    self.update_scrub(event.x, out);
                } else if let Some(action) = zone_rules(zone).vertical {
                    self.recognized(GestureKind::VerticalDrag);
                    self.tracking = Tracking::Vertical { action, last_y: origin_y };
                    self.update_vertical(event.y, out);
                } else {
                    debug!(zone = ?zone, "No vertical recognizer in zone, gesture fails");
                    self.tracking = Tracking::Rejected;
                }
            }
            Tracking::Scrub { .. } => self.update_scrub(event.x, out),
            Tracking::Vertical { .. } => self.update_vertical(event.y, out),
            Tracking::Idle | Tracking::LongPress | Tracking::Rejected => {}
        }
    }

    fn on_up(&mut self, now: Duration, ctx: GestureContext, timers: &mut Timers, out: &mut Vec<Intent>) {
        timers.cancel(TimerKind::LongPress);
        match std::mem::replace(&mut self.tracking, Tracking::Idle) {
            Tracking::Pressed { zone, .. } => self.on_tap(zone, now, ctx, timers, out),
            Tracking::Scrub { preview, .. } => {
                // Only the release reaches the surface
                if let Some(target) = preview {
                    debug!(target, "Scrub released");
                    out.push(Intent::SeekTo(target));
                }
            }
            Tracking::LongPress => out.push(Intent::SpeedBoost(false)),
            Tracking::Vertical { .. } | Tracking::Rejected | Tracking::Idle => {}
        }
    }

    fn on_cancel(&mut self, timers: &mut Timers, out: &mut Vec<Intent>) {
        timers.cancel(TimerKind::LongPress);
        match std::mem::replace(&mut self.tracking, Tracking::Idle) {
            Tracking::Scrub { .. } => out.push(Intent::CancelPreview),
            Tracking::LongPress => out.push(Intent::SpeedBoost(false)),
            _ => {}
        }
    }

    fn on_tap(
        &mut self,
        zone: GestureZone,
        now: Duration,
        ctx: GestureContext,
        timers: &mut Timers,
        out: &mut Vec<Intent>,
    ) {
        let Some(action) = zone_rules(zone).double_tap else {
            self.recognized(GestureKind::Tap);
            out.push(Intent::ToggleControls);
            return;
        };

        if let Some(first) = self.pending_tap.take() {
            timers.cancel(TimerKind::DoubleTapWindow);
            if first.zone == zone && now.saturating_sub(first.at) <= self.double_tap_window {
                self.recognized(GestureKind::DoubleTap);
                self.on_double_tap(action, first, now, timers, out);
                return;
            }
            // The earlier tap can no longer pair up
            self.recognized(GestureKind::Tap);
            out.push(Intent::ToggleControls);
        }

        self.pending_tap = Some(PendingTap {
            zone,
            at: now,
            media_time: ctx.current_time,
        });
        timers.schedule(TimerKind::DoubleTapWindow, now + self.double_tap_window);
    }

    fn on_double_tap(
        &mut self,
        action: DoubleTapAction,
        first: PendingTap,
        now: Duration,
        timers: &mut Timers,
        out: &mut Vec<Intent>,
    ) {
        let direction = match action {
            DoubleTapAction::CycleResizeMode => {
                out.push(Intent::CycleResizeMode);
                return;
            }
            DoubleTapAction::SkipForward => 1.0,
            DoubleTapAction::SkipBackward => -1.0,
        };
        let step = direction * self.skip_increment;

        let seq = match self.skip.take() {
            Some(mut seq) if seq.direction == direction => {
                seq.total += step;
                seq
            }
            Some(previous) => {
                // Reversing direction commits the running sequence first
                out.push(Intent::SeekTo(previous.target()));
                SkipSequence {
                    direction,
                    anchor: previous.target(),
                    total: step,
                }
            }
            None => SkipSequence {
                direction,
                anchor: first.media_time,
                total: step,
            },
        };

        debug!(anchor = seq.anchor, total = seq.total, "Skip accumulated");
        out.push(Intent::PreviewSkip(seq.total));
        self.skip = Some(seq);
        timers.schedule(TimerKind::SkipDecay, now + self.skip_decay);
    }

    fn update_scrub(&mut self, x: f64, out: &mut Vec<Intent>) {
        let width = self.viewport.width;
        if let Tracking::Scrub {
            origin_x,
            anchor,
            range,
            duration,
            ref mut preview,
        } = self.tracking
        {
            let upper = if duration > 0.0 { duration } else { f64::MAX };
            let target = (anchor + (x - origin_x) / width * range).clamp(0.0, upper);
            if *preview != Some(target) {
                *preview = Some(target);
                out.push(Intent::PreviewSeek(target));
            }
        }
    }

    fn update_vertical(&mut self, y: f64, out: &mut Vec<Intent>) {
        let height = self.viewport.height;
        if let Tracking::Vertical { action, ref mut last_y } = self.tracking {
            // Upward motion raises the level
            let delta = (*last_y - y) / height;
            *last_y = y;
            if delta != 0.0 {
                out.push(match action {
                    VerticalAction::Brightness => Intent::BrightnessDelta(delta),
                    VerticalAction::Volume => Intent::VolumeDelta(delta),
                });
            }
        }
    }

    fn recognized(&mut self, kind: GestureKind) {
        trace!(gesture = ?kind, "Gesture recognized");
        self.last_gesture = Some(kind);
    }
}
