//! Transient on-screen indicators
//!
//! One indicator per [`OverlayKind`]. Showing a kind that is already visible
//! refreshes its value and restarts its dismiss timer; kinds never share a timer.

use crate::effects::{Effects, UiEvent};
use crate::timers::{TimerKind, Timers};
use crate::types::ResizeMode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Kinds of transient indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    Volume,
    Brightness,
    SkipForward,
    SkipBackward,
    SeekPreview,
    ResizeMode,
    Speed,
}

/// Value displayed by an indicator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum OverlayValue {
    /// Level in `[0, 1]`
    Level(f64),
    /// Accumulated skip in seconds
    Seconds(f64),
    /// Media position in seconds
    Time(f64),
    Resize(ResizeMode),
    Rate(f64),
}

/// Visible indicators and their dismiss delay
#[derive(Debug)]
pub struct Overlays {
    visible: HashMap<OverlayKind, OverlayValue>,
    dismiss_after: Duration,
}

impl Overlays {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            visible: HashMap::new(),
            dismiss_after,
        }
    }

    /// Show or refresh an indicator and restart its dismiss timer
    pub fn show(
        &mut self,
        kind: OverlayKind,
        value: OverlayValue,
        now: Duration,
        timers: &mut Timers,
        fx: &mut Effects,
    ) {
        self.visible.insert(kind, value);
        timers.schedule(TimerKind::Overlay(kind), now + self.dismiss_after);
        fx.ui(UiEvent::ShowOverlay { kind, value });
    }

    /// Dismiss timer fired
    pub fn expire(&mut self, kind: OverlayKind, fx: &mut Effects) {
        if self.visible.remove(&kind).is_some() {
            fx.ui(UiEvent::HideOverlay { kind });
        }
    }

    /// Hide an indicator immediately
    pub fn hide(&mut self, kind: OverlayKind, timers: &mut Timers, fx: &mut Effects) {
        timers.cancel(TimerKind::Overlay(kind));
        self.expire(kind, fx);
    }

    pub fn is_visible(&self, kind: OverlayKind) -> bool {
        self.visible.contains_key(&kind)
    }

    pub fn value(&self, kind: OverlayKind) -> Option<OverlayValue> {
        self.visible.get(&kind).copied()
    }

    pub fn clear(&mut self) {
        self.visible.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn test_same_kind_resets_dismiss_timer() {
        let mut overlays = Overlays::new(SECOND);
        let mut timers = Timers::new();
        let mut fx = Effects::new();

        overlays.show(OverlayKind::Volume, OverlayValue::Level(0.5), Duration::ZERO, &mut timers, &mut fx);
        overlays.show(
            OverlayKind::Volume,
            OverlayValue::Level(0.6),
            Duration::from_millis(700),
            &mut timers,
            &mut fx,
        );

        assert_eq!(
            timers.deadline(TimerKind::Overlay(OverlayKind::Volume)),
            Some(Duration::from_millis(1_700))
        );
        assert_eq!(overlays.value(OverlayKind::Volume), Some(OverlayValue::Level(0.6)));
    }

    #[test]
    fn test_other_kind_does_not_reset() {
        let mut overlays = Overlays::new(SECOND);
        let mut timers = Timers::new();
        let mut fx = Effects::new();

        overlays.show(OverlayKind::Volume, OverlayValue::Level(0.5), Duration::ZERO, &mut timers, &mut fx);
        overlays.show(
            OverlayKind::Brightness,
            OverlayValue::Level(0.2),
            Duration::from_millis(500),
            &mut timers,
            &mut fx,
        );

        assert_eq!(timers.pop_due(SECOND), Some(TimerKind::Overlay(OverlayKind::Volume)));
        overlays.expire(OverlayKind::Volume, &mut fx);
        assert!(!overlays.is_visible(OverlayKind::Volume));
        assert!(overlays.is_visible(OverlayKind::Brightness));
    }

    #[test]
    fn test_expire_emits_hide_once() {
        let mut overlays = Overlays::new(SECOND);
        let mut timers = Timers::new();
        let mut fx = Effects::new();

        overlays.show(OverlayKind::Speed, OverlayValue::Rate(2.0), Duration::ZERO, &mut timers, &mut fx);
        overlays.expire(OverlayKind::Speed, &mut fx);
        overlays.expire(OverlayKind::Speed, &mut fx);

        let hides = fx
            .into_vec()
            .into_iter()
            .filter(|effect| {
                matches!(effect, crate::Effect::Ui(UiEvent::HideOverlay { kind: OverlayKind::Speed }))
            })
            .count();
        assert_eq!(hides, 1);
    }
}
