//! On-screen controls visibility

use crate::effects::{Effects, UiEvent};
use crate::timers::{TimerKind, Timers};
use crate::types::TransportState;
use std::time::Duration;

/// Auto-hiding controls
///
/// Visible at open. Interaction shows the controls and restarts the hide
/// timer, which only runs while playing.
#[derive(Debug)]
pub struct ControlsVisibility {
    visible: bool,
    hide_after: Duration,
}

impl ControlsVisibility {
    pub fn new(hide_after: Duration) -> Self {
        Self {
            visible: true,
            hide_after,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn show(&mut self, now: Duration, state: TransportState, timers: &mut Timers, fx: &mut Effects) {
        if !self.visible {
            self.visible = true;
            fx.ui(UiEvent::ControlsVisibility { visible: true });
        }
        self.rearm(now, state, timers);
    }

    pub fn hide(&mut self, timers: &mut Timers, fx: &mut Effects) {
        timers.cancel(TimerKind::ControlsHide);
        if self.visible {
            self.visible = false;
            fx.ui(UiEvent::ControlsVisibility { visible: false });
        }
    }

    pub fn toggle(&mut self, now: Duration, state: TransportState, timers: &mut Timers, fx: &mut Effects) {
        if self.visible {
            self.hide(timers, fx);
        } else {
            self.show(now, state, timers, fx);
        }
    }

    /// Activity while visible keeps the controls up
    pub fn touch(&mut self, now: Duration, state: TransportState, timers: &mut Timers) {
        if self.visible {
            self.rearm(now, state, timers);
        }
    }

    pub fn on_transport_change(
        &mut self,
        now: Duration,
        state: TransportState,
        timers: &mut Timers,
        fx: &mut Effects,
    ) {
        if state == TransportState::Error {
            self.show(now, state, timers, fx);
        } else {
            self.rearm(now, state, timers);
        }
    }

    pub fn on_hide_timer(&mut self, state: TransportState, timers: &mut Timers, fx: &mut Effects) {
        if state == TransportState::Playing {
            self.hide(timers, fx);
        }
    }

    fn rearm(&self, now: Duration, state: TransportState, timers: &mut Timers) {
        if self.visible && state == TransportState::Playing {
            timers.schedule(TimerKind::ControlsHide, now + self.hide_after);
        } else {
            timers.cancel(TimerKind::ControlsHide);
        }
    }
}
