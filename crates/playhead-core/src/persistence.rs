//! Periodic watch-progress snapshots
//!
//! The tick only runs while playing. Leaving Playing cancels it; coming
//! back schedules it one full interval later, so a pause never produces a
//! save of a frozen position.

use crate::effects::{Effect, Effects};
use crate::playback::PlaybackSession;
use crate::store::WatchProgress;
use crate::timers::{TimerKind, Timers};
use crate::types::TransportState;
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
pub struct PersistenceScheduler {
    interval: Duration,
    saves: u64,
}

impl PersistenceScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval, saves: 0 }
    }

    /// Snapshots requested so far
    pub fn saves(&self) -> u64 {
        self.saves
    }

    pub fn on_transport_change(
        &mut self,
        previous: TransportState,
        next: TransportState,
        now: Duration,
        timers: &mut Timers,
    ) {
        if next == TransportState::Playing {
            if previous != TransportState::Playing {
                timers.schedule(TimerKind::PersistTick, now + self.interval);
            }
        } else if timers.cancel(TimerKind::PersistTick) {
            debug!(state = %next, "Progress ticks suspended");
        }
    }

    pub fn on_tick(
        &mut self,
        session: &PlaybackSession,
        now: Duration,
        timers: &mut Timers,
        fx: &mut Effects,
    ) {
        self.snapshot(session, fx);
        if session.transport_state() == TransportState::Playing {
            timers.schedule(TimerKind::PersistTick, now + self.interval);
        }
    }

    /// Immediate snapshot outside the tick, e.g. when the app is backgrounded
    pub fn save_now(&mut self, session: &PlaybackSession, fx: &mut Effects) {
        self.snapshot(session, fx);
    }

    /// Best-effort save at teardown, whatever the transport state
    pub fn final_save(&mut self, session: &PlaybackSession, timers: &mut Timers, fx: &mut Effects) {
        timers.cancel(TimerKind::PersistTick);
        self.snapshot(session, fx);
    }

    fn snapshot(&mut self, session: &PlaybackSession, fx: &mut Effects) {
        let (current_time, duration) = (session.current_time(), session.duration());
        if current_time <= 0.0 || duration <= 0.0 {
            return;
        }
        self.saves += 1;
        fx.push(Effect::SaveProgress {
            key: session.key().clone(),
            progress: WatchProgress::new(current_time, duration),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_scheduled_on_entering_playing() {
        let mut scheduler = PersistenceScheduler::new(Duration::from_secs(5));
        let mut timers = Timers::new();

        scheduler.on_transport_change(
            TransportState::Loading,
            TransportState::Playing,
            Duration::from_secs(1),
            &mut timers,
        );
        assert_eq!(timers.deadline(TimerKind::PersistTick), Some(Duration::from_secs(6)));

        // Staying in Playing does not push the tick back
        scheduler.on_transport_change(
            TransportState::Playing,
            TransportState::Playing,
            Duration::from_secs(3),
            &mut timers,
        );
        assert_eq!(timers.deadline(TimerKind::PersistTick), Some(Duration::from_secs(6)));
    }

    #[test]
    fn test_tick_suspended_outside_playing() {
        let mut scheduler = PersistenceScheduler::new(Duration::from_secs(5));
        let mut timers = Timers::new();

        for state in [
            TransportState::Paused,
            TransportState::Seeking,
            TransportState::Buffering,
            TransportState::Error,
        ] {
            scheduler.on_transport_change(TransportState::Loading, TransportState::Playing, Duration::ZERO, &mut timers);
            scheduler.on_transport_change(TransportState::Playing, state, Duration::ZERO, &mut timers);
            assert!(!timers.is_pending(TimerKind::PersistTick), "tick left running in {state}");
        }
    }
}
