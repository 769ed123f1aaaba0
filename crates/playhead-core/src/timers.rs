//! Session-owned timers
//!
//! Every deferred action of a session is a named deadline in one [`Timers`]
//! bag. Scheduling a kind that is already pending replaces its deadline, and
//! closing a session cancels the whole bag at once.

use crate::gesture::OverlayKind;
use std::collections::HashMap;
use std::time::Duration;

/// Named timers owned by a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    /// First tap waiting for a second one
    DoubleTapWindow,
    /// Press waiting to become a long-press
    LongPress,
    /// Skip sequence waiting for further double taps
    SkipDecay,
    /// Auto-hide of on-screen controls
    ControlsHide,
    /// Dismissal of a transient overlay
    Overlay(OverlayKind),
    /// Periodic progress save
    PersistTick,
    /// Auto-dismiss of the resume prompt
    ResumePromptTimeout,
    /// Reported positions become trustworthy after a seek
    SeekSettle,
    /// Seek confirmation deadline
    SeekTimeout,
}

/// Cancel bag of pending deadlines, measured from session start
#[derive(Debug, Default)]
pub struct Timers {
    deadlines: HashMap<TimerKind, Duration>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule (or reschedule) a timer
    pub fn schedule(&mut self, kind: TimerKind, at: Duration) {
        self.deadlines.insert(kind, at);
    }

    /// Cancel a timer, returning whether it was pending
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.deadlines.remove(&kind).is_some()
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.deadlines.contains_key(&kind)
    }

    pub fn deadline(&self, kind: TimerKind) -> Option<Duration> {
        self.deadlines.get(&kind).copied()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Duration> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return the earliest timer due at `now`
    ///
    /// Ties are broken by kind so firing order is deterministic.
    pub fn pop_due(&mut self, now: Duration) -> Option<TimerKind> {
        let (kind, _) = self
            .deadlines
            .iter()
            .filter(|(_, at)| **at <= now)
            .min_by_key(|(kind, at)| (**at, **kind))
            .map(|(kind, at)| (*kind, *at))?;
        self.deadlines.remove(&kind);
        Some(kind)
    }

    /// Cancel everything, returning how many timers were pending
    pub fn cancel_all(&mut self) -> usize {
        let count = self.deadlines.len();
        self.deadlines.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_pop_due_in_deadline_order() {
        let mut timers = Timers::new();
        timers.schedule(TimerKind::PersistTick, ms(5_000));
        timers.schedule(TimerKind::ControlsHide, ms(3_000));
        timers.schedule(TimerKind::SkipDecay, ms(800));

        assert_eq!(timers.next_deadline(), Some(ms(800)));
        assert_eq!(timers.pop_due(ms(4_000)), Some(TimerKind::SkipDecay));
        assert_eq!(timers.pop_due(ms(4_000)), Some(TimerKind::ControlsHide));
        assert_eq!(timers.pop_due(ms(4_000)), None);
        assert!(timers.is_pending(TimerKind::PersistTick));
    }

    #[test]
    fn test_reschedule_replaces_deadline() {
        let mut timers = Timers::new();
        timers.schedule(TimerKind::ControlsHide, ms(3_000));
        timers.schedule(TimerKind::ControlsHide, ms(6_000));

        assert_eq!(timers.len(), 1);
        assert_eq!(timers.pop_due(ms(3_000)), None);
        assert_eq!(timers.deadline(TimerKind::ControlsHide), Some(ms(6_000)));
    }

    #[test]
    fn test_overlay_timers_are_independent() {
        let mut timers = Timers::new();
        timers.schedule(TimerKind::Overlay(OverlayKind::Volume), ms(1_000));
        timers.schedule(TimerKind::Overlay(OverlayKind::Brightness), ms(1_000));
        assert!(timers.cancel(TimerKind::Overlay(OverlayKind::Volume)));
        assert!(timers.is_pending(TimerKind::Overlay(OverlayKind::Brightness)));
    }

    #[test]
    fn test_cancel_all() {
        let mut timers = Timers::new();
        timers.schedule(TimerKind::LongPress, ms(500));
        timers.schedule(TimerKind::ResumePromptTimeout, ms(30_000));
        assert_eq!(timers.cancel_all(), 2);
        assert!(timers.is_empty());
        assert_eq!(timers.next_deadline(), None);
    }
}
