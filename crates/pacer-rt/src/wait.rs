// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Suspension descriptors.
//!
//! A coroutine yields a `Wait` to say what it is suspended on. Duration
//! waits count down as the scheduler is ticked; event waits resolve when
//! their event is raised. The two never mix.

use std::time::Duration;

use crate::event::Event;

/// What a coroutine is waiting for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wait {
    /// Resume once this many seconds have been ticked.
    ///
    /// Zero or negative means already elapsed: the wait resolves on the
    /// next tick, whatever its delta.
    Duration { remaining: f64 },
    /// Resume when this event is raised.
    Event(Event),
}

impl Wait {
    pub fn seconds(seconds: f64) -> Self {
        Wait::Duration { remaining: seconds }
    }

    /// Wait for a time span. Precision is that of `as_secs_f64`.
    pub fn from_duration(duration: Duration) -> Self {
        Wait::seconds(duration.as_secs_f64())
    }

    pub fn event(evt: Event) -> Self {
        Wait::Event(evt)
    }

    /// Count `delta` seconds down. Returns true once the wait has elapsed.
    ///
    /// # Panics
    ///
    /// Panics on an event wait; only duration waits track time.
    pub fn advance_time(&mut self, delta: f64) -> bool {
        match self {
            Wait::Duration { remaining } => {
                *remaining -= delta;
                *remaining <= 0.0
            }
            Wait::Event(evt) => {
                panic!("advance_time called on a wait for {evt}; event waits do not track time")
            }
        }
    }

    /// True iff this is a wait on exactly `evt`.
    pub fn matches_event(&self, evt: Event) -> bool {
        matches!(self, Wait::Event(e) if *e == evt)
    }

    pub fn is_event(&self) -> bool {
        matches!(self, Wait::Event(_))
    }

    pub fn event_key(&self) -> Option<Event> {
        match self {
            Wait::Event(evt) => Some(*evt),
            Wait::Duration { .. } => None,
        }
    }

    /// Seconds left on a duration wait.
    pub fn remaining(&self) -> Option<f64> {
        match self {
            Wait::Duration { remaining } => Some(*remaining),
            Wait::Event(_) => None,
        }
    }
}

impl Default for Wait {
    fn default() -> Self {
        Wait::seconds(0.0)
    }
}

impl From<Event> for Wait {
    fn from(evt: Event) -> Self {
        Wait::Event(evt)
    }
}

impl From<Duration> for Wait {
    fn from(duration: Duration) -> Self {
        Wait::from_duration(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_elapses_at_zero() {
        let mut w = Wait::seconds(1.0);
        assert!(!w.advance_time(0.5));
        assert_eq!(w.remaining(), Some(0.5));
        assert!(w.advance_time(0.5));
    }

    #[test]
    fn negative_and_default_are_already_elapsed() {
        assert!(Wait::seconds(-3.0).advance_time(0.0));
        assert!(Wait::default().advance_time(0.0));
    }

    #[test]
    fn from_duration_uses_fractional_seconds() {
        let w = Wait::from(Duration::from_millis(1500));
        assert_eq!(w.remaining(), Some(1.5));
    }

    #[test]
    fn matches_only_the_same_event() {
        let a = Event::new();
        let b = Event::new();
        let w = Wait::event(a);
        assert!(w.matches_event(a));
        assert!(!w.matches_event(b));
        assert!(!Wait::seconds(1.0).matches_event(a));
        assert_eq!(w.event_key(), Some(a));
        assert!(w.is_event());
    }

    #[test]
    #[should_panic(expected = "event waits do not track time")]
    fn advancing_an_event_wait_panics() {
        Wait::event(Event::new()).advance_time(1.0);
    }
}
