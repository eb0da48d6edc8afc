//! Kiosk session state machine.
//!
//! Idle → Detecting (hand raised) → Result (swing done) → Idle (timeout).
//! Detecting also falls back to Idle on timeout. Timeouts are polled by the
//! caller via [`SessionStateMachine::check_timeout`] and fed back in as
//! [`SessionEvent::Timeout`].

use std::time::{Duration, Instant};

use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Detecting,
    Result,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Detecting => "detecting",
            SessionState::Result => "result",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    HandRaised,
    SwingDone,
    Timeout,
}

/// A state change performed by [`SessionStateMachine::handle_event`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub from: SessionState,
    pub to: SessionState,
    pub event: SessionEvent,
}

/// Clears per-cycle detector history when a session falls back to Idle.
pub trait DetectorReset {
    fn reset_detectors(&mut self);
}

pub struct SessionStateMachine {
    state: SessionState,
    /// `None` only between a timeout reset and the next cycle
    state_entry_time: Option<Instant>,
}

impl SessionStateMachine {
    pub fn new(now: Instant) -> Self {
        Self {
            state: SessionState::Idle,
            state_entry_time: Some(now),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    #[cfg(test)]
    pub fn state_entry_time(&self) -> Option<Instant> {
        self.state_entry_time
    }

    /// True once strictly more than `duration` has elapsed since the current
    /// state was entered. Does not change state.
    pub fn check_timeout(&self, duration: Duration, now: Instant) -> bool {
        self.state_entry_time
            .map(|entered| now.saturating_duration_since(entered) > duration)
            .unwrap_or(false)
    }

    /// Apply `event`. Pairs without a transition are ignored and return `None`.
    pub fn handle_event(
        &mut self,
        event: SessionEvent,
        now: Instant,
        detectors: &mut dyn DetectorReset,
    ) -> Option<Transition> {
        let from = self.state;
        let to = match (from, event) {
            (SessionState::Idle, SessionEvent::HandRaised) => {
                self.state_entry_time = Some(now);
                SessionState::Detecting
            }
            (SessionState::Detecting, SessionEvent::SwingDone) => {
                self.state_entry_time = Some(now);
                SessionState::Result
            }
            (SessionState::Detecting, SessionEvent::Timeout)
            | (SessionState::Result, SessionEvent::Timeout) => {
                self.state_entry_time = None;
                detectors.reset_detectors();
                SessionState::Idle
            }
            _ => return None,
        };

        self.state = to;
        info!(from = from.name(), to = to.name(), ?event, "session transition");
        Some(Transition { from, to, event })
    }
}
