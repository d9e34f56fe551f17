//! Phase clock.
//!
//! The engine is a tick-driven state machine. It does not own a clock or a
//! thread - the caller delivers one `tick()` per second while it is running
//! (see [`crate::runtime`] for a driver that does exactly that).
//!
//! ## Transitions
//!
//! ```text
//! Focus -> ShortBreak -> Focus -> ... -> Focus -> LongBreak -> Focus
//! ```
//!
//! A natural completion auto-starts the next phase and notifies once.
//!
//! ## Usage
//!
//! ```
//! use cadence_core::timer::TimerEngine;
//! use cadence_core::NullNotifier;
//!
//! let mut engine = TimerEngine::new(NullNotifier);
//! engine.start();
//! engine.tick(); // Some(Event::PhaseCompleted { .. }) when a phase finishes
//! assert_eq!(engine.state().seconds_remaining, 1499);
//! ```

use chrono::Utc;

use super::cycle;
use super::phase::Phase;
use super::state::TimerState;
use super::timeline::{self, CycleSegment};
use crate::events::Event;
use crate::notify::{Notifier, NullNotifier};

/// Owns the [`TimerState`] and the notifier it reports completions to.
#[derive(Debug, Clone)]
pub struct TimerEngine<N = NullNotifier> {
    state: TimerState,
    notifier: N,
}

impl Default for TimerEngine<NullNotifier> {
    fn default() -> Self {
        Self::new(NullNotifier)
    }
}

impl<N: Notifier> TimerEngine<N> {
    /// Create an engine in the initial state.
    pub fn new(notifier: N) -> Self {
        Self::from_state(TimerState::initial(), notifier)
    }

    /// Rebuild an engine around previously persisted state.
    pub fn from_state(state: TimerState, notifier: N) -> Self {
        Self {
            state: state.normalized(),
            notifier,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn phase(&self) -> Phase {
        self.state.current_phase
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn progress(&self) -> f64 {
        self.state.progress()
    }

    pub fn cycle_index(&self) -> usize {
        self.state.cycle_index()
    }

    pub fn segments(&self) -> [CycleSegment; cycle::CYCLE_LEN] {
        timeline::segments(&self.state)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let s = &self.state;
        Event::StateSnapshot {
            phase: s.current_phase,
            phase_name: s.current_phase.name().to_string(),
            is_running: s.is_running,
            remaining_secs: s.seconds_remaining,
            remaining_display: s.format_remaining(),
            total_secs: s.total_seconds(),
            progress: s.progress(),
            completed_focus_sessions: s.completed_focus_sessions,
            display_completed_sessions: s.display_completed_sessions(),
            cycle_index: s.cycle_index(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.state.is_running {
            return None;
        }
        self.state.is_running = true;
        tracing::debug!(phase = self.state.current_phase.as_str(), "timer started");
        Some(Event::TimerStarted {
            phase: self.state.current_phase,
            remaining_secs: self.state.seconds_remaining,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        self.state.is_running = false;
        tracing::debug!(phase = self.state.current_phase.as_str(), "timer paused");
        Some(Event::TimerPaused {
            phase: self.state.current_phase,
            remaining_secs: self.state.seconds_remaining,
            at: Utc::now(),
        })
    }

    pub fn toggle(&mut self) -> Option<Event> {
        if self.state.is_running {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Back to the initial snapshot, paused.
    pub fn reset(&mut self) -> Option<Event> {
        self.pause();
        self.state = TimerState::initial();
        tracing::debug!("timer reset");
        Some(Event::TimerReset { at: Utc::now() })
    }

    /// Advance one second. Returns `Some(Event::PhaseCompleted)` when the
    /// current phase runs out.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        if self.state.seconds_remaining > 0 {
            self.state.seconds_remaining -= 1;
        }
        if self.state.seconds_remaining == 0 {
            return Some(self.complete_phase());
        }
        None
    }

    /// Apply `elapsed_secs` ticks in order, collecting every completion.
    pub fn catch_up(&mut self, elapsed_secs: u64) -> Vec<Event> {
        let mut events = Vec::new();
        for _ in 0..elapsed_secs {
            if !self.state.is_running {
                break;
            }
            events.extend(self.tick());
        }
        events
    }

    /// Finish the current phase right now, exactly as if it had run out.
    /// The next phase starts running.
    pub fn skip_phase(&mut self) -> Option<Event> {
        self.state.seconds_remaining = 0;
        Some(self.complete_phase())
    }

    /// Jump to a position on the timeline. Indices outside the rotation are
    /// ignored.
    pub fn jump_to_phase(&mut self, index: usize) -> Option<Event> {
        let step = cycle::step(index)?;
        self.pause();
        self.state.current_phase = step.phase;
        self.state.completed_focus_sessions = step.completed_focus_sessions;
        self.state.seconds_remaining = step.duration_secs();
        tracing::debug!(index, phase = step.phase.as_str(), "jumped to phase");
        Some(Event::PhaseJumped {
            cycle_index: index,
            phase: step.phase,
            completed_focus_sessions: step.completed_focus_sessions,
            at: Utc::now(),
        })
    }

    /// Pause and restore the full duration of the current phase.
    pub fn reset_current_phase(&mut self) -> Option<Event> {
        self.pause();
        self.state.seconds_remaining = self.state.total_seconds();
        Some(Event::PhaseRestarted {
            phase: self.state.current_phase,
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_phase(&mut self) -> Event {
        let completed = self.state.current_phase;
        let (next, sessions) = cycle::advance(completed, self.state.completed_focus_sessions);
        self.state.current_phase = next;
        self.state.completed_focus_sessions = sessions;
        self.state.seconds_remaining = next.duration_secs();
        self.state.is_running = true;
        tracing::info!(
            completed = completed.as_str(),
            next = next.as_str(),
            sessions,
            "phase completed"
        );
        self.notifier.notify(next);
        Event::PhaseCompleted {
            completed,
            next,
            completed_focus_sessions: sessions,
            at: Utc::now(),
        }
    }
}
