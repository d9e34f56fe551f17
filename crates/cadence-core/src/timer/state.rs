use serde::{Deserialize, Serialize};

use super::cycle::{self, SESSIONS_PER_CYCLE};
use super::phase::Phase;

/// The mutable aggregate behind the phase clock.
///
/// Only [`TimerEngine`](super::TimerEngine) mutates it. Everything else reads
/// it through the derived views below, which are recomputed on each call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub current_phase: Phase,
    pub seconds_remaining: u32,
    pub is_running: bool,
    /// Focus phases finished since the last long break, in `0..=3`.
    pub completed_focus_sessions: u8,
}

impl TimerState {
    /// Fresh state: paused at the start of the first focus block.
    pub const fn initial() -> Self {
        Self {
            current_phase: Phase::Focus,
            seconds_remaining: Phase::Focus.duration_secs(),
            is_running: false,
            completed_focus_sessions: 0,
        }
    }

    pub fn total_seconds(&self) -> u32 {
        self.current_phase.duration_secs()
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self) -> f64 {
        let total = self.total_seconds();
        if total == 0 {
            return 0.0;
        }
        let elapsed = total.saturating_sub(self.seconds_remaining);
        (f64::from(elapsed) / f64::from(total)).clamp(0.0, 1.0)
    }

    pub fn cycle_index(&self) -> usize {
        cycle::cycle_index(self.current_phase, self.completed_focus_sessions)
    }

    /// Session count for dot-style displays. A long break shows the full
    /// cycle even though the stored counter is already back at zero.
    pub fn display_completed_sessions(&self) -> u8 {
        if self.current_phase == Phase::LongBreak {
            SESSIONS_PER_CYCLE
        } else {
            self.completed_focus_sessions
        }
    }

    /// Remaining time as `MM:SS`.
    pub fn format_remaining(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.seconds_remaining / 60,
            self.seconds_remaining % 60
        )
    }

    /// Pull out-of-range values (e.g. from a hand-edited store) back inside
    /// the invariants.
    pub fn normalized(mut self) -> Self {
        self.completed_focus_sessions = self.completed_focus_sessions.min(SESSIONS_PER_CYCLE - 1);
        if self.current_phase == Phase::LongBreak {
            self.completed_focus_sessions = 0;
        }
        self.seconds_remaining = self.seconds_remaining.min(self.total_seconds());
        self
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_snapshot() {
        let s = TimerState::initial();
        assert_eq!(s.current_phase, Phase::Focus);
        assert_eq!(s.seconds_remaining, 1500);
        assert!(!s.is_running);
        assert_eq!(s.completed_focus_sessions, 0);
    }

    #[test]
    fn progress_halfway() {
        let mut s = TimerState::initial();
        assert_eq!(s.progress(), 0.0);
        s.seconds_remaining = s.total_seconds() / 2;
        let p = s.progress();
        assert!(p > 0.49 && p < 0.51);
        s.seconds_remaining = 0;
        assert_eq!(s.progress(), 1.0);
    }

    #[test]
    fn display_sessions_is_four_during_long_break() {
        let s = TimerState {
            current_phase: Phase::LongBreak,
            seconds_remaining: 900,
            is_running: true,
            completed_focus_sessions: 0,
        };
        assert_eq!(s.display_completed_sessions(), 4);

        let s = TimerState {
            completed_focus_sessions: 2,
            ..TimerState::initial()
        };
        assert_eq!(s.display_completed_sessions(), 2);
    }

    #[test]
    fn format_pads() {
        let mut s = TimerState::initial();
        assert_eq!(s.format_remaining(), "25:00");
        s.seconds_remaining = 65;
        assert_eq!(s.format_remaining(), "01:05");
    }

    #[test]
    fn normalized_clamps() {
        let s = TimerState {
            current_phase: Phase::ShortBreak,
            seconds_remaining: 10_000,
            is_running: false,
            completed_focus_sessions: 9,
        }
        .normalized();
        assert_eq!(s.seconds_remaining, 300);
        assert_eq!(s.completed_focus_sessions, 3);
    }
}
