use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Every state change in the system produces an Event.
/// Display code subscribes to them; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// A phase ran out (or was skipped) and the next one began.
    PhaseCompleted {
        completed: Phase,
        next: Phase,
        completed_focus_sessions: u8,
        at: DateTime<Utc>,
    },
    /// User moved to a position on the timeline.
    PhaseJumped {
        cycle_index: usize,
        phase: Phase,
        completed_focus_sessions: u8,
        at: DateTime<Utc>,
    },
    /// Current phase restarted from its full duration.
    PhaseRestarted {
        phase: Phase,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        phase_name: String,
        is_running: bool,
        remaining_secs: u32,
        remaining_display: String,
        total_secs: u32,
        progress: f64,
        completed_focus_sessions: u8,
        display_completed_sessions: u8,
        cycle_index: usize,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_json() {
        let ev = Event::PhaseCompleted {
            completed: Phase::Focus,
            next: Phase::ShortBreak,
            completed_focus_sessions: 1,
            at: Utc::now(),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "PhaseCompleted");
        assert_eq!(json["next"], "short_break");
    }
}
