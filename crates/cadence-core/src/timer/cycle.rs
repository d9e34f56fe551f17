//! The fixed eight-step rotation and the transition rule over it.
//!
//! ```text
//! Focus(0) -> Short -> Focus(1) -> Short -> Focus(2) -> Short -> Focus(3) -> Long
//! ```
//!
//! [`CYCLE`] is the only place the rotation order is written down. Both
//! [`cycle_index`] and the timeline projection read from it.

use serde::{Deserialize, Serialize};

use super::phase::Phase;

/// Focus completions that trigger the long break.
pub const SESSIONS_PER_CYCLE: u8 = 4;

/// Number of positions in the rotation.
pub const CYCLE_LEN: usize = 8;

/// One position in the rotation together with the session count the timer
/// holds while sitting at that position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStep {
    pub phase: Phase,
    pub completed_focus_sessions: u8,
}

impl CycleStep {
    const fn new(phase: Phase, completed_focus_sessions: u8) -> Self {
        Self {
            phase,
            completed_focus_sessions,
        }
    }

    pub const fn duration_secs(&self) -> u32 {
        self.phase.duration_secs()
    }
}

pub const CYCLE: [CycleStep; CYCLE_LEN] = [
    CycleStep::new(Phase::Focus, 0),
    CycleStep::new(Phase::ShortBreak, 1),
    CycleStep::new(Phase::Focus, 1),
    CycleStep::new(Phase::ShortBreak, 2),
    CycleStep::new(Phase::Focus, 2),
    CycleStep::new(Phase::ShortBreak, 3),
    CycleStep::new(Phase::Focus, 3),
    CycleStep::new(Phase::LongBreak, 0),
];

/// Table entry at `index`, or `None` when out of range.
pub fn step(index: usize) -> Option<CycleStep> {
    CYCLE.get(index).copied()
}

/// Phase and session count that follow the completion of `current`.
pub fn advance(current: Phase, completed_focus_sessions: u8) -> (Phase, u8) {
    match current {
        Phase::Focus => {
            let sessions = completed_focus_sessions.saturating_add(1);
            if sessions >= SESSIONS_PER_CYCLE {
                (Phase::LongBreak, 0)
            } else {
                (Phase::ShortBreak, sessions)
            }
        }
        Phase::ShortBreak | Phase::LongBreak => (Phase::Focus, completed_focus_sessions),
    }
}

/// Position of `(phase, sessions)` within the rotation, always in `0..=7`.
///
/// Pairs present in [`CYCLE`] resolve to their table position. Anything else
/// falls back to the arithmetic position clamped into range.
pub fn cycle_index(phase: Phase, completed_focus_sessions: u8) -> usize {
    CYCLE
        .iter()
        .position(|s| s.phase == phase && s.completed_focus_sessions == completed_focus_sessions)
        .unwrap_or_else(|| formula_index(phase, completed_focus_sessions))
}

fn formula_index(phase: Phase, completed_focus_sessions: u8) -> usize {
    let sessions = i64::from(completed_focus_sessions);
    let raw = match phase {
        Phase::LongBreak => return CYCLE_LEN - 1,
        Phase::ShortBreak => 2 * sessions - 1,
        Phase::Focus => 2 * sessions,
    };
    raw.clamp(0, CYCLE_LEN as i64 - 1) as usize
}
