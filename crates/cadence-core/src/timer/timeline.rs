//! Read-only projection of the rotation for display code.

use serde::{Deserialize, Serialize};

use super::cycle::{CYCLE, CYCLE_LEN};
use super::phase::Phase;
use super::state::TimerState;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleSegment {
    pub phase: Phase,
    pub index: usize,
    pub is_active: bool,
    pub is_completed: bool,
    /// Live progress for the active segment, 0 otherwise. Completed segments
    /// are drawn full regardless of this value.
    pub progress_fraction: f64,
}

/// All eight segments, recomputed from `state` on every call.
pub fn segments(state: &TimerState) -> [CycleSegment; CYCLE_LEN] {
    let active = state.cycle_index();
    let progress = state.progress();
    std::array::from_fn(|index| CycleSegment {
        phase: CYCLE[index].phase,
        index,
        is_active: index == active,
        is_completed: index < active,
        progress_fraction: if index == active { progress } else { 0.0 },
    })
}

/// Text rendering of the timeline, `cell_width` characters per segment.
///
/// Completed segments are `#`, upcoming ones `.`, and the active one is
/// filled with `#` up to its progress, then `-`.
pub fn render_bar(state: &TimerState, cell_width: usize) -> String {
    let cell_width = cell_width.max(1);
    segments(state)
        .iter()
        .map(|seg| {
            let filled = if seg.is_completed {
                cell_width
            } else if seg.is_active {
                (seg.progress_fraction * cell_width as f64).floor() as usize
            } else {
                0
            };
            let rest = if seg.is_active { '-' } else { '.' };
            let mut cell = "#".repeat(filled.min(cell_width));
            cell.extend(std::iter::repeat(rest).take(cell_width - filled.min(cell_width)));
            cell
        })
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_has_first_segment_active() {
        let segs = segments(&TimerState::initial());
        assert_eq!(segs.len(), 8);
        assert!(segs[0].is_active);
        assert_eq!(segs.iter().filter(|s| s.is_active).count(), 1);
        assert!(segs.iter().all(|s| !s.is_completed));
        assert_eq!(segs[7].phase, Phase::LongBreak);
    }

    #[test]
    fn earlier_segments_are_completed() {
        let state = TimerState {
            current_phase: Phase::Focus,
            seconds_remaining: 750,
            is_running: true,
            completed_focus_sessions: 2,
        };
        let segs = segments(&state);
        assert_eq!(state.cycle_index(), 4);
        for seg in &segs[..4] {
            assert!(seg.is_completed);
            assert_eq!(seg.progress_fraction, 0.0);
        }
        assert!(segs[4].is_active);
        assert!((segs[4].progress_fraction - 0.5).abs() < 1e-9);
        assert!(segs[5..].iter().all(|s| !s.is_active && !s.is_completed));
    }

    #[test]
    fn bar_rendering() {
        let state = TimerState {
            current_phase: Phase::ShortBreak,
            seconds_remaining: 150,
            is_running: false,
            completed_focus_sessions: 1,
        };
        let bar = render_bar(&state, 4);
        assert_eq!(bar, "####|##--|....|....|....|....|....|....");
    }
}
