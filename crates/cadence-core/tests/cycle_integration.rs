//! Integration tests for the full rotation driven through the public API.

use cadence_core::timer::{segments, CYCLE};
use cadence_core::{Event, Phase, RecordingNotifier, TimerEngine, TimerState};

/// Tick until the current phase completes, returning the completion event.
fn run_out(engine: &mut TimerEngine<RecordingNotifier>) -> Event {
    let before = engine.state().seconds_remaining;
    for _ in 0..before {
        if let Some(ev) = engine.tick() {
            return ev;
        }
    }
    panic!("phase did not complete within {before} ticks");
}

#[test]
fn test_full_cycle_by_ticking_alone() {
    let notifier = RecordingNotifier::new();
    let mut engine = TimerEngine::new(notifier.clone());
    engine.start();

    let mut visited = vec![engine.phase()];
    let mut indices = vec![engine.cycle_index()];
    for _ in 0..7 {
        run_out(&mut engine);
        visited.push(engine.phase());
        indices.push(engine.cycle_index());
        assert!(engine.is_running(), "next phase auto-starts");
        assert_eq!(engine.state().seconds_remaining, engine.phase().duration_secs());
    }

    assert_eq!(
        visited,
        vec![
            Phase::Focus,
            Phase::ShortBreak,
            Phase::Focus,
            Phase::ShortBreak,
            Phase::Focus,
            Phase::ShortBreak,
            Phase::Focus,
            Phase::LongBreak,
        ]
    );
    assert_eq!(indices, (0..8).collect::<Vec<_>>());
    assert_eq!(engine.state().completed_focus_sessions, 0);
    assert_eq!(engine.state().display_completed_sessions(), 4);

    // Long break hands back to the first focus block.
    run_out(&mut engine);
    assert_eq!(engine.phase(), Phase::Focus);
    assert_eq!(engine.cycle_index(), 0);
    assert_eq!(engine.state().seconds_remaining, 1500);

    assert_eq!(notifier.count(), 8);
    assert_eq!(notifier.phases()[6], Phase::LongBreak);
}

#[test]
fn test_natural_pairs_match_table() {
    let mut engine = TimerEngine::new(RecordingNotifier::new());
    engine.start();
    for (index, step) in CYCLE.iter().enumerate() {
        assert_eq!(engine.phase(), step.phase);
        assert_eq!(engine.state().completed_focus_sessions, step.completed_focus_sessions);
        assert_eq!(engine.cycle_index(), index);
        run_out(&mut engine);
    }
}

#[test]
fn test_jump_then_continue_ticking() {
    let notifier = RecordingNotifier::new();
    let mut engine = TimerEngine::new(notifier.clone());

    engine.jump_to_phase(6);
    assert!(!engine.is_running());
    assert_eq!(notifier.count(), 0);

    engine.start();
    let ev = run_out(&mut engine);
    match ev {
        Event::PhaseCompleted {
            completed,
            next,
            completed_focus_sessions,
            ..
        } => {
            assert_eq!(completed, Phase::Focus);
            assert_eq!(next, Phase::LongBreak);
            assert_eq!(completed_focus_sessions, 0);
        }
        other => panic!("expected PhaseCompleted, got {other:?}"),
    }
    assert_eq!(notifier.phases(), vec![Phase::LongBreak]);
}

#[test]
fn test_timeline_tracks_engine() {
    let mut engine = TimerEngine::new(RecordingNotifier::new());
    engine.jump_to_phase(2);
    engine.start();
    for _ in 0..750 {
        engine.tick();
    }

    let segs = engine.segments();
    let active: Vec<_> = segs.iter().filter(|s| s.is_active).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].index, engine.cycle_index());
    assert!((active[0].progress_fraction - 0.5).abs() < 1e-9);
    assert_eq!(segs.iter().filter(|s| s.is_completed).count(), 2);

    // Derived views are pure over the state value.
    assert_eq!(segs, segments(engine.state()));
}

#[test]
fn test_reset_from_anywhere() {
    for index in 0..8 {
        let mut engine = TimerEngine::new(RecordingNotifier::new());
        engine.jump_to_phase(index);
        engine.start();
        engine.tick();
        engine.reset();
        assert_eq!(*engine.state(), TimerState::initial());
    }
}

#[test]
fn test_state_roundtrips_through_json() {
    let mut engine = TimerEngine::new(RecordingNotifier::new());
    engine.jump_to_phase(3);
    engine.start();
    engine.tick();

    let json = serde_json::to_string(engine.state()).unwrap();
    let restored: TimerState = serde_json::from_str(&json).unwrap();
    let rebuilt = TimerEngine::from_state(restored, RecordingNotifier::new());
    assert_eq!(rebuilt.state(), engine.state());
    assert_eq!(rebuilt.cycle_index(), 3);
}
