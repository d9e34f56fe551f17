use std::io::Write;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::Subcommand;
use cadence_core::storage::Database;
use cadence_core::timer::render_bar;
use cadence_core::{runtime, Config, Event, Notifier, NullNotifier, TimerEngine, TimerState};

use crate::notifier::TerminalNotifier;

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start (or resume) the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Start if paused, pause if running
    Toggle,
    /// Back to the first focus block, paused
    Reset,
    /// Finish the current phase now and move to the next one
    Skip,
    /// Jump to a position (0-7) on the cycle timeline
    Jump {
        /// Cycle index: 0 = first focus, 7 = long break
        index: usize,
    },
    /// Restart the current phase from its full duration
    RestartPhase,
    /// Print current timer state as JSON
    Status,
    /// Show the eight-step cycle timeline
    Timeline {
        /// Print segments as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the timer in the foreground until interrupted
    Run {
        /// Tick interval in milliseconds (defaults to runtime.tick_interval_ms)
        #[arg(long)]
        tick_ms: Option<u64>,
    },
}

/// Saved timer brought up to date with wall-clock time.
struct Loaded {
    engine: TimerEngine<TerminalNotifier>,
    /// Instant the remaining time is measured from. Carries sub-second
    /// remainders across invocations while running.
    anchor: DateTime<Utc>,
    caught_up: Vec<Event>,
}

fn load_engine(db: &Database, notifier: TerminalNotifier) -> CliResult<Loaded> {
    let now = Utc::now();
    let Some(saved) = db.load_timer()? else {
        return Ok(Loaded {
            engine: TimerEngine::new(notifier),
            anchor: now,
            caught_up: Vec::new(),
        });
    };

    let mut anchor = now;
    let mut state = saved.state;
    let mut caught_up = Vec::new();
    if state.is_running {
        let elapsed = (now - saved.saved_at).num_seconds().max(0);
        // Replay silently; only the phase we land in is announced.
        let mut replay = TimerEngine::from_state(state, NullNotifier);
        caught_up = replay.catch_up(elapsed as u64);
        state = *replay.state();
        anchor = saved.saved_at + chrono::Duration::seconds(elapsed);
        tracing::debug!(elapsed, completions = caught_up.len(), "caught up saved timer");
    }

    let engine = TimerEngine::from_state(state, notifier);
    if caught_up.iter().any(|e| matches!(e, Event::PhaseCompleted { .. })) {
        engine.notifier().notify(engine.phase());
    }
    for event in &caught_up {
        db.record_event(event)?;
    }
    Ok(Loaded {
        engine,
        anchor,
        caught_up,
    })
}

fn save_engine(db: &Database, state: &TimerState, anchor: DateTime<Utc>) -> CliResult {
    let saved_at = if state.is_running { anchor } else { Utc::now() };
    db.save_timer(state, saved_at)?;
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the command's event, or a snapshot when the command changed nothing.
fn print_outcome(event: Option<Event>, engine: &TimerEngine<TerminalNotifier>) -> CliResult {
    match event {
        Some(event) => print_json(&event),
        None => print_json(&engine.snapshot()),
    }
}

pub fn run(action: TimerAction) -> CliResult {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let Loaded {
        mut engine,
        mut anchor,
        caught_up,
    } = load_engine(&db, TerminalNotifier::new(config.notifications.clone()))?;

    match action {
        TimerAction::Start => {
            let event = engine.start();
            if event.is_some() {
                anchor = Utc::now();
            }
            print_outcome(event, &engine)?;
        }
        TimerAction::Pause => print_outcome(engine.pause(), &engine)?,
        TimerAction::Toggle => {
            let event = engine.toggle();
            if engine.is_running() {
                anchor = Utc::now();
            }
            print_outcome(event, &engine)?;
        }
        TimerAction::Reset => print_outcome(engine.reset(), &engine)?,
        TimerAction::Skip => {
            let event = engine.skip_phase();
            if let Some(ref event) = event {
                db.record_event(event)?;
            }
            anchor = Utc::now();
            print_outcome(event, &engine)?;
        }
        TimerAction::Jump { index } => {
            if index >= cadence_core::timer::CYCLE_LEN {
                tracing::warn!(index, "cycle index out of range, ignored");
            }
            print_outcome(engine.jump_to_phase(index), &engine)?;
        }
        TimerAction::RestartPhase => print_outcome(engine.reset_current_phase(), &engine)?,
        TimerAction::Status => {
            print_json(&engine.snapshot())?;
            for event in &caught_up {
                print_json(event)?;
            }
        }
        TimerAction::Timeline { json } => {
            if json {
                print_json(&engine.segments())?;
            } else {
                print_timeline(&engine);
            }
        }
        TimerAction::Run { tick_ms } => {
            let tick = Duration::from_millis(tick_ms.unwrap_or(config.runtime.tick_interval_ms));
            if config.runtime.auto_start_on_run {
                engine.start();
            }
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let final_state = rt.block_on(run_foreground(&db, engine, tick))?;
            save_engine(&db, &final_state, Utc::now())?;
            print_json(&final_state)?;
            return Ok(());
        }
    }

    save_engine(&db, engine.state(), anchor)?;
    Ok(())
}

fn print_timeline(engine: &TimerEngine<TerminalNotifier>) {
    let state = engine.state();
    println!("{}", render_bar(state, 6));
    for seg in engine.segments() {
        let marker = if seg.is_active {
            ">"
        } else if seg.is_completed {
            "x"
        } else {
            " "
        };
        let detail = if seg.is_active {
            format!(" {} left ({:.0}%)", state.format_remaining(), seg.progress_fraction * 100.0)
        } else {
            String::new()
        };
        println!("{marker} {} {}{detail}", seg.index, seg.phase.name());
    }
}

/// Drive the engine through the runtime actor until Ctrl-C, redrawing a
/// status line on every change and persisting each completed phase.
async fn run_foreground(
    db: &Database,
    engine: TimerEngine<TerminalNotifier>,
    tick: Duration,
) -> CliResult<TimerState> {
    let (handle, join) = runtime::spawn(engine, tick);
    let mut state_rx = handle.watch();
    let mut events = handle.subscribe();

    // One listener for the whole loop so a SIGINT during a redraw is kept.
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    draw_status(&handle.state());
    loop {
        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *state_rx.borrow_and_update();
                draw_status(&state);
            }
            event = events.recv() => match event {
                Ok(event) => {
                    if db.record_event(&event)?.is_some() {
                        db.save_timer(&handle.state(), Utc::now())?;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "event stream lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            _ = &mut ctrl_c => {
                eprintln!();
                break;
            }
        }
    }

    // The actor may already be gone if its channels closed.
    let _ = handle.shutdown().await;
    let state = join.await?;
    Ok(state)
}

fn draw_status(state: &TimerState) {
    let run_flag = if state.is_running { "running" } else { "paused" };
    let mut stderr = std::io::stderr().lock();
    let _ = write!(
        stderr,
        "\r{:<11} {}  [{}/4]  {}  {}",
        state.current_phase.name(),
        state.format_remaining(),
        state.display_completed_sessions(),
        render_bar(state, 3),
        run_flag,
    );
    let _ = stderr.flush();
}
