//! Tokio driver for [`TimerEngine`].
//!
//! A single actor task owns the engine. Callers talk to it through a
//! cloneable [`TimerHandle`]; every mutation goes through the actor's command
//! channel, so ticks and user commands can never interleave.
//!
//! The actor owns the tick source too. An interval exists only while the
//! engine is running and is dropped as soon as a command leaves it paused,
//! so no tick is delivered after a pause.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::notify::Notifier;
use crate::timer::{CycleSegment, TimerEngine, TimerState, CYCLE_LEN};

const COMMAND_CHANNEL_CAPACITY: usize = 32;
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Default tick cadence.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

type Reply<T> = oneshot::Sender<T>;

#[derive(Debug)]
enum Command {
    Start(Reply<Option<Event>>),
    Pause(Reply<Option<Event>>),
    Toggle(Reply<Option<Event>>),
    Reset(Reply<Option<Event>>),
    SkipPhase(Reply<Option<Event>>),
    JumpToPhase(usize, Reply<Option<Event>>),
    ResetCurrentPhase(Reply<Option<Event>>),
    Snapshot(Reply<Event>),
    Segments(Reply<[CycleSegment; CYCLE_LEN]>),
    Shutdown,
}

/// Cloneable handle to a running timer actor.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<Event>,
    state: watch::Receiver<TimerState>,
}

impl TimerHandle {
    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| CoreError::Runtime("command channel closed".into()))?;
        rx.await
            .map_err(|_| CoreError::Runtime("actor dropped reply".into()))
    }

    pub async fn start(&self) -> Result<Option<Event>> {
        self.request(Command::Start).await
    }

    pub async fn pause(&self) -> Result<Option<Event>> {
        self.request(Command::Pause).await
    }

    pub async fn toggle(&self) -> Result<Option<Event>> {
        self.request(Command::Toggle).await
    }

    pub async fn reset(&self) -> Result<Option<Event>> {
        self.request(Command::Reset).await
    }

    pub async fn skip_phase(&self) -> Result<Option<Event>> {
        self.request(Command::SkipPhase).await
    }

    pub async fn jump_to_phase(&self, index: usize) -> Result<Option<Event>> {
        self.request(|tx| Command::JumpToPhase(index, tx)).await
    }

    pub async fn reset_current_phase(&self) -> Result<Option<Event>> {
        self.request(Command::ResetCurrentPhase).await
    }

    pub async fn snapshot(&self) -> Result<Event> {
        self.request(Command::Snapshot).await
    }

    pub async fn segments(&self) -> Result<[CycleSegment; CYCLE_LEN]> {
        self.request(Command::Segments).await
    }

    /// Latest published state. Updated after every command and tick.
    pub fn state(&self) -> TimerState {
        *self.state.borrow()
    }

    /// Receiver that wakes whenever the state changes.
    pub fn watch(&self) -> watch::Receiver<TimerState> {
        self.state.clone()
    }

    /// Every event the engine produces, including phase completions.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Ask the actor to stop. Pending commands queued before this one are
    /// still handled.
    pub async fn shutdown(&self) -> Result<()> {
        self.commands
            .send(Command::Shutdown)
            .await
            .map_err(|_| CoreError::Runtime("command channel closed".into()))
    }
}

/// Spawn the actor on the current tokio runtime.
///
/// The join handle resolves to the final state once the actor stops, which
/// happens on [`TimerHandle::shutdown`] or when every handle is dropped.
pub fn spawn<N>(engine: TimerEngine<N>, tick_interval: Duration) -> (TimerHandle, JoinHandle<TimerState>)
where
    N: Notifier + Send + 'static,
{
    let (commands, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let (state_tx, state_rx) = watch::channel(*engine.state());

    let actor = TimerActor {
        engine,
        commands: rx,
        events: events.clone(),
        state: state_tx,
        tick_interval: tick_interval.max(Duration::from_millis(1)),
        ticker: None,
    };
    let join = tokio::spawn(actor.run());

    let handle = TimerHandle {
        commands,
        events,
        state: state_rx,
    };
    (handle, join)
}

struct TimerActor<N> {
    engine: TimerEngine<N>,
    commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<Event>,
    state: watch::Sender<TimerState>,
    tick_interval: Duration,
    ticker: Option<Interval>,
}

impl<N: Notifier> TimerActor<N> {
    async fn run(mut self) -> TimerState {
        tracing::debug!(interval_ms = self.tick_interval.as_millis() as u64, "timer actor started");
        self.sync_ticker();

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.handle(cmd),
                },
                _ = next_tick(&mut self.ticker), if self.ticker.is_some() => {
                    let event = self.engine.tick();
                    self.publish(event);
                }
            }
            self.sync_ticker();
        }

        tracing::debug!("timer actor stopped");
        *self.engine.state()
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Start(reply) => {
                let event = self.engine.start();
                self.reply(reply, event);
            }
            Command::Pause(reply) => {
                let event = self.engine.pause();
                self.reply(reply, event);
            }
            Command::Toggle(reply) => {
                let event = self.engine.toggle();
                self.reply(reply, event);
            }
            Command::Reset(reply) => {
                let event = self.engine.reset();
                self.reply(reply, event);
            }
            Command::SkipPhase(reply) => {
                let event = self.engine.skip_phase();
                self.reply(reply, event);
            }
            Command::JumpToPhase(index, reply) => {
                let event = self.engine.jump_to_phase(index);
                self.reply(reply, event);
            }
            Command::ResetCurrentPhase(reply) => {
                let event = self.engine.reset_current_phase();
                self.reply(reply, event);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.engine.snapshot());
            }
            Command::Segments(reply) => {
                let _ = reply.send(self.engine.segments());
            }
            Command::Shutdown => {}
        }
    }

    fn reply(&mut self, reply: Reply<Option<Event>>, event: Option<Event>) {
        self.publish(event.clone());
        let _ = reply.send(event);
    }

    fn publish(&mut self, event: Option<Event>) {
        self.state.send_if_modified(|current| {
            let next = *self.engine.state();
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        if let Some(event) = event {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
    }

    /// Arm the interval when the engine runs, drop it when it does not.
    fn sync_ticker(&mut self) {
        match (self.engine.is_running(), self.ticker.is_some()) {
            (true, false) => {
                let mut ticker = interval_at(Instant::now() + self.tick_interval, self.tick_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.ticker = Some(ticker);
            }
            (false, true) => self.ticker = None,
            _ => {}
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NullNotifier, RecordingNotifier};
    use crate::timer::Phase;

    #[tokio::test(start_paused = true)]
    async fn commands_reply_with_events() {
        let (handle, _join) = spawn(TimerEngine::new(NullNotifier), TICK_INTERVAL);
        assert!(handle.start().await.unwrap().is_some());
        assert!(handle.start().await.unwrap().is_none());
        assert!(handle.state().is_running);
        assert!(handle.jump_to_phase(42).await.unwrap().is_none());
        assert!(handle.jump_to_phase(7).await.unwrap().is_some());
        assert_eq!(handle.state().current_phase, Phase::LongBreak);
        assert!(!handle.state().is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_only_while_running() {
        let (handle, _join) = spawn(TimerEngine::new(NullNotifier), TICK_INTERVAL);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.state().seconds_remaining, 1500);

        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(handle.state().seconds_remaining, 1490);

        handle.pause().await.unwrap();
        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(handle.state().seconds_remaining, 1490);
        assert!(!handle.state().is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_is_broadcast_and_notified() {
        let notifier = RecordingNotifier::new();
        let (handle, join) = spawn(TimerEngine::new(notifier.clone()), TICK_INTERVAL);
        let mut events = handle.subscribe();

        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1_500_500)).await;

        let state = handle.state();
        assert_eq!(state.current_phase, Phase::ShortBreak);
        assert_eq!(state.seconds_remaining, 300);
        assert!(state.is_running);
        assert_eq!(notifier.phases(), vec![Phase::ShortBreak]);

        let mut completed = 0;
        while let Ok(ev) = events.try_recv() {
            if matches!(ev, Event::PhaseCompleted { .. }) {
                completed += 1;
            }
        }
        assert_eq!(completed, 1);

        handle.shutdown().await.unwrap();
        let final_state = join.await.unwrap();
        assert_eq!(final_state.current_phase, Phase::ShortBreak);
    }

    #[tokio::test(start_paused = true)]
    async fn actor_stops_when_handles_dropped() {
        let (handle, join) = spawn(TimerEngine::new(NullNotifier), TICK_INTERVAL);
        handle.start().await.unwrap();
        drop(handle);
        let state = join.await.unwrap();
        assert!(state.is_running);
    }
}
