//! # Cadence Core Library
//!
//! This library provides the scheduling logic for the Cadence Pomodoro timer:
//! a fixed rotation of four focus blocks, three short breaks and one long
//! break. Every front end (the CLI, a menu-bar app, a window) is a consumer
//! of the same engine and its read-only projections.
//!
//! ## Architecture
//!
//! - **Phase clock**: [`TimerEngine`], a tick-driven state machine. The caller
//!   delivers one `tick()` per second while it runs
//! - **Cycle scheduler**: [`timer::cycle`], the transition rule and the
//!   canonical eight-step table
//! - **Timeline**: [`timer::timeline`], positional segments for display
//! - **Runtime**: [`runtime`], a tokio actor that owns the engine and its
//!   tick source
//! - **Storage**: TOML configuration and a SQLite store for saved state and
//!   transition history
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`Notifier`]: Port called once per phase change
//! - [`Database`]: State persistence and statistics
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod notify;
pub mod runtime;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError};
pub use events::Event;
pub use notify::{LogNotifier, Notifier, NullNotifier, RecordingNotifier};
pub use runtime::TimerHandle;
pub use storage::{Config, Database, Stats};
pub use timer::{CycleSegment, CycleStep, Phase, TimerEngine, TimerState};
