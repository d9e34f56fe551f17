pub mod cycle;
mod engine;
mod phase;
mod state;
pub mod timeline;

pub use cycle::{advance, cycle_index, CycleStep, CYCLE, CYCLE_LEN, SESSIONS_PER_CYCLE};
pub use engine::TimerEngine;
pub use phase::Phase;
pub use state::TimerState;
pub use timeline::{render_bar, segments, CycleSegment};
