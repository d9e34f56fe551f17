//! SQLite-based state and history storage.
//!
//! Provides persistent storage for:
//! - Phase transitions (one row per natural completion)
//! - Transition statistics (daily and all-time)
//! - Key-value store for application state, such as the saved timer

use chrono::{DateTime, Local, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::data_dir;
use crate::error::{DatabaseError, Result};
use crate::events::Event;
use crate::timer::{Phase, TimerState};

const TIMER_STATE_KEY: &str = "timer_state";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub id: i64,
    pub completed: Phase,
    pub next: Phase,
    pub completed_focus_sessions: u8,
    pub at: DateTime<Utc>,
}

/// Aggregated transition history.
///
/// Minute totals are nominal: each completed phase counts its full duration,
/// so a focus block skipped early still adds 25 minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_transitions: u64,
    pub focus_sessions: u64,
    pub focus_min: u64,
    pub break_min: u64,
    /// Long breaks reached, i.e. full rotations finished.
    pub cycles_completed: u64,
    pub today_focus_sessions: u64,
    pub today_focus_min: u64,
}

/// Timer state as saved between CLI invocations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedTimer {
    pub state: TimerState,
    pub saved_at: DateTime<Utc>,
}

/// SQLite database for timer state and transition history.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/cadence.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("cadence.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS transitions (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    completed   TEXT NOT NULL,
                    next        TEXT NOT NULL,
                    sessions    INTEGER NOT NULL,
                    at          TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_transitions_at ON transitions(at);
                CREATE INDEX IF NOT EXISTS idx_transitions_completed ON transitions(completed);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    /// Record a completed phase.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_transition(
        &self,
        completed: Phase,
        next: Phase,
        completed_focus_sessions: u8,
        at: DateTime<Utc>,
    ) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO transitions (completed, next, sessions, at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    completed.as_str(),
                    next.as_str(),
                    completed_focus_sessions,
                    at.to_rfc3339(),
                ],
            )
            .map_err(DatabaseError::from)?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Record the event if it is a phase completion; other events are ignored.
    pub fn record_event(&self, event: &Event) -> Result<Option<i64>> {
        match event {
            Event::PhaseCompleted {
                completed,
                next,
                completed_focus_sessions,
                at,
            } => self
                .record_transition(*completed, *next, *completed_focus_sessions, *at)
                .map(Some),
            _ => Ok(None),
        }
    }

    /// Most recent transitions first.
    pub fn recent_transitions(&self, limit: usize) -> Result<Vec<TransitionRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, completed, next, sessions, at FROM transitions
                 ORDER BY id DESC LIMIT ?1",
            )
            .map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, u8>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(DatabaseError::from)?;

        let mut out = Vec::new();
        for row in rows {
            let (id, completed, next, sessions, at) = row.map_err(DatabaseError::from)?;
            out.push(TransitionRecord {
                id,
                completed: parse_phase(&completed)?,
                next: parse_phase(&next)?,
                completed_focus_sessions: sessions,
                at: parse_time(&at)?,
            });
        }
        Ok(out)
    }

    /// Compute all-time and today's statistics.
    ///
    /// "Today" is the local calendar day.
    pub fn stats(&self) -> Result<Stats> {
        let today_start = Local::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .and_then(|naive| Local.from_local_datetime(&naive).earliest())
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        self.stats_since(today_start)
    }

    /// Statistics where "today" means at or after `day_start`.
    pub fn stats_since(&self, day_start: DateTime<Utc>) -> Result<Stats> {
        let mut stats = Stats::default();
        let mut stmt = self
            .conn
            .prepare("SELECT completed, next, at FROM transitions")
            .map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(DatabaseError::from)?;

        for row in rows {
            let (completed, next, at) = row.map_err(DatabaseError::from)?;
            let completed = parse_phase(&completed)?;
            let next = parse_phase(&next)?;
            let at = parse_time(&at)?;
            let minutes = u64::from(completed.duration_secs() / 60);

            stats.total_transitions += 1;
            if completed.is_focus() {
                stats.focus_sessions += 1;
                stats.focus_min += minutes;
                if at >= day_start {
                    stats.today_focus_sessions += 1;
                    stats.today_focus_min += minutes;
                }
            } else {
                stats.break_min += minutes;
            }
            if next == Phase::LongBreak {
                stats.cycles_completed += 1;
            }
        }
        Ok(stats)
    }

    // ── Key-value store ──────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(DatabaseError::from)?;
        Ok(value)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    /// Load the saved timer, if any. An unreadable value is treated as absent.
    pub fn load_timer(&self) -> Result<Option<SavedTimer>> {
        let Some(json) = self.kv_get(TIMER_STATE_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&json) {
            Ok(saved) => Ok(Some(saved)),
            Err(e) => {
                tracing::warn!("discarding unreadable saved timer: {e}");
                Ok(None)
            }
        }
    }

    pub fn save_timer(&self, state: &TimerState, saved_at: DateTime<Utc>) -> Result<()> {
        let json = serde_json::to_string(&SavedTimer {
            state: *state,
            saved_at,
        })?;
        self.kv_set(TIMER_STATE_KEY, &json)
    }
}

fn parse_phase(s: &str) -> Result<Phase> {
    s.parse::<Phase>()
        .map_err(|e| DatabaseError::QueryFailed(e).into())
}

fn parse_time(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DatabaseError::QueryFailed(format!("bad timestamp '{s}': {e}")).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    #[test]
    fn kv_roundtrip() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.kv_get("missing").unwrap(), None);
        db.kv_set("a", "1").unwrap();
        db.kv_set("a", "2").unwrap();
        assert_eq!(db.kv_get("a").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn timer_state_roundtrip() {
        let db = Database::open_memory().unwrap();
        assert!(db.load_timer().unwrap().is_none());

        let state = TimerState {
            current_phase: Phase::ShortBreak,
            seconds_remaining: 42,
            is_running: true,
            completed_focus_sessions: 2,
        };
        let now = Utc::now();
        db.save_timer(&state, now).unwrap();
        let saved = db.load_timer().unwrap().unwrap();
        assert_eq!(saved.state, state);
        assert_eq!(saved.saved_at.timestamp(), now.timestamp());
    }

    #[test]
    fn garbage_timer_state_is_ignored() {
        let db = Database::open_memory().unwrap();
        db.kv_set(TIMER_STATE_KEY, "{not json").unwrap();
        assert!(db.load_timer().unwrap().is_none());
    }

    #[test]
    fn stats_count_focus_and_cycles() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        let yesterday = now - Duration::days(1);

        db.record_transition(Phase::Focus, Phase::ShortBreak, 1, yesterday).unwrap();
        db.record_transition(Phase::ShortBreak, Phase::Focus, 1, yesterday).unwrap();
        db.record_transition(Phase::Focus, Phase::LongBreak, 0, now).unwrap();

        let stats = db.stats_since(now - Duration::hours(1)).unwrap();
        assert_eq!(stats.total_transitions, 3);
        assert_eq!(stats.focus_sessions, 2);
        assert_eq!(stats.focus_min, 50);
        assert_eq!(stats.break_min, 5);
        assert_eq!(stats.cycles_completed, 1);
        assert_eq!(stats.today_focus_sessions, 1);
        assert_eq!(stats.today_focus_min, 25);
    }

    #[test]
    fn skipped_phase_counts_nominal_minutes() {
        use crate::notify::NullNotifier;
        use crate::timer::TimerEngine;

        let db = Database::open_memory().unwrap();
        let mut engine = TimerEngine::new(NullNotifier);
        engine.start();
        engine.tick();
        let ev = engine.skip_phase().unwrap();
        db.record_event(&ev).unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.focus_sessions, 1);
        assert_eq!(stats.focus_min, 25);
        assert_eq!(stats.today_focus_min, 25);
    }

    #[test]
    fn record_event_ignores_non_completions() {
        let db = Database::open_memory().unwrap();
        assert!(db.record_event(&Event::TimerReset { at: Utc::now() }).unwrap().is_none());
        let ev = Event::PhaseCompleted {
            completed: Phase::Focus,
            next: Phase::ShortBreak,
            completed_focus_sessions: 1,
            at: Utc::now(),
        };
        assert!(db.record_event(&ev).unwrap().is_some());

        let recent = db.recent_transitions(10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].next, Phase::ShortBreak);
    }

    #[test]
    fn open_at_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cadence.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.kv_set("k", "v").unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.kv_get("k").unwrap().as_deref(), Some("v"));
    }
}
