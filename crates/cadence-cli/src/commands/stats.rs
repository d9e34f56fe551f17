use clap::Subcommand;
use cadence_core::storage::Database;
use serde::Serialize;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// All-time stats
    All,
    /// Most recent phase transitions
    History {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

#[derive(Serialize)]
struct TodayStats {
    focus_sessions: u64,
    focus_min: u64,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        StatsAction::Today => {
            let stats = db.stats()?;
            let today = TodayStats {
                focus_sessions: stats.today_focus_sessions,
                focus_min: stats.today_focus_min,
            };
            println!("{}", serde_json::to_string_pretty(&today)?);
        }
        StatsAction::All => {
            let stats = db.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::History { limit } => {
            let history = db.recent_transitions(limit)?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
    }
    Ok(())
}
