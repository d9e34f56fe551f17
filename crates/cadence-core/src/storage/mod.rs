mod config;
pub mod database;

pub use config::{Config, NotificationsConfig, RuntimeConfig};
pub use database::{Database, SavedTimer, Stats, TransitionRecord};

use std::path::PathBuf;

use crate::error::Result;

/// Returns the directory holding `config.toml` and `cadence.db`.
///
/// `CADENCE_DATA_DIR` wins when set. Otherwise `~/.config/cadence[-dev]/`,
/// where `CADENCE_ENV=dev` selects the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("CADENCE_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("CADENCE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("cadence-dev")
            } else {
                base_dir.join("cadence")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
