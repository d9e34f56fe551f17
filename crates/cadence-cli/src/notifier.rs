use std::io::Write;

use cadence_core::storage::NotificationsConfig;
use cadence_core::{Notifier, Phase};

/// Announces phase changes on stderr, optionally with the terminal bell.
#[derive(Debug, Clone)]
pub struct TerminalNotifier {
    config: NotificationsConfig,
}

impl TerminalNotifier {
    pub fn new(config: NotificationsConfig) -> Self {
        Self { config }
    }

    pub fn message(phase: Phase, with_sound: bool) -> String {
        if with_sound {
            format!("{}: {} [{}]", phase.name(), phase.notification_body(), phase.sound())
        } else {
            format!("{}: {}", phase.name(), phase.notification_body())
        }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, phase: Phase) {
        tracing::info!(phase = phase.as_str(), "phase change");
        if !self.config.enabled {
            return;
        }
        let bell = if self.config.bell { "\x07" } else { "" };
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "\n{bell}{}", Self::message(phase, self.config.sound));
    }
}
