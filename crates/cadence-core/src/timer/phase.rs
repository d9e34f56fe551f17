use serde::{Deserialize, Serialize};

/// One timed interval of the rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Focus,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Focus, Phase::ShortBreak, Phase::LongBreak];

    /// Display label.
    pub fn name(self) -> &'static str {
        match self {
            Phase::Focus => "Focus",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
        }
    }

    /// Phase length in whole seconds.
    pub const fn duration_secs(self) -> u32 {
        match self {
            Phase::Focus => 25 * 60,
            Phase::ShortBreak => 5 * 60,
            Phase::LongBreak => 15 * 60,
        }
    }

    pub fn is_focus(self) -> bool {
        matches!(self, Phase::Focus)
    }

    /// Body text shown when this phase begins.
    pub fn notification_body(self) -> &'static str {
        match self {
            Phase::Focus => "Time to focus.",
            Phase::ShortBreak => "Quick break. Stretch.",
            Phase::LongBreak => "Cycle complete. Step away.",
        }
    }

    /// Sound identifier handed to the notifier. Opaque to the scheduler.
    pub fn sound(self) -> &'static str {
        match self {
            Phase::Focus => "Ping",
            Phase::ShortBreak => "Glass",
            Phase::LongBreak => "Hero",
        }
    }

    /// Stable lowercase key, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Focus => "focus",
            Phase::ShortBreak => "short_break",
            Phase::LongBreak => "long_break",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "focus" => Ok(Phase::Focus),
            "short_break" => Ok(Phase::ShortBreak),
            "long_break" => Ok(Phase::LongBreak),
            other => Err(format!("unknown phase: {other}")),
        }
    }
}
