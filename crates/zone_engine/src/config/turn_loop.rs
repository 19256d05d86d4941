use std::env::{self, VarError};
use std::time::Duration;

use tracing::warn;

pub const TURN_MS_ENV_VAR: &str = "ZONETURN_TURN_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnLoopConfig {
    pub turn_duration: Duration,
    /// Catch-up cap after a stall. Backlog beyond this is dropped.
    pub max_turns_per_wake: u32,
    /// Queued actions left over stay queued for the next turn.
    pub max_actions_per_turn: usize,
    pub metrics_log_interval: Duration,
    /// Stop after this turn. `None` runs until shutdown is requested.
    pub max_turns: Option<u64>,
}

impl Default for TurnLoopConfig {
    fn default() -> Self {
        Self {
            turn_duration: Duration::from_millis(300),
            max_turns_per_wake: 5,
            max_actions_per_turn: 256,
            metrics_log_interval: Duration::from_secs(10),
            max_turns: None,
        }
    }
}

impl TurnLoopConfig {
    /// Applies `ZONETURN_TURN_MS` on top of the current values.
    pub fn with_env_overrides(mut self) -> Self {
        self.turn_duration = resolve_turn_duration(env::var(TURN_MS_ENV_VAR), self.turn_duration);
        self
    }
}

fn resolve_turn_duration(env_value: Result<String, VarError>, configured: Duration) -> Duration {
    match env_value {
        Ok(value) => match value.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => Duration::from_millis(ms),
            _ => {
                warn!(
                    env_var = TURN_MS_ENV_VAR,
                    value = value.as_str(),
                    "invalid turn duration env var value; falling back to config"
                );
                configured
            }
        },
        Err(VarError::NotPresent) => configured,
        Err(err) => {
            warn!(
                env_var = TURN_MS_ENV_VAR,
                error = %err,
                "unable to read turn duration env var; falling back to config"
            );
            configured
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    const CONFIGURED: Duration = Duration::from_millis(300);

    #[test]
    fn env_value_overrides_configured_duration() {
        assert_eq!(
            resolve_turn_duration(Ok(" 120 ".to_string()), CONFIGURED),
            Duration::from_millis(120)
        );
    }

    #[test]
    fn missing_env_var_keeps_configured_duration() {
        assert_eq!(
            resolve_turn_duration(Err(VarError::NotPresent), CONFIGURED),
            CONFIGURED
        );
    }

    #[test]
    fn invalid_env_values_fall_back() {
        for value in ["fast", "-5", "0", ""] {
            assert_eq!(
                resolve_turn_duration(Ok(value.to_string()), CONFIGURED),
                CONFIGURED,
                "value {value:?}"
            );
        }
        assert_eq!(
            resolve_turn_duration(Err(VarError::NotUnicode(OsString::from("x"))), CONFIGURED),
            CONFIGURED
        );
    }

    #[test]
    fn defaults_match_server_cadence() {
        let config = TurnLoopConfig::default();
        assert_eq!(config.turn_duration, Duration::from_millis(300));
        assert_eq!(config.max_turns_per_wake, 5);
        assert_eq!(config.max_turns, None);
    }
}
