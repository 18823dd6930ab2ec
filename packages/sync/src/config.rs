//! Sync configuration.
//!
//! One knob: the outbound throttle window, read once from
//! `PAGESTACK_THROTTLE_MS` at session start. `0` disables throttling
//! entirely (every tick publishes), which is what the test suites use.

use std::time::Duration;
use tracing::warn;

const THROTTLE_ENV: &str = "PAGESTACK_THROTTLE_MS";
const DEFAULT_THROTTLE_MS: u64 = 200;

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Outbound publish window while no gesture is active.
    pub throttle: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            throttle: Duration::from_millis(DEFAULT_THROTTLE_MS),
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Self {
        let mut config = SyncConfig::default();
        if let Ok(raw) = std::env::var(THROTTLE_ENV) {
            match raw.parse::<u64>() {
                Ok(ms) => config.throttle = Duration::from_millis(ms),
                Err(_) => warn!(%raw, "ignoring unparsable {THROTTLE_ENV}"),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_200ms() {
        assert_eq!(SyncConfig::default().throttle, Duration::from_millis(200));
    }
}
