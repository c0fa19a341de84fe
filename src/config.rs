//! Tracker configuration.

use serde::{Deserialize, Serialize};
use tracing::Level;

/// Runtime configuration, filled from CLI flags and `TRACKER_*` env vars.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    /// SQLite connection string
    pub database_url: String,

    /// Owner of every account the CLI reads or writes
    pub user_id: String,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Platform tag used when a trade import names none
    pub default_platform: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./propfirm_tracker.db?mode=rwc".to_string(),
            user_id: "local".to_string(),
            log_level: "info".to_string(),
            default_platform: "tradovate".to_string(),
        }
    }
}

impl TrackerConfig {
    /// Parsed log level; unknown values fall back to INFO.
    pub fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        let mut config = TrackerConfig::default();
        assert_eq!(config.level(), Level::INFO);

        config.log_level = "DEBUG".to_string();
        assert_eq!(config.level(), Level::DEBUG);

        config.log_level = "verbose".to_string();
        assert_eq!(config.level(), Level::INFO);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(TrackerConfig::default()).unwrap();
        assert_eq!(json["userId"], "local");
        assert!(json.get("databaseUrl").is_some());
    }
}
