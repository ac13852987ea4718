//! Environment-driven configuration.
//!
//! All settings come from environment variables (optionally loaded from a
//! `.env` file by the binary before this runs). Every field has a default,
//! so a bare `syllabusd` starts with a local database file and info-level
//! logging.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;

/// Runtime configuration for the daemon.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the sqlite database file.
    pub database_path: String,
    /// Default log filter when `RUST_LOG` is not set.
    pub log_level: String,
    /// Populate the demo data set when the term table is empty.
    pub seed_demo_data: bool,
}

impl Config {
    /// Build a Config from environment variables.
    pub fn from_env() -> Result<Self> {
        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "schedule.db".to_string());
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let seed_demo_data = std::env::var("SEED_DEMO_DATA")
            .map(|v| parse_flag(&v))
            .unwrap_or(true);

        Ok(Config {
            database_path,
            log_level,
            seed_demo_data,
        })
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env vars are process-global, so everything env-sensitive lives in one
    // test to avoid racing parallel test threads.
    #[test]
    fn test_config_from_env() {
        std::env::remove_var("DATABASE_PATH");
        std::env::remove_var("LOG_LEVEL");
        std::env::remove_var("SEED_DEMO_DATA");

        let config = Config::from_env().unwrap();
        assert_eq!(config.database_path, "schedule.db");
        assert_eq!(config.log_level, "info");
        assert!(config.seed_demo_data);

        std::env::set_var("DATABASE_PATH", "/tmp/terms.db");
        std::env::set_var("SEED_DEMO_DATA", "0");
        let config = Config::from_env().unwrap();
        assert_eq!(config.database_path, "/tmp/terms.db");
        assert!(!config.seed_demo_data);

        std::env::remove_var("DATABASE_PATH");
        std::env::remove_var("SEED_DEMO_DATA");
    }

    #[test]
    fn test_flag_parsing() {
        assert!(parse_flag("1"));
        assert!(parse_flag("true"));
        assert!(parse_flag(" YES "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("off"));
        assert!(!parse_flag(""));
    }
}
