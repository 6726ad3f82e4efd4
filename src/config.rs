//! Application configuration.
//!
//! Loaded from TOML, first match wins:
//! 1. Explicit path if provided
//! 2. vocab-trainer.toml in the current directory
//! 3. <config dir>/vocab-trainer/config.toml
//! 4. Defaults
//!
//! ```toml
//! database_path = "vocab.sqlite3"
//!
//! [scheduler]
//! failure_penalty = 0.2
//! easy_ease_delta = 0.15
//! de_bg_multiplier = 1.3
//!
//! [session]
//! limit = 20
//! new_items = 10
//! direction = "de-bg"
//! ```

use crate::error::{AppError, Result};
use crate::models::{Direction, SchedulerConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const PROJECT_CONFIG: &str = "vocab-trainer.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub scheduler: SchedulerConfig,
    pub session: SessionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("vocab.sqlite3"),
            scheduler: SchedulerConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum cards per practice session.
    pub limit: usize,
    /// Maximum never-reviewed cards mixed into a session.
    pub new_items: usize,
    pub direction: Direction,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            limit: 20,
            new_items: 10,
            direction: Direction::BgToDe,
        }
    }
}

impl AppConfig {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let mut candidates = vec![PathBuf::from(PROJECT_CONFIG)];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("vocab-trainer").join("config.toml"));
        }

        for candidate in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(candidate) {
                Ok(config) => {
                    log::info!("Loaded config from {}", candidate.display());
                    return Ok(config);
                }
                Err(e) => {
                    log::warn!("Failed to load {}: {}", candidate.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.scheduler.validate()?;
        if self.session.limit == 0 {
            return Err(AppError::InvalidConfig(
                "session.limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.database_path, PathBuf::from("vocab.sqlite3"));
        assert_eq!(config.session.limit, 20);
        assert_eq!(config.session.direction, Direction::BgToDe);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::parse(
            r#"
[scheduler]
easy_ease_delta = 0.15
de_bg_multiplier = 1.3

[session]
direction = "de-bg"
"#,
        )
        .unwrap();

        assert_eq!(config.scheduler.easy_ease_delta, 0.15);
        assert_eq!(config.scheduler.min_ease_factor, 1.3);
        assert_eq!(config.scheduler.de_bg_multiplier, 1.3);
        assert_eq!(config.scheduler.bg_de_multiplier, 1.1);
        assert_eq!(config.session.direction, Direction::DeToBg);
        assert_eq!(config.session.limit, 20);
    }

    #[test]
    fn test_invalid_scheduler_table_rejected() {
        let result = AppConfig::parse("[scheduler]\nmin_ease_factor = 5.0\n");
        assert!(matches!(result, Err(AppError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let result = AppConfig::parse("[session]\nlimit = 0\n");
        assert!(matches!(result, Err(AppError::InvalidConfig(_))));
    }

    #[test]
    fn test_bad_toml_rejected() {
        let result = AppConfig::parse("database_path = [");
        assert!(matches!(result, Err(AppError::ConfigParse(_))));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "database_path = \"/tmp/custom.sqlite3\"\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/custom.sqlite3"));
    }

    #[test]
    fn test_load_explicit_missing_path_is_error() {
        let result = AppConfig::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
