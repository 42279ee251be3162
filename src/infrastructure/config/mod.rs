//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - YAML file loading
//! - Environment variable overrides
//! - Configuration validation
//! - Type-safe config structs

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::CadenceConfig;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid exploration alpha: {0}. Must be finite and non-negative")]
    InvalidAlpha(f64),

    #[error("Invalid reward value for {name}: {value}. Must be finite and within [-10, 10]")]
    InvalidReward { name: &'static str, value: f64 },

    #[error("Invalid pattern window: {0} days. Must be at least 1")]
    InvalidPatternWindow(i64),

    #[error("Invalid pattern sample cap: {0}. Must be at least 1")]
    InvalidPatternSamples(usize),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .cadence/config.yaml (project config)
    /// 3. .cadence/local.yaml (local overrides, optional)
    /// 4. Environment variables (CADENCE_* prefix, highest priority)
    pub fn load() -> Result<CadenceConfig> {
        let config: CadenceConfig = Figment::new()
            .merge(Serialized::defaults(CadenceConfig::default()))
            .merge(Yaml::file(".cadence/config.yaml"))
            .merge(Yaml::file(".cadence/local.yaml"))
            .merge(Env::prefixed("CADENCE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<CadenceConfig> {
        let config: CadenceConfig = Figment::new()
            .merge(Serialized::defaults(CadenceConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &CadenceConfig) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if !config.bandit.alpha.is_finite() || config.bandit.alpha < 0.0 {
            return Err(ConfigError::InvalidAlpha(config.bandit.alpha));
        }

        let rewards = [
            ("accepted", config.rewards.accepted),
            ("dismissed", config.rewards.dismissed),
            ("organic_chosen", config.rewards.organic_chosen),
            ("organic_skipped", config.rewards.organic_skipped),
            ("session_completed", config.rewards.session_completed),
            ("session_abandoned", config.rewards.session_abandoned),
        ];
        for (name, value) in rewards {
            if !value.is_finite() || !(-10.0..=10.0).contains(&value) {
                return Err(ConfigError::InvalidReward { name, value });
            }
        }

        if config.patterns.window_days < 1 {
            return Err(ConfigError::InvalidPatternWindow(config.patterns.window_days));
        }

        if config.patterns.max_samples == 0 {
            return Err(ConfigError::InvalidPatternSamples(config.patterns.max_samples));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = CadenceConfig::default();
        assert_eq!(config.database.path, "sqlite:.cadence/cadence.db");
        assert_eq!(config.logging.level, "info");
        assert!((config.bandit.alpha - 0.5).abs() < f64::EPSILON);
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "bandit:\n  alpha: 1.25\nrewards:\n  dismissed: -0.8\nlogging:\n  level: debug"
        )
        .unwrap();
        file.flush().unwrap();

        let config = ConfigLoader::load_from_file(file.path()).expect("load");
        assert!((config.bandit.alpha - 1.25).abs() < f64::EPSILON);
        assert!((config.rewards.dismissed + 0.8).abs() < f64::EPSILON);
        assert_eq!(config.logging.level, "debug");
        // Untouched sections keep their defaults
        assert_eq!(config.patterns.window_days, 30);
    }

    #[test]
    fn test_hierarchical_merging() {
        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "bandit:\n  alpha: 0.3\nlogging:\n  level: info\n  format: json"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "logging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: CadenceConfig = Figment::new()
            .merge(Serialized::defaults(CadenceConfig::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.logging.level, "debug", "Override should win");
        assert_eq!(
            config.logging.format, "json",
            "Base value should persist when not overridden"
        );
        assert!((config.bandit.alpha - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = CadenceConfig::default();
        config.logging.level = "verbose".to_string();

        let result = ConfigLoader::validate(&config);
        assert!(matches!(result, Err(ConfigError::InvalidLogLevel(_))));
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = CadenceConfig::default();
        config.logging.format = "xml".to_string();

        let result = ConfigLoader::validate(&config);
        assert!(matches!(result, Err(ConfigError::InvalidLogFormat(_))));
    }

    #[test]
    fn test_validate_empty_database_path() {
        let mut config = CadenceConfig::default();
        config.database.path = String::new();

        let result = ConfigLoader::validate(&config);
        assert!(matches!(result, Err(ConfigError::EmptyDatabasePath)));
    }

    #[test]
    fn test_validate_negative_alpha() {
        let mut config = CadenceConfig::default();
        config.bandit.alpha = -0.1;

        let result = ConfigLoader::validate(&config);
        assert!(matches!(result, Err(ConfigError::InvalidAlpha(_))));
    }

    #[test]
    fn test_validate_non_finite_reward() {
        let mut config = CadenceConfig::default();
        config.rewards.accepted = f64::NAN;

        let result = ConfigLoader::validate(&config);
        assert!(matches!(result, Err(ConfigError::InvalidReward { .. })));
    }

    #[test]
    fn test_validate_zero_pattern_window() {
        let mut config = CadenceConfig::default();
        config.patterns.window_days = 0;

        let result = ConfigLoader::validate(&config);
        assert!(matches!(result, Err(ConfigError::InvalidPatternWindow(0))));
    }
}
