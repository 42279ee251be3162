//! Engine configuration model.
//!
//! All bandit tunables live here so they can be overridden from the
//! config file or environment without touching code. Loading and
//! validation happen in `infrastructure::config`.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CadenceConfig {
    /// Database settings
    pub database: DatabaseConfig,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Bandit algorithm settings
    pub bandit: BanditConfig,
    /// Reward shaping constants
    pub rewards: RewardConfig,
    /// Pattern mining window
    pub patterns: PatternConfig,
}

/// SQLite database settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database path (sqlite URL form, e.g. `sqlite:.cadence/cadence.db`)
    pub path: String,
    /// Maximum pool connections
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "sqlite:.cadence/cadence.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level: trace, debug, info, warn, error
    pub level: String,
    /// Output format: json or pretty
    pub format: String,
    /// Optional directory for rotating file output
    pub log_dir: Option<String>,
    /// Whether to also log to stdout when a log dir is set
    pub enable_stdout: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            log_dir: None,
            enable_stdout: true,
        }
    }
}

/// Bandit algorithm settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BanditConfig {
    /// Exploration coefficient; higher values favor uncertain arms
    pub alpha: f64,
}

impl Default for BanditConfig {
    fn default() -> Self {
        Self { alpha: 0.5 }
    }
}

/// Reward values applied per observed outcome.
///
/// These are tunable product constants, not learned quantities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// The user took the suggestion
    pub accepted: f64,
    /// The user explicitly dismissed it
    pub dismissed: f64,
    /// Credit for the arm matching an organically chosen task
    pub organic_chosen: f64,
    /// Penalty for the suggested arm the user walked past
    pub organic_skipped: f64,
    /// The suggested session ran to completion
    pub session_completed: f64,
    /// The suggested session was abandoned midway
    pub session_abandoned: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            accepted: 1.0,
            dismissed: -0.5,
            organic_chosen: 0.5,
            organic_skipped: -0.2,
            session_completed: 0.8,
            session_abandoned: -0.3,
        }
    }
}

/// Pattern mining window settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Look-back window in days
    pub window_days: i64,
    /// Maximum records replayed per mining pass
    pub max_samples: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            max_samples: 100,
        }
    }
}
