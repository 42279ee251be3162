//! Cadence - Adaptive Task-Recommendation Engine
//!
//! Cadence decides which kind of action to surface to a user next, learns
//! from how the user actually responds, and persists a per-user statistical
//! model across sessions. The core is a contextual multi-armed bandit
//! (LinUCB) choosing among a fixed set of strategy arms, fed by a pure
//! feature encoder and a historical pattern miner.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Strategy arms, bandit state, context and
//!   pattern models, and the persistence port traits
//! - **Service Layer** (`services`): Feature encoding, the LinUCB policy,
//!   pattern mining, and the recommendation orchestrator
//! - **Adapters** (`adapters`): SQLite implementations of the ports
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//!
//! # Example
//!
//! ```ignore
//! use cadence::adapters::sqlite::{self, SqliteDecisionLog, SqliteModelStore};
//! use cadence::domain::models::SuggestionContext;
//! use cadence::infrastructure::config::ConfigLoader;
//! use cadence::services::RecommendationEngine;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let pool = sqlite::initialize_database(&config.database.path).await?;
//!     let engine = RecommendationEngine::new(
//!         "user-1",
//!         Arc::new(SqliteModelStore::new(pool.clone())),
//!         Arc::new(SqliteDecisionLog::new(pool)),
//!         &config,
//!     );
//!
//!     let ctx = SuggestionContext::new(chrono::Utc::now(), 70, 45);
//!     let suggestion = engine.suggest(&ctx).await?;
//!     println!("{}", suggestion.reason);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    ArmModel, BanditConfig, CadenceConfig, DatabaseConfig, DecisionRecord, EnergyCost,
    EnergyRecord, EnvironmentSnapshot, FeedbackSample, LearnedPattern, LoggingConfig,
    PatternConfig, PersistedModel, RewardConfig, StrategyArm, Suggestion, SuggestionContext,
    SuggestionKind, SuggestionOutcome, TaskSnapshot, WellbeingAction, ARM_COUNT, FEATURE_COUNT,
    MODEL_VERSION,
};
pub use domain::ports::{DecisionLog, ModelStore};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{FeatureEncoder, LinUcbPolicy, PatternMiner, Prediction, RecommendationEngine};
