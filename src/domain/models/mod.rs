//! Domain models for the Cadence recommendation engine.

pub mod bandit;
pub mod config;
pub mod context;
pub mod pattern;
pub mod strategy;
pub mod suggestion;

pub use bandit::{ArmModel, FeedbackSample, PersistedModel, ARM_COUNT, FEATURE_COUNT, MODEL_VERSION};
pub use config::{
    BanditConfig, CadenceConfig, DatabaseConfig, LoggingConfig, PatternConfig, RewardConfig,
};
pub use context::{EnergyCost, EnergyRecord, EnvironmentSnapshot, SuggestionContext, TaskSnapshot};
pub use pattern::{DecisionRecord, DurationBucket, EnergyBucket, LearnedPattern, TimeOfDay};
pub use strategy::StrategyArm;
pub use suggestion::{Suggestion, SuggestionKind, SuggestionOutcome, WellbeingAction};
