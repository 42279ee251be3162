//! Service layer: the engine's pure logic and its orchestration.

pub mod bandit;
pub mod encoder;
pub mod patterns;
pub mod recommender;

pub use bandit::{LinUcbPolicy, Prediction};
pub use encoder::FeatureEncoder;
pub use patterns::{PatternMiner, TimeSlotRates};
pub use recommender::RecommendationEngine;
