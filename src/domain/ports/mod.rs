//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that infrastructure adapters
//! must implement:
//! - `ModelStore`: persistence for the per-user bandit model
//! - `DecisionLog`: append/read access to historical decision records
//!
//! These traits define the contracts that allow the domain to be
//! independent of specific infrastructure implementations.

pub mod decision_log;
pub mod model_store;

pub use decision_log::DecisionLog;
pub use model_store::ModelStore;
