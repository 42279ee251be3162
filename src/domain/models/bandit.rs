//! Per-arm linear model state and its persisted form.
//!
//! Each strategy arm owns a ridge-regression design matrix `A` (d×d,
//! row-major) and reward vector `b` (d). `A` starts as the identity and is
//! only ever updated by adding outer products `x·xᵀ`, which keeps it
//! symmetric and positive-definite for well-formed context vectors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed dimension of the context feature vector.
///
/// The feature layout is frozen (see the encoder); a stored model whose
/// `feature_count` differs is discarded rather than reshaped.
pub const FEATURE_COUNT: usize = 11;

/// Number of strategy arms. Must equal `StrategyArm::ALL.len()`.
pub const ARM_COUNT: usize = 13;

/// Version tag written into every persisted model.
pub const MODEL_VERSION: i32 = 1;

/// Ridge-regression state for a single arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmModel {
    /// Design matrix `A`, d×d row-major
    pub a: Vec<f64>,
    /// Reward vector `b`, length d
    pub b: Vec<f64>,
}

impl ArmModel {
    /// Cold-start state: `A = I`, `b = 0`.
    pub fn identity(dim: usize) -> Self {
        let mut a = vec![0.0; dim * dim];
        for i in 0..dim {
            a[i * dim + i] = 1.0;
        }
        Self {
            a,
            b: vec![0.0; dim],
        }
    }

    /// The dimension this arm was built for.
    pub fn dim(&self) -> usize {
        self.b.len()
    }

    /// Whether `a` and `b` have consistent shapes for `dim`.
    pub fn is_well_formed(&self, dim: usize) -> bool {
        self.b.len() == dim
            && self.a.len() == dim * dim
            && self.a.iter().all(|v| v.is_finite())
            && self.b.iter().all(|v| v.is_finite())
    }

    /// Whether `A` is symmetric within `tol`.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        let d = self.dim();
        if self.a.len() != d * d {
            return false;
        }
        for i in 0..d {
            for j in (i + 1)..d {
                if (self.a[i * d + j] - self.a[j * d + i]).abs() > tol {
                    return false;
                }
            }
        }
        true
    }
}

/// The wholesale persisted snapshot of a user's bandit model.
///
/// `feature_count` is the compatibility guard: loading code compares it
/// against [`FEATURE_COUNT`] with a plain equality check and discards the
/// record on mismatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedModel {
    /// Schema version of this snapshot
    pub version: i32,
    /// Feature dimension the arms were trained with
    pub feature_count: usize,
    /// Per-arm state, indexed by `StrategyArm::index()`
    pub arms: Vec<ArmModel>,
    /// When the snapshot was written
    pub updated_at: DateTime<Utc>,
}

impl PersistedModel {
    /// A cold-start snapshot with every arm at identity/zero.
    pub fn fresh(updated_at: DateTime<Utc>) -> Self {
        Self {
            version: MODEL_VERSION,
            feature_count: FEATURE_COUNT,
            arms: (0..ARM_COUNT).map(|_| ArmModel::identity(FEATURE_COUNT)).collect(),
            updated_at,
        }
    }
}

/// One training observation: context, chosen arm, observed reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSample {
    /// Encoded context vector
    pub features: Vec<f64>,
    /// Persisted arm index the reward applies to
    pub arm: usize,
    /// Bounded scalar reward; positive reinforces, negative discourages
    pub reward: f64,
}

impl FeedbackSample {
    /// Create a sample.
    pub fn new(features: Vec<f64>, arm: usize, reward: f64) -> Self {
        Self { features, arm, reward }
    }
}
