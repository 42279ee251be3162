//! LinUCB contextual bandit core.
//!
//! One ridge-regression model per strategy arm. Prediction scores each
//! candidate arm with an upper confidence bound `θᵀx + α·√(xᵀA⁻¹x)` and
//! selects the strictly greatest score; learning is the closed-form
//! online update `A += x·xᵀ`, `b += r·x`. For the small fixed dimension
//! used here a direct Gauss-Jordan inversion per prediction is cheap and
//! avoids carrying an incrementally-maintained inverse that can drift.

use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    ArmModel, FeedbackSample, PersistedModel, ARM_COUNT, FEATURE_COUNT, MODEL_VERSION,
};

/// Default exploration coefficient balancing exploitation against
/// uncertainty.
pub const DEFAULT_ALPHA: f64 = 0.5;

/// Pivots below this magnitude are treated as singular.
const PIVOT_EPS: f64 = 1e-10;

/// Result of scoring the valid arms for one context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Selected arm index, or `None` when no arm was applicable
    pub arm: Option<usize>,
    /// The winning upper-confidence-bound score (`-inf` when no arm)
    pub score: f64,
}

/// Per-user LinUCB state over the fixed strategy-arm set.
#[derive(Debug, Clone)]
pub struct LinUcbPolicy {
    arms: Vec<ArmModel>,
    alpha: f64,
    feature_count: usize,
}

impl Default for LinUcbPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

impl LinUcbPolicy {
    /// Cold-start policy: every arm at identity/zero.
    pub fn new(alpha: f64) -> Self {
        Self {
            arms: (0..ARM_COUNT).map(|_| ArmModel::identity(FEATURE_COUNT)).collect(),
            alpha,
            feature_count: FEATURE_COUNT,
        }
    }

    /// Rebuild a policy from a stored snapshot, applying the recovery
    /// rules:
    ///
    /// - no snapshot: cold start;
    /// - feature-count mismatch: discard the snapshot entirely (reshaping
    ///   would corrupt the statistical meaning of the matrices);
    /// - fewer arms than the current arm set: pad with fresh models;
    /// - individually malformed arms: replace with fresh models.
    pub fn restore(alpha: f64, stored: Option<PersistedModel>) -> Self {
        let Some(model) = stored else {
            return Self::new(alpha);
        };

        if model.feature_count != FEATURE_COUNT {
            warn!(
                stored = model.feature_count,
                expected = FEATURE_COUNT,
                "stored model has incompatible feature count, reinitializing"
            );
            return Self::new(alpha);
        }

        let mut arms = model.arms;
        for (index, arm) in arms.iter_mut().enumerate() {
            if !arm.is_well_formed(FEATURE_COUNT) {
                warn!(index, "stored arm is malformed, replacing with fresh state");
                *arm = ArmModel::identity(FEATURE_COUNT);
            }
        }
        while arms.len() < ARM_COUNT {
            arms.push(ArmModel::identity(FEATURE_COUNT));
        }

        Self {
            arms,
            alpha,
            feature_count: FEATURE_COUNT,
        }
    }

    /// The exploration coefficient in use.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// The feature dimension this policy scores against.
    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    /// Read access to a single arm's state.
    pub fn arm(&self, index: usize) -> Option<&ArmModel> {
        self.arms.get(index)
    }

    /// Score the valid arms for context `x` and pick the best.
    ///
    /// Arms whose design matrix fails to invert are skipped; if every
    /// valid arm fails, the first valid arm is returned with a neutral
    /// score so that a numerical hiccup never takes the engine down.
    /// Ties keep the first-encountered arm, which makes the cold-start
    /// selection deterministic.
    pub fn predict(&self, x: &[f64], valid_arms: &[usize]) -> DomainResult<Prediction> {
        self.check_features(x)?;

        let mut first_in_range: Option<usize> = None;
        let mut best: Option<(usize, f64)> = None;

        for &index in valid_arms {
            let Some(arm) = self.arms.get(index) else {
                debug!(index, "ignoring unknown arm index in valid set");
                continue;
            };
            if first_in_range.is_none() {
                first_in_range = Some(index);
            }

            let Some(score) = self.score_arm(arm, x) else {
                warn!(index, "arm design matrix not invertible, skipping arm");
                continue;
            };

            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((index, score)),
            }
        }

        if let Some((arm, score)) = best {
            return Ok(Prediction { arm: Some(arm), score });
        }
        if let Some(arm) = first_in_range {
            return Ok(Prediction { arm: Some(arm), score: 0.0 });
        }
        Ok(Prediction {
            arm: None,
            score: f64::NEG_INFINITY,
        })
    }

    /// Apply one observation: `A += x·xᵀ`, `b += reward·x`.
    ///
    /// The update accumulates; replaying the same sample twice counts it
    /// twice. Callers persist the model after this returns.
    pub fn update(&mut self, x: &[f64], arm: usize, reward: f64) -> DomainResult<()> {
        self.check_features(x)?;
        if !reward.is_finite() {
            return Err(DomainError::ValidationFailed(format!(
                "reward must be finite, got {reward}"
            )));
        }
        let d = self.feature_count;
        let model = self
            .arms
            .get_mut(arm)
            .ok_or(DomainError::ArmOutOfRange(arm))?;

        for i in 0..d {
            for j in 0..d {
                model.a[i * d + j] += x[i] * x[j];
            }
            model.b[i] += reward * x[i];
        }
        Ok(())
    }

    /// Apply a batch of observations, skipping samples whose arm index is
    /// out of range. Returns the number of samples actually applied. An
    /// empty batch is a no-op.
    pub fn batch_train(&mut self, samples: &[FeedbackSample]) -> DomainResult<usize> {
        let mut applied = 0;
        for sample in samples {
            if sample.arm >= self.arms.len() {
                debug!(arm = sample.arm, "skipping sample for unknown arm");
                continue;
            }
            if !sample.reward.is_finite() {
                warn!(arm = sample.arm, "skipping sample with non-finite reward");
                continue;
            }
            self.update(&sample.features, sample.arm, sample.reward)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Reinitialize every arm to identity/zero.
    pub fn reset(&mut self) {
        for arm in &mut self.arms {
            *arm = ArmModel::identity(self.feature_count);
        }
    }

    /// Snapshot the full state for persistence.
    pub fn snapshot(&self, updated_at: chrono::DateTime<chrono::Utc>) -> PersistedModel {
        PersistedModel {
            version: MODEL_VERSION,
            feature_count: self.feature_count,
            arms: self.arms.clone(),
            updated_at,
        }
    }

    fn check_features(&self, x: &[f64]) -> DomainResult<()> {
        if x.len() != self.feature_count {
            return Err(DomainError::FeatureLengthMismatch {
                got: x.len(),
                expected: self.feature_count,
            });
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(DomainError::ValidationFailed(
                "context vector contains non-finite values".to_string(),
            ));
        }
        Ok(())
    }

    /// UCB score for one arm, or `None` when `A` is not invertible.
    fn score_arm(&self, arm: &ArmModel, x: &[f64]) -> Option<f64> {
        let d = self.feature_count;
        let a_inv = invert_matrix(&arm.a, d)?;

        let theta = mat_vec(&a_inv, d, &arm.b);
        let mean = dot(&theta, x);

        let a_inv_x = mat_vec(&a_inv, d, x);
        let variance = dot(x, &a_inv_x).max(0.0);
        let bonus = self.alpha * variance.sqrt();

        let score = mean + bonus;
        score.is_finite().then_some(score)
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn mat_vec(m: &[f64], d: usize, x: &[f64]) -> Vec<f64> {
    (0..d)
        .map(|i| dot(&m[i * d..(i + 1) * d], x))
        .collect()
}

/// Invert a d×d row-major matrix by Gauss-Jordan elimination with partial
/// pivoting. Returns `None` for singular or ill-conditioned input.
fn invert_matrix(a: &[f64], d: usize) -> Option<Vec<f64>> {
    let mut m = a.to_vec();
    let mut inv = vec![0.0; d * d];
    for i in 0..d {
        inv[i * d + i] = 1.0;
    }

    for col in 0..d {
        let mut pivot_row = col;
        let mut pivot_abs = m[col * d + col].abs();
        for row in (col + 1)..d {
            let candidate = m[row * d + col].abs();
            if candidate > pivot_abs {
                pivot_row = row;
                pivot_abs = candidate;
            }
        }
        if !pivot_abs.is_finite() || pivot_abs < PIVOT_EPS {
            return None;
        }
        if pivot_row != col {
            for j in 0..d {
                m.swap(col * d + j, pivot_row * d + j);
                inv.swap(col * d + j, pivot_row * d + j);
            }
        }

        let pivot = m[col * d + col];
        for j in 0..d {
            m[col * d + j] /= pivot;
            inv[col * d + j] /= pivot;
        }

        for row in 0..d {
            if row == col {
                continue;
            }
            let factor = m[row * d + col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..d {
                m[row * d + j] -= factor * m[col * d + j];
                inv[row * d + j] -= factor * inv[col * d + j];
            }
        }
    }

    inv.iter().all(|v| v.is_finite()).then_some(inv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn unit_x() -> Vec<f64> {
        let mut x = vec![0.0; FEATURE_COUNT];
        x[0] = 1.0;
        x
    }

    fn varied_x() -> Vec<f64> {
        (0..FEATURE_COUNT).map(|i| 0.1 + i as f64 * 0.07).collect()
    }

    #[test]
    fn test_cold_start_ties_go_to_first_valid_arm() {
        let policy = LinUcbPolicy::new(DEFAULT_ALPHA);
        let x = varied_x();

        let p = policy.predict(&x, &[3, 7, 11]).unwrap();
        assert_eq!(p.arm, Some(3));

        // Same arms in a different order select the new first arm
        let p = policy.predict(&x, &[7, 3, 11]).unwrap();
        assert_eq!(p.arm, Some(7));
    }

    #[test]
    fn test_fresh_model_scores_alpha_times_norm_for_unit_vector() {
        let policy = LinUcbPolicy::new(DEFAULT_ALPHA);
        let p = policy.predict(&unit_x(), &[2, 5, 9]).unwrap();

        assert_eq!(p.arm, Some(2));
        // A = I, b = 0: mean is 0 and the bonus is alpha * ||x||
        assert!((p.score - DEFAULT_ALPHA).abs() < 1e-12);
    }

    #[test]
    fn test_rewarded_arm_wins_over_untouched_arm() {
        let mut policy = LinUcbPolicy::new(DEFAULT_ALPHA);
        let x = unit_x();
        policy.update(&x, 2, 1.0).unwrap();

        let p = policy.predict(&x, &[5, 2]).unwrap();
        assert_eq!(p.arm, Some(2));

        let untouched = policy.predict(&x, &[5]).unwrap();
        assert!(p.score > untouched.score);
    }

    #[test]
    fn test_update_accumulates_outer_product() {
        let mut policy = LinUcbPolicy::new(DEFAULT_ALPHA);
        let x = varied_x();
        let before = policy.arm(4).unwrap().clone();

        policy.update(&x, 4, 0.7).unwrap();

        let after = policy.arm(4).unwrap();
        let d = FEATURE_COUNT;
        for i in 0..d {
            for j in 0..d {
                let expected = before.a[i * d + j] + x[i] * x[j];
                assert!((after.a[i * d + j] - expected).abs() < 1e-12);
            }
            assert!((after.b[i] - (before.b[i] + 0.7 * x[i])).abs() < 1e-12);
        }

        // Every other arm untouched
        for index in (0..ARM_COUNT).filter(|i| *i != 4) {
            assert_eq!(policy.arm(index).unwrap(), &ArmModel::identity(d));
        }
    }

    #[test]
    fn test_update_keeps_matrix_symmetric() {
        let mut policy = LinUcbPolicy::new(DEFAULT_ALPHA);
        for (i, reward) in [(0, 1.0), (0, -0.5), (3, 0.25)] {
            policy.update(&varied_x(), i, reward).unwrap();
        }
        for index in 0..ARM_COUNT {
            assert!(policy.arm(index).unwrap().is_symmetric(1e-9));
        }
    }

    #[test]
    fn test_empty_valid_set_yields_no_arm() {
        let policy = LinUcbPolicy::new(DEFAULT_ALPHA);
        let p = policy.predict(&unit_x(), &[]).unwrap();
        assert_eq!(p.arm, None);
        assert_eq!(p.score, f64::NEG_INFINITY);
    }

    #[test]
    fn test_singular_arm_is_skipped() {
        let mut stored = PersistedModel::fresh(Utc::now());
        stored.arms[0].a = vec![0.0; FEATURE_COUNT * FEATURE_COUNT];
        let policy = LinUcbPolicy::restore(DEFAULT_ALPHA, Some(stored));

        let p = policy.predict(&unit_x(), &[0, 1]).unwrap();
        assert_eq!(p.arm, Some(1));
    }

    #[test]
    fn test_all_singular_falls_back_to_first_valid_arm() {
        let mut stored = PersistedModel::fresh(Utc::now());
        stored.arms[0].a = vec![0.0; FEATURE_COUNT * FEATURE_COUNT];
        stored.arms[1].a = vec![0.0; FEATURE_COUNT * FEATURE_COUNT];
        let policy = LinUcbPolicy::restore(DEFAULT_ALPHA, Some(stored));

        let p = policy.predict(&unit_x(), &[0, 1]).unwrap();
        assert_eq!(p.arm, Some(0));
        assert_eq!(p.score, 0.0);
    }

    #[test]
    fn test_batch_train_empty_is_noop() {
        let mut policy = LinUcbPolicy::new(DEFAULT_ALPHA);
        let before: Vec<_> = (0..ARM_COUNT).map(|i| policy.arm(i).unwrap().clone()).collect();

        let applied = policy.batch_train(&[]).unwrap();

        assert_eq!(applied, 0);
        for (i, arm) in before.iter().enumerate() {
            assert_eq!(policy.arm(i).unwrap(), arm);
        }
    }

    #[test]
    fn test_batch_train_skips_out_of_range_arms() {
        let mut policy = LinUcbPolicy::new(DEFAULT_ALPHA);
        let samples = vec![
            FeedbackSample::new(unit_x(), 1, 1.0),
            FeedbackSample::new(unit_x(), ARM_COUNT + 3, 1.0),
            FeedbackSample::new(unit_x(), 2, -0.5),
        ];

        let applied = policy.batch_train(&samples).unwrap();
        assert_eq!(applied, 2);
    }

    #[test]
    fn test_reset_restores_cold_start() {
        let mut policy = LinUcbPolicy::new(DEFAULT_ALPHA);
        policy.update(&varied_x(), 6, 1.0).unwrap();
        policy.reset();

        for index in 0..ARM_COUNT {
            assert_eq!(
                policy.arm(index).unwrap(),
                &ArmModel::identity(FEATURE_COUNT)
            );
        }
    }

    #[test]
    fn test_restore_discards_dimension_mismatch() {
        let incompatible = PersistedModel {
            version: MODEL_VERSION,
            feature_count: 7,
            arms: (0..ARM_COUNT).map(|_| ArmModel::identity(7)).collect(),
            updated_at: Utc::now(),
        };

        let policy = LinUcbPolicy::restore(DEFAULT_ALPHA, Some(incompatible));
        let fresh = LinUcbPolicy::new(DEFAULT_ALPHA);
        for index in 0..ARM_COUNT {
            assert_eq!(policy.arm(index), fresh.arm(index));
        }
    }

    #[test]
    fn test_restore_pads_missing_arms() {
        let mut trained = LinUcbPolicy::new(DEFAULT_ALPHA);
        trained.update(&unit_x(), 0, 1.0).unwrap();
        let mut snapshot = trained.snapshot(Utc::now());
        snapshot.arms.truncate(5);

        let policy = LinUcbPolicy::restore(DEFAULT_ALPHA, Some(snapshot));
        assert_eq!(policy.arm(0), trained.arm(0));
        for index in 5..ARM_COUNT {
            assert_eq!(
                policy.arm(index).unwrap(),
                &ArmModel::identity(FEATURE_COUNT)
            );
        }
    }

    #[test]
    fn test_update_rejects_bad_input() {
        let mut policy = LinUcbPolicy::new(DEFAULT_ALPHA);

        let short = vec![1.0; FEATURE_COUNT - 1];
        assert!(matches!(
            policy.update(&short, 0, 1.0),
            Err(DomainError::FeatureLengthMismatch { .. })
        ));

        assert!(matches!(
            policy.update(&unit_x(), ARM_COUNT, 1.0),
            Err(DomainError::ArmOutOfRange(_))
        ));

        assert!(policy.update(&unit_x(), 0, f64::NAN).is_err());
    }

    #[test]
    fn test_invert_identity_and_known_matrix() {
        let identity = ArmModel::identity(3).a;
        assert_eq!(invert_matrix(&identity, 3).unwrap(), identity);

        // [[2, 0], [0, 4]] inverts to [[0.5, 0], [0, 0.25]]
        let m = vec![2.0, 0.0, 0.0, 4.0];
        let inv = invert_matrix(&m, 2).unwrap();
        assert!((inv[0] - 0.5).abs() < 1e-12);
        assert!((inv[3] - 0.25).abs() < 1e-12);

        let singular = vec![1.0, 2.0, 2.0, 4.0];
        assert!(invert_matrix(&singular, 2).is_none());
    }
}
