//! Recommendation orchestration.
//!
//! One [`RecommendationEngine`] is constructed per user session and owns
//! that user's bandit state for its lifetime. It builds the context
//! vector, filters arms through the shared applicability predicate, asks
//! the bandit for the winner, maps the winning arm to a concrete
//! suggestion, and converts observed outcomes into reward updates that
//! are persisted synchronously.

use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CadenceConfig, DecisionRecord, EnergyCost, EnergyRecord, FeedbackSample, LearnedPattern,
    RewardConfig, StrategyArm, Suggestion, SuggestionContext, SuggestionOutcome, TaskSnapshot,
    WellbeingAction,
};
use crate::domain::ports::{DecisionLog, ModelStore};
use crate::services::bandit::LinUcbPolicy;
use crate::services::encoder::FeatureEncoder;
use crate::services::patterns::{generate_insights, PatternMiner};

/// Energy levels the synthetic calibration grid sweeps over.
const CALIBRATION_ENERGY_GRID: [u8; 3] = [30, 60, 90];

/// Hours of day the synthetic calibration grid sweeps over.
const CALIBRATION_HOUR_GRID: [u32; 3] = [9, 14, 20];

/// Per-user-session entry point to the recommendation engine.
///
/// The user's model is loaded lazily on first use; concurrent first
/// callers share a single outstanding load. Every learning operation
/// persists the full model before returning, and a failed save is logged
/// and absorbed so the in-memory state keeps serving (the next
/// successful save catches up).
pub struct RecommendationEngine {
    user_id: String,
    store: Arc<dyn ModelStore>,
    decisions: Arc<dyn DecisionLog>,
    encoder: FeatureEncoder,
    miner: PatternMiner,
    rewards: RewardConfig,
    alpha: f64,
    policy: OnceCell<Mutex<LinUcbPolicy>>,
}

impl RecommendationEngine {
    /// Create an engine bound to one user.
    pub fn new(
        user_id: impl Into<String>,
        store: Arc<dyn ModelStore>,
        decisions: Arc<dyn DecisionLog>,
        config: &CadenceConfig,
    ) -> Self {
        let miner = PatternMiner::new(Arc::clone(&decisions))
            .with_window(config.patterns.window_days, config.patterns.max_samples);
        Self {
            user_id: user_id.into(),
            store,
            decisions,
            encoder: FeatureEncoder,
            miner,
            rewards: config.rewards,
            alpha: config.bandit.alpha,
            policy: OnceCell::new(),
        }
    }

    /// The user this engine serves.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Lazily load (once) and return the user's bandit state.
    ///
    /// A load failure falls back to a cold-start model rather than
    /// surfacing an error; the engine must stay available.
    async fn policy(&self) -> &Mutex<LinUcbPolicy> {
        self.policy
            .get_or_init(|| async {
                let stored = match self.store.load(&self.user_id).await {
                    Ok(stored) => stored,
                    Err(err) => {
                        warn!(user_id = %self.user_id, %err, "model load failed, starting fresh");
                        None
                    }
                };
                Mutex::new(LinUcbPolicy::restore(self.alpha, stored))
            })
            .await
    }

    /// Produce the next suggestion for the given context.
    pub async fn suggest(&self, ctx: &SuggestionContext) -> DomainResult<Suggestion> {
        let x = self.encoder.encode(ctx);
        let valid = StrategyArm::valid_arms(ctx);

        let prediction = {
            let policy = self.policy().await.lock().await;
            policy.predict(&x, &valid)?
        };

        let Some(index) = prediction.arm else {
            return Ok(Suggestion::none(
                StrategyArm::NoSuggestion,
                "Nothing fits your current situation",
            ));
        };
        let arm = StrategyArm::from_index(index).ok_or(DomainError::ArmOutOfRange(index))?;
        debug!(user_id = %self.user_id, arm = arm.as_str(), score = prediction.score, "arm selected");

        Ok(resolve_arm(arm, ctx))
    }

    /// Record how the user responded to a suggestion, update the model,
    /// persist it, and append the decision record.
    pub async fn record_outcome(
        &self,
        ctx: &SuggestionContext,
        suggestion: &Suggestion,
        outcome: SuggestionOutcome,
    ) -> DomainResult<()> {
        let x = self.encoder.encode(ctx);
        let suggested = suggestion.arm;

        // Category and duration of whatever the decision was about, for
        // the decision log. Non-task suggestions log under the arm label.
        let suggested_task = suggestion
            .task_id()
            .and_then(|id| ctx.active_tasks.iter().find(|t| t.id == id));
        let mut category = suggested_task
            .map_or_else(|| suggested.as_str().to_string(), |t| t.category.clone());
        let mut duration = suggested_task.map_or(0, |t| t.duration_minutes);

        let mut updates: Vec<(usize, f64)> = Vec::new();
        let completed = match outcome {
            SuggestionOutcome::Accepted => {
                updates.push((suggested.index(), self.rewards.accepted));
                true
            }
            SuggestionOutcome::Dismissed => {
                updates.push((suggested.index(), self.rewards.dismissed));
                false
            }
            SuggestionOutcome::OrganicSelection { completed: chosen } => {
                let organic_arm = classify_task(&chosen, ctx);
                updates.push((organic_arm.index(), self.rewards.organic_chosen));
                if organic_arm != suggested {
                    updates.push((suggested.index(), self.rewards.organic_skipped));
                }
                category = chosen.category.clone();
                duration = chosen.duration_minutes;
                true
            }
            SuggestionOutcome::SessionCompleted => {
                updates.push((suggested.index(), self.rewards.session_completed));
                true
            }
            SuggestionOutcome::SessionAbandoned => {
                updates.push((suggested.index(), self.rewards.session_abandoned));
                false
            }
        };

        let snapshot = {
            let mut policy = self.policy().await.lock().await;
            for (arm, reward) in &updates {
                policy.update(&x, *arm, *reward)?;
            }
            policy.snapshot(ctx.now)
        };

        if let Err(err) = self.store.save(&self.user_id, &snapshot).await {
            warn!(user_id = %self.user_id, %err, "model save failed, keeping in-memory state");
        }

        let record = DecisionRecord::new(
            &self.user_id,
            category,
            ctx.now,
            ctx.energy,
            duration,
            completed,
        );
        if let Err(err) = self.decisions.append(&record).await {
            warn!(user_id = %self.user_id, %err, "decision log append failed");
        }

        info!(
            user_id = %self.user_id,
            arm = suggested.as_str(),
            updates = updates.len(),
            "outcome recorded"
        );
        Ok(())
    }

    /// Warm-start the model from the current task list by sweeping a
    /// small grid of synthetic contexts. Returns the number of samples
    /// trained.
    pub async fn calibrate_synthetic(&self, tasks: &[TaskSnapshot]) -> DomainResult<usize> {
        if tasks.is_empty() {
            return Err(DomainError::CalibrationUnavailable(
                "no tasks to calibrate from".to_string(),
            ));
        }

        let now = Utc::now();
        let mut samples = Vec::new();
        for &energy in &CALIBRATION_ENERGY_GRID {
            for &hour in &CALIBRATION_HOUR_GRID {
                let at = now.with_hour(hour).unwrap_or(now);
                let ctx =
                    SuggestionContext::new(at, energy, 120).with_tasks(tasks.to_vec());
                let x = self.encoder.encode(&ctx);
                for task in tasks {
                    let arm = classify_task(task, &ctx);
                    let reward = synthetic_reward(task, energy);
                    samples.push(FeedbackSample::new(x.clone(), arm.index(), reward));
                }
            }
        }

        self.train_and_persist(&samples, now).await
    }

    /// Rebuild priors by replaying completed tasks as positive samples,
    /// pairing each with the nearest historical energy reading. Returns
    /// the number of samples trained.
    pub async fn recalibrate_from_history(
        &self,
        completed: &[TaskSnapshot],
        energy_history: &[EnergyRecord],
    ) -> DomainResult<usize> {
        let mut samples = Vec::new();
        for task in completed {
            let Some(at) = task.completed_at else {
                continue;
            };
            let energy = nearest_energy(energy_history, at).unwrap_or(60);
            let ctx = SuggestionContext::new(at, energy, task.duration_minutes.max(30))
                .with_tasks(vec![task.clone()]);
            let arm = classify_task(task, &ctx);
            samples.push(FeedbackSample::new(
                self.encoder.encode(&ctx),
                arm.index(),
                self.rewards.accepted,
            ));
        }

        if samples.is_empty() {
            return Err(DomainError::CalibrationUnavailable(
                "no completed tasks to learn from".to_string(),
            ));
        }
        self.train_and_persist(&samples, Utc::now()).await
    }

    /// Mined patterns for this user's recent history.
    pub async fn mined_patterns(&self, now: DateTime<Utc>) -> DomainResult<Vec<LearnedPattern>> {
        self.miner.recent_patterns(&self.user_id, now).await
    }

    /// Fill the context's pattern list from the decision log when the
    /// caller did not supply one.
    pub async fn attach_patterns(&self, ctx: &mut SuggestionContext) -> DomainResult<()> {
        if ctx.patterns.is_empty() {
            ctx.patterns = self.mined_patterns(ctx.now).await?;
        }
        Ok(())
    }

    /// Human-readable observations about the user's recent history.
    pub async fn insights(&self, now: DateTime<Utc>) -> DomainResult<Vec<String>> {
        let patterns = self.mined_patterns(now).await?;
        Ok(generate_insights(&patterns))
    }

    async fn train_and_persist(
        &self,
        samples: &[FeedbackSample],
        now: DateTime<Utc>,
    ) -> DomainResult<usize> {
        let (applied, snapshot) = {
            let mut policy = self.policy().await.lock().await;
            let applied = policy.batch_train(samples)?;
            (applied, policy.snapshot(now))
        };

        if applied > 0 {
            if let Err(err) = self.store.save(&self.user_id, &snapshot).await {
                warn!(user_id = %self.user_id, %err, "model save failed after calibration");
            }
        }
        info!(user_id = %self.user_id, applied, "calibration batch trained");
        Ok(applied)
    }
}

/// Map a winning arm to a concrete suggestion in the given context.
///
/// Arms are only handed to this function after passing the applicability
/// filter, so the task lookups are expected to succeed; the empty
/// fallback exists for defense, not as a normal path.
fn resolve_arm(arm: StrategyArm, ctx: &SuggestionContext) -> Suggestion {
    let tasks = &ctx.active_tasks;
    match arm {
        StrategyArm::LongFocusBlock => tasks
            .iter()
            .filter(|t| t.duration_minutes >= 45 && t.energy_cost == EnergyCost::High)
            .max_by_key(|t| t.duration_minutes)
            .map_or_else(
                || Suggestion::none(arm, "No focus-block task available"),
                |t| {
                    Suggestion::task(
                        t.id,
                        arm,
                        format!("You have the time and energy to go deep on \"{}\"", t.title),
                    )
                },
            ),
        StrategyArm::ShortBurst => tasks
            .iter()
            .filter(|t| t.duration_minutes <= 25 && t.energy_cost != EnergyCost::Low)
            .min_by_key(|t| t.duration_minutes)
            .map_or_else(
                || Suggestion::none(arm, "No short task available"),
                |t| {
                    Suggestion::task(
                        t.id,
                        arm,
                        format!("\"{}\" fits in about {} minutes", t.title, t.duration_minutes),
                    )
                },
            ),
        StrategyArm::ContinueCategory => {
            let last = ctx.last_completed();
            last.and_then(|last| tasks.iter().find(|t| t.category == last.category))
                .map_or_else(
                    || Suggestion::none(arm, "Nothing left in that category"),
                    |t| {
                        Suggestion::task(
                            t.id,
                            arm,
                            format!("Keep the momentum going in {}", t.category),
                        )
                    },
                )
        }
        StrategyArm::SwitchCategory => {
            let last = ctx.last_completed();
            last.and_then(|last| tasks.iter().find(|t| t.category != last.category))
                .map_or_else(
                    || Suggestion::none(arm, "No other category to switch to"),
                    |t| {
                        Suggestion::task(
                            t.id,
                            arm,
                            format!("A change of pace: something from {}", t.category),
                        )
                    },
                )
        }
        StrategyArm::NearestDeadline => tasks
            .iter()
            .filter(|t| t.deadline.is_some())
            .min_by_key(|t| t.deadline)
            .map_or_else(
                || Suggestion::none(arm, "No deadlines on the board"),
                |t| {
                    Suggestion::task(t.id, arm, format!("\"{}\" has the nearest deadline", t.title))
                },
            ),
        StrategyArm::LowEnergyTask => tasks
            .iter()
            .filter(|t| t.energy_cost == EnergyCost::Low)
            .min_by_key(|t| t.duration_minutes)
            .map_or_else(
                || Suggestion::none(arm, "No low-effort task available"),
                |t| {
                    Suggestion::task(
                        t.id,
                        arm,
                        format!("\"{}\" is easy to do even while tired", t.title),
                    )
                },
            ),
        StrategyArm::PhysicalReset => Suggestion::wellbeing(
            WellbeingAction::Movement,
            arm,
            "Stand up, stretch, or take a short walk before the next task",
        ),
        StrategyArm::BreathingReset => Suggestion::wellbeing(
            WellbeingAction::Breathing,
            arm,
            "A two-minute breathing reset will help you refocus",
        ),
        StrategyArm::NoSuggestion => {
            Suggestion::none(arm, "Nothing worth interrupting you for right now")
        }
        StrategyArm::PullBack => Suggestion::wellbeing(
            WellbeingAction::StepAway,
            arm,
            "Your plate is full; wrap up what's open before taking on more",
        ),
        StrategyArm::StaleRevival => tasks
            .iter()
            .filter(|t| t.is_stale(ctx.now))
            .max_by_key(|t| ctx.now - t.created_at)
            .map_or_else(
                || Suggestion::none(arm, "No stale backlog items"),
                |t| {
                    Suggestion::task(
                        t.id,
                        arm,
                        format!(
                            "\"{}\" has been waiting {} days; give it a look",
                            t.title,
                            t.age_days(ctx.now)
                        ),
                    )
                },
            ),
        StrategyArm::QuickWinChain => tasks
            .iter()
            .filter(|t| t.duration_minutes <= 15)
            .min_by_key(|t| t.duration_minutes)
            .map_or_else(
                || Suggestion::none(arm, "No quick wins available"),
                |t| {
                    Suggestion::task(
                        t.id,
                        arm,
                        format!("Start a chain of quick wins with \"{}\"", t.title),
                    )
                },
            ),
        StrategyArm::EveningWindDown => tasks
            .iter()
            .filter(|t| t.energy_cost == EnergyCost::Low || t.duration_minutes <= 20)
            .min_by_key(|t| t.duration_minutes)
            .map_or_else(
                || Suggestion::none(arm, "Nothing light enough for this hour"),
                |t| {
                    Suggestion::task(t.id, arm, format!("Wind down the day with \"{}\"", t.title))
                },
            ),
    }
}

/// Which arm a task most plausibly represents, used to credit organic
/// choices and to label calibration samples. The checks run from the most
/// specific signal to the most generic so the function is total and
/// deterministic.
fn classify_task(task: &TaskSnapshot, ctx: &SuggestionContext) -> StrategyArm {
    if task.deadline.is_some() {
        return StrategyArm::NearestDeadline;
    }
    if task.is_stale(ctx.now) {
        return StrategyArm::StaleRevival;
    }
    if ctx.is_evening() && task.energy_cost == EnergyCost::Low {
        return StrategyArm::EveningWindDown;
    }
    if task.energy_cost == EnergyCost::Low {
        return StrategyArm::LowEnergyTask;
    }
    if task.duration_minutes <= 15 {
        return StrategyArm::QuickWinChain;
    }
    if task.duration_minutes <= 25 {
        return StrategyArm::ShortBurst;
    }
    if task.duration_minutes >= 45 && task.energy_cost == EnergyCost::High {
        return StrategyArm::LongFocusBlock;
    }
    match ctx.last_completed() {
        Some(last) if last.category == task.category => StrategyArm::ContinueCategory,
        _ => StrategyArm::SwitchCategory,
    }
}

/// Synthetic calibration reward: how well the task's energy demand lines
/// up with the simulated user energy.
fn synthetic_reward(task: &TaskSnapshot, energy: u8) -> f64 {
    let alignment = 1.0 - (f64::from(energy) / 100.0 - task.energy_cost.energy_fraction()).abs();
    alignment.clamp(0.0, 1.0)
}

/// The energy reading closest in time to `at`, if any.
fn nearest_energy(history: &[EnergyRecord], at: DateTime<Utc>) -> Option<u8> {
    history
        .iter()
        .min_by_key(|r| (r.recorded_at - at).num_seconds().abs())
        .map(|r| r.energy)
}
