//! Feature encoding: turns a [`SuggestionContext`] into the fixed-length
//! numeric vector the bandit scores against.
//!
//! The layout below is frozen; the bandit treats the dimension as part of
//! the persisted contract, so changing it requires bumping the stored
//! `feature_count` and accepting a model reset for existing users.
//!
//! | idx | feature               | normalization                          |
//! |-----|-----------------------|----------------------------------------|
//! | 0   | bias                  | always 1.0                             |
//! | 1   | energy                | level / 100                            |
//! | 2   | time of day           | hour / 24                              |
//! | 3   | day of week           | Monday=0 .. Sunday=6, / 6              |
//! | 4   | weekend flag          | 0 or 1                                 |
//! | 5   | backlog size          | min(count / 20, 1)                     |
//! | 6   | available time        | min(minutes / 120, 1)                  |
//! | 7   | deadline pressure     | 1 - clamp(hours to nearest / 72), 0 if no deadline |
//! | 8   | continuation affinity | 1 if an active task matches the last completed category |
//! | 9   | historical prior      | completion rate of the dominant active category, 0.5 neutral |
//! | 10  | motion intensity      | environment snapshot, 0 when absent    |

use std::collections::HashMap;

use crate::domain::models::{SuggestionContext, FEATURE_COUNT};

/// Pure, deterministic context-to-vector encoder.
///
/// Holds no state and performs no IO; the same context always yields the
/// same vector, and missing optional signals fall back to neutral values
/// instead of failing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEncoder;

impl FeatureEncoder {
    /// Encode a context into a [`FEATURE_COUNT`]-length vector.
    pub fn encode(&self, ctx: &SuggestionContext) -> Vec<f64> {
        let mut x = Vec::with_capacity(FEATURE_COUNT);

        x.push(1.0);
        x.push(f64::from(ctx.energy) / 100.0);
        x.push(f64::from(ctx.hour()) / 24.0);
        x.push(f64::from(ctx.day_of_week()) / 6.0);
        x.push(if ctx.day_of_week() >= 5 { 1.0 } else { 0.0 });
        x.push((ctx.backlog_count as f64 / 20.0).min(1.0));
        x.push((f64::from(ctx.available_minutes) / 120.0).min(1.0));
        x.push(deadline_pressure(ctx));
        x.push(continuation_affinity(ctx));
        x.push(historical_prior(ctx));
        x.push(ctx.environment.motion_intensity.clamp(0.0, 1.0));

        debug_assert_eq!(x.len(), FEATURE_COUNT);
        x
    }
}

/// Pressure from the nearest active deadline, 0 when no task has one.
/// Ramps linearly from 0 at 72h out to 1 at (or past) the deadline.
fn deadline_pressure(ctx: &SuggestionContext) -> f64 {
    ctx.active_tasks
        .iter()
        .filter_map(|t| t.deadline)
        .map(|deadline| {
            let hours_left = (deadline - ctx.now).num_minutes() as f64 / 60.0;
            if hours_left <= 0.0 {
                1.0
            } else {
                (1.0 - hours_left / 72.0).max(0.0)
            }
        })
        .fold(0.0, f64::max)
}

fn continuation_affinity(ctx: &SuggestionContext) -> f64 {
    let Some(last) = ctx.last_completed() else {
        return 0.0;
    };
    if ctx.active_tasks.iter().any(|t| t.category == last.category) {
        1.0
    } else {
        0.0
    }
}

/// Completion rate of the most common active-task category, taken from
/// the context's mined patterns. Neutral 0.5 when there is no dominant
/// category or no samples for it.
fn historical_prior(ctx: &SuggestionContext) -> f64 {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for task in &ctx.active_tasks {
        *counts.entry(task.category.as_str()).or_default() += 1;
    }
    let Some(dominant) = ctx
        .active_tasks
        .iter()
        .map(|t| t.category.as_str())
        .max_by_key(|c| counts.get(c).copied().unwrap_or(0))
    else {
        return 0.5;
    };

    let samples: Vec<_> = ctx
        .patterns
        .iter()
        .filter(|p| p.category == dominant)
        .collect();
    if samples.is_empty() {
        return 0.5;
    }
    let completed = samples.iter().filter(|p| p.completed).count();
    completed as f64 / samples.len() as f64
}
