//! Historical pattern mining.
//!
//! Replays a bounded window of decision-log records into
//! [`LearnedPattern`]s and derives completion-rate aggregates from them.
//! The aggregates are pure functions; only the window read touches the
//! decision log.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::domain::errors::DomainResult;
use crate::domain::models::{DurationBucket, EnergyBucket, LearnedPattern, TimeOfDay};
use crate::domain::ports::DecisionLog;

/// Default look-back window in days.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Default cap on the number of records replayed.
pub const DEFAULT_MAX_SAMPLES: usize = 100;

/// Completion rates per coarse time-of-day slot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimeSlotRates {
    pub morning: f64,
    pub afternoon: f64,
    pub evening: f64,
}

/// Completion rates per coarse duration bucket.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DurationRates {
    pub short: f64,
    pub medium: f64,
    pub long: f64,
}

/// Completion rates per coarse energy bucket.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyRates {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

/// Reads decision history and summarizes it into reusable priors.
#[derive(Clone)]
pub struct PatternMiner {
    log: Arc<dyn DecisionLog>,
    window_days: i64,
    max_samples: usize,
}

impl PatternMiner {
    /// Miner with the default 30-day / 100-sample window.
    pub fn new(log: Arc<dyn DecisionLog>) -> Self {
        Self {
            log,
            window_days: DEFAULT_WINDOW_DAYS,
            max_samples: DEFAULT_MAX_SAMPLES,
        }
    }

    /// Override the look-back window.
    pub fn with_window(mut self, window_days: i64, max_samples: usize) -> Self {
        self.window_days = window_days.max(1);
        self.max_samples = max_samples.max(1);
        self
    }

    /// Patterns for the user's recent decisions, newest first.
    pub async fn recent_patterns(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<LearnedPattern>> {
        let since = now - Duration::days(self.window_days);
        let records = self.log.recent(user_id, since, self.max_samples).await?;
        debug!(user_id, count = records.len(), "mined decision window");
        Ok(records.iter().map(|r| r.to_pattern()).collect())
    }
}

/// Completion rate per category. Categories with no samples simply do not
/// appear in the map.
pub fn category_success_rates(patterns: &[LearnedPattern]) -> HashMap<String, f64> {
    let mut totals: HashMap<&str, (usize, usize)> = HashMap::new();
    for p in patterns {
        let entry = totals.entry(p.category.as_str()).or_default();
        entry.0 += 1;
        if p.completed {
            entry.1 += 1;
        }
    }
    totals
        .into_iter()
        .map(|(category, (total, completed))| {
            (category.to_string(), completed as f64 / total as f64)
        })
        .collect()
}

/// Completion rate per time-of-day slot; empty slots are 0.
pub fn optimal_time_slots(patterns: &[LearnedPattern]) -> TimeSlotRates {
    TimeSlotRates {
        morning: rate(patterns, |p| p.time_of_day == TimeOfDay::Morning),
        afternoon: rate(patterns, |p| p.time_of_day == TimeOfDay::Afternoon),
        evening: rate(patterns, |p| p.time_of_day == TimeOfDay::Evening),
    }
}

/// Completion rate per duration bucket; empty buckets are 0.
pub fn duration_preferences(patterns: &[LearnedPattern]) -> DurationRates {
    let bucket = |p: &LearnedPattern| DurationBucket::from_minutes(p.duration_minutes);
    DurationRates {
        short: rate(patterns, |p| bucket(p) == DurationBucket::Short),
        medium: rate(patterns, |p| bucket(p) == DurationBucket::Medium),
        long: rate(patterns, |p| bucket(p) == DurationBucket::Long),
    }
}

/// Completion rate per user-energy bucket; empty buckets are 0.
pub fn energy_alignment(patterns: &[LearnedPattern]) -> EnergyRates {
    let bucket = |p: &LearnedPattern| EnergyBucket::from_level(p.energy_level);
    EnergyRates {
        low: rate(patterns, |p| bucket(p) == EnergyBucket::Low),
        medium: rate(patterns, |p| bucket(p) == EnergyBucket::Medium),
        high: rate(patterns, |p| bucket(p) == EnergyBucket::High),
    }
}

/// Completion rate over the subset selected by `filter`, 0 when the
/// subset is empty.
fn rate(patterns: &[LearnedPattern], filter: impl Fn(&LearnedPattern) -> bool) -> f64 {
    let mut total = 0usize;
    let mut completed = 0usize;
    for p in patterns.iter().filter(|p| filter(p)) {
        total += 1;
        if p.completed {
            completed += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64
    }
}

/// Turn strong signals into short human-readable observations.
///
/// Advisory output only: insights are surfaced to the user and never fed
/// back into the bandit directly.
pub fn generate_insights(patterns: &[LearnedPattern]) -> Vec<String> {
    let mut insights = Vec::new();
    if patterns.is_empty() {
        return insights;
    }

    let mut category_counts: HashMap<&str, usize> = HashMap::new();
    for p in patterns {
        *category_counts.entry(p.category.as_str()).or_default() += 1;
    }
    let mut rates: Vec<_> = category_success_rates(patterns).into_iter().collect();
    rates.sort_by(|a, b| a.0.cmp(&b.0));
    for (category, success) in rates {
        // Require a few samples before calling a category signal strong
        if category_counts.get(category.as_str()).copied().unwrap_or(0) < 3 {
            continue;
        }
        if success > 0.8 {
            insights.push(format!(
                "You almost always finish {category} tasks you start"
            ));
        } else if success < 0.5 {
            insights.push(format!(
                "{category} tasks often stall; consider scheduling them differently"
            ));
        }
    }

    let slots = optimal_time_slots(patterns);
    let best_slot = [
        ("mornings", slots.morning),
        ("afternoons", slots.afternoon),
        ("evenings", slots.evening),
    ]
    .into_iter()
    .max_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((label, best)) = best_slot {
        if best > 0.7 {
            insights.push(format!("You follow through most reliably in the {label}"));
        }
    }

    let energy = energy_alignment(patterns);
    if energy.high > 0.7 && energy.low < 0.5 {
        insights.push("High-energy moments are your best window for getting things done".to_string());
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pattern(
        category: &str,
        time_of_day: TimeOfDay,
        energy_level: u8,
        duration_minutes: u32,
        completed: bool,
    ) -> LearnedPattern {
        LearnedPattern {
            category: category.to_string(),
            time_of_day,
            day_of_week: 1,
            energy_level,
            duration_minutes,
            completed,
            recorded_at: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_time_slots_split_cleanly() {
        let patterns = vec![
            pattern("work", TimeOfDay::Morning, 70, 30, true),
            pattern("work", TimeOfDay::Morning, 75, 30, true),
            pattern("work", TimeOfDay::Evening, 40, 30, false),
            pattern("work", TimeOfDay::Evening, 35, 30, false),
        ];
        let slots = optimal_time_slots(&patterns);
        assert_eq!(slots.morning, 1.0);
        assert_eq!(slots.evening, 0.0);
        // No afternoon samples: 0, not NaN
        assert_eq!(slots.afternoon, 0.0);
    }

    #[test]
    fn test_empty_input_never_divides_by_zero() {
        let slots = optimal_time_slots(&[]);
        assert_eq!(slots, TimeSlotRates::default());
        assert!(category_success_rates(&[]).is_empty());
        assert_eq!(duration_preferences(&[]), DurationRates::default());
        assert_eq!(energy_alignment(&[]), EnergyRates::default());
        assert!(generate_insights(&[]).is_empty());
    }

    #[test]
    fn test_category_rates() {
        let patterns = vec![
            pattern("writing", TimeOfDay::Morning, 70, 30, true),
            pattern("writing", TimeOfDay::Morning, 70, 30, false),
            pattern("admin", TimeOfDay::Afternoon, 50, 10, true),
        ];
        let rates = category_success_rates(&patterns);
        assert_eq!(rates["writing"], 0.5);
        assert_eq!(rates["admin"], 1.0);
        assert!(!rates.contains_key("errands"));
    }

    #[test]
    fn test_duration_and_energy_buckets() {
        let patterns = vec![
            pattern("work", TimeOfDay::Morning, 80, 10, true),
            pattern("work", TimeOfDay::Morning, 80, 12, true),
            pattern("work", TimeOfDay::Morning, 30, 60, false),
        ];
        let durations = duration_preferences(&patterns);
        assert_eq!(durations.short, 1.0);
        assert_eq!(durations.long, 0.0);
        assert_eq!(durations.medium, 0.0);

        let energy = energy_alignment(&patterns);
        assert_eq!(energy.high, 1.0);
        assert_eq!(energy.low, 0.0);
    }

    #[test]
    fn test_insights_require_strong_signal_and_samples() {
        // Two samples only: below the category sample floor
        let sparse = vec![
            pattern("writing", TimeOfDay::Morning, 70, 30, true),
            pattern("writing", TimeOfDay::Morning, 70, 30, true),
        ];
        let insights = generate_insights(&sparse);
        assert!(!insights.iter().any(|i| i.contains("writing")));

        let strong = vec![
            pattern("writing", TimeOfDay::Morning, 80, 30, true),
            pattern("writing", TimeOfDay::Morning, 80, 30, true),
            pattern("writing", TimeOfDay::Morning, 85, 30, true),
            pattern("chores", TimeOfDay::Evening, 30, 15, false),
            pattern("chores", TimeOfDay::Evening, 30, 15, false),
            pattern("chores", TimeOfDay::Evening, 35, 15, true),
        ];
        let insights = generate_insights(&strong);
        assert!(insights.iter().any(|i| i.contains("writing")));
        assert!(insights.iter().any(|i| i.contains("chores")));
        assert!(insights.iter().any(|i| i.contains("mornings")));
    }
}
