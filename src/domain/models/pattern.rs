//! Historical decision records and the patterns mined from them.
//!
//! Every resolved recommendation leaves one [`DecisionRecord`] behind.
//! The pattern miner replays a bounded window of these records as
//! [`LearnedPattern`]s to compute completion-rate aggregates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse time-of-day bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    /// Bucket an hour of day (0..=23). Night hours fold into Evening.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            _ => Self::Evening,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "morning" => Some(Self::Morning),
            "afternoon" => Some(Self::Afternoon),
            "evening" => Some(Self::Evening),
            _ => None,
        }
    }
}

/// Coarse task-duration bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationBucket {
    /// Up to 15 minutes
    Short,
    /// 16 to 45 minutes
    Medium,
    /// Longer than 45 minutes
    Long,
}

impl DurationBucket {
    /// Bucket a duration in minutes.
    pub fn from_minutes(minutes: u32) -> Self {
        match minutes {
            0..=15 => Self::Short,
            16..=45 => Self::Medium,
            _ => Self::Long,
        }
    }
}

/// Coarse user-energy bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyBucket {
    /// Below 40
    Low,
    /// 40 to 69
    Medium,
    /// 70 and above
    High,
}

impl EnergyBucket {
    /// Bucket an energy level (0..=100).
    pub fn from_level(level: u8) -> Self {
        match level {
            0..=39 => Self::Low,
            40..=69 => Self::Medium,
            _ => Self::High,
        }
    }
}

/// One aggregated historical observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedPattern {
    /// Task category the decision concerned
    pub category: String,
    /// Time-of-day bucket the decision fell into
    pub time_of_day: TimeOfDay,
    /// Day of week, Monday = 0
    pub day_of_week: u8,
    /// User energy 0..=100 at decision time
    pub energy_level: u8,
    /// Estimated task duration in minutes
    pub duration_minutes: u32,
    /// Whether the user followed through
    pub completed: bool,
    /// When the decision was resolved
    pub recorded_at: DateTime<Utc>,
}

/// One row in the decision log, written by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Unique identifier
    pub id: Uuid,
    /// Owner of the decision
    pub user_id: String,
    /// Task category (or the strategy label for non-task suggestions)
    pub category: String,
    /// Time-of-day bucket at decision time
    pub time_of_day: TimeOfDay,
    /// Day of week, Monday = 0
    pub day_of_week: u8,
    /// User energy 0..=100 at decision time
    pub energy_level: u8,
    /// Estimated task duration in minutes (0 for non-task suggestions)
    pub duration_minutes: u32,
    /// Whether the user followed through
    pub completed: bool,
    /// When the decision was resolved
    pub decided_at: DateTime<Utc>,
}

impl DecisionRecord {
    /// Create a record for a decision resolved at `decided_at`.
    pub fn new(
        user_id: impl Into<String>,
        category: impl Into<String>,
        decided_at: DateTime<Utc>,
        energy_level: u8,
        duration_minutes: u32,
        completed: bool,
    ) -> Self {
        use chrono::{Datelike, Timelike};
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            category: category.into(),
            time_of_day: TimeOfDay::from_hour(decided_at.hour()),
            day_of_week: decided_at.weekday().num_days_from_monday() as u8,
            energy_level: energy_level.min(100),
            duration_minutes,
            completed,
            decided_at,
        }
    }

    /// Project this record into the miner's aggregate shape.
    pub fn to_pattern(&self) -> LearnedPattern {
        LearnedPattern {
            category: self.category.clone(),
            time_of_day: self.time_of_day,
            day_of_week: self.day_of_week,
            energy_level: self.energy_level,
            duration_minutes: self.duration_minutes,
            completed: self.completed,
            recorded_at: self.decided_at,
        }
    }
}
