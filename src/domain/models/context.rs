//! Point-in-time snapshot of the user's situation.
//!
//! A [`SuggestionContext`] is assembled by the host application from its
//! task/tag store and the device's environmental sensors, then handed to
//! the engine. The engine never mutates it.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pattern::LearnedPattern;

/// Coarse energy demand of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyCost {
    Low,
    Medium,
    High,
}

impl Default for EnergyCost {
    fn default() -> Self {
        Self::Medium
    }
}

impl EnergyCost {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Midpoint of the user-energy range (0..=1) this cost maps onto.
    pub fn energy_fraction(&self) -> f64 {
        match self {
            Self::Low => 0.25,
            Self::Medium => 0.55,
            Self::High => 0.85,
        }
    }
}

/// A task as seen by the recommendation engine.
///
/// This is a read-only projection of whatever the host application's task
/// store holds; only the fields the engine reasons about are carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Identifier in the host task store
    pub id: Uuid,
    /// Human-readable title, used in suggestion reasons
    pub title: String,
    /// Category/tag the task belongs to
    pub category: String,
    /// Estimated duration in minutes
    pub duration_minutes: u32,
    /// Coarse energy demand
    pub energy_cost: EnergyCost,
    /// Optional hard deadline
    pub deadline: Option<DateTime<Utc>>,
    /// When the task entered the backlog
    pub created_at: DateTime<Utc>,
    /// When the task was completed, if it was
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskSnapshot {
    /// Create an active task snapshot.
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
        duration_minutes: u32,
        energy_cost: EnergyCost,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            category: category.into(),
            duration_minutes,
            energy_cost,
            deadline: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Set a deadline.
    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the backlog entry time.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Mark the task completed at the given time.
    pub fn with_completed_at(mut self, completed_at: DateTime<Utc>) -> Self {
        self.completed_at = Some(completed_at);
        self
    }

    /// Age of the task in whole days at `now`.
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days()
    }

    /// Whether the task has sat in the backlog for at least 14 days
    /// without a deadline forcing it forward.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_none() && self.age_days(now) >= 14
    }
}

/// Environmental and device signals supplied by the snapshot provider.
///
/// All fields are optional in spirit: a missing provider is represented by
/// `EnvironmentSnapshot::default()`, which the feature encoder treats as
/// neutral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    /// Coarse location label ("home", "office", ...)
    pub location_label: Option<String>,
    /// Whether the device is online
    pub online: bool,
    /// Motion intensity in 0.0..=1.0 (0 = stationary)
    pub motion_intensity: f64,
    /// Whether the current time falls inside the user's work hours
    pub work_hours: bool,
}

impl Default for EnvironmentSnapshot {
    fn default() -> Self {
        Self {
            location_label: None,
            online: true,
            motion_intensity: 0.0,
            work_hours: false,
        }
    }
}

/// A historical energy reading, used when replaying completed tasks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyRecord {
    /// When the reading was taken
    pub recorded_at: DateTime<Utc>,
    /// Energy level 0..=100
    pub energy: u8,
}

/// Everything the engine knows about the user's situation right now.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionContext {
    /// Current wall-clock time
    pub now: DateTime<Utc>,
    /// Self-reported energy 0..=100
    pub energy: u8,
    /// Minutes the user says they have available
    pub available_minutes: u32,
    /// Tasks currently actionable
    pub active_tasks: Vec<TaskSnapshot>,
    /// Known tags/categories
    pub tags: Vec<String>,
    /// Recently completed tasks, most recent last or unordered
    pub recently_completed: Vec<TaskSnapshot>,
    /// Total backlog size (may exceed `active_tasks.len()`)
    pub backlog_count: usize,
    /// Recent mined patterns, if the caller has them
    pub patterns: Vec<LearnedPattern>,
    /// Environmental snapshot
    pub environment: EnvironmentSnapshot,
}

impl SuggestionContext {
    /// Create a context with the required scalar signals; collections start
    /// empty and the environment starts neutral.
    pub fn new(now: DateTime<Utc>, energy: u8, available_minutes: u32) -> Self {
        Self {
            now,
            energy: energy.min(100),
            available_minutes,
            active_tasks: Vec::new(),
            tags: Vec::new(),
            recently_completed: Vec::new(),
            backlog_count: 0,
            patterns: Vec::new(),
            environment: EnvironmentSnapshot::default(),
        }
    }

    /// Set the active task list and backlog count in one step.
    pub fn with_tasks(mut self, tasks: Vec<TaskSnapshot>) -> Self {
        self.backlog_count = tasks.len();
        self.active_tasks = tasks;
        self
    }

    /// Hour of day 0..=23 at `now`.
    pub fn hour(&self) -> u32 {
        self.now.hour()
    }

    /// Day of week with Monday = 0.
    pub fn day_of_week(&self) -> u8 {
        self.now.weekday().num_days_from_monday() as u8
    }

    /// The most recently completed task, by completion time.
    pub fn last_completed(&self) -> Option<&TaskSnapshot> {
        self.recently_completed
            .iter()
            .filter(|t| t.completed_at.is_some())
            .max_by_key(|t| t.completed_at)
    }

    /// Whether it is evening (18:00 or later) at `now`.
    pub fn is_evening(&self) -> bool {
        self.hour() >= 18
    }
}
