//! Strategy arms: the closed set of recommendation heuristics the bandit
//! chooses among.
//!
//! Arm indices are part of the persisted-model contract. New arms must be
//! appended at the end; an existing index must never be reused for a
//! different heuristic.

use serde::{Deserialize, Serialize};

use super::context::{EnergyCost, SuggestionContext};

/// A recommendation heuristic the bandit can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyArm {
    /// A long, high-energy task for a focus block
    LongFocusBlock,
    /// A short, high-energy task
    ShortBurst,
    /// Continue in the same category as the last completed task
    ContinueCategory,
    /// Switch category to avoid burnout
    SwitchCategory,
    /// The task with the nearest deadline
    NearestDeadline,
    /// A low-energy task
    LowEnergyTask,
    /// Get up and move (wellbeing, not a task)
    PhysicalReset,
    /// Breathing or cognitive reset (wellbeing, not a task)
    BreathingReset,
    /// Surface nothing at all
    NoSuggestion,
    /// Explicitly pull back from taking on new work
    PullBack,
    /// Revive a backlog item at least 14 days old with no deadline
    StaleRevival,
    /// A chain of small quick wins
    QuickWinChain,
    /// A low-effort task to wind the evening down
    EveningWindDown,
}

impl StrategyArm {
    /// All arms in persisted-index order.
    pub const ALL: [StrategyArm; 13] = [
        Self::LongFocusBlock,
        Self::ShortBurst,
        Self::ContinueCategory,
        Self::SwitchCategory,
        Self::NearestDeadline,
        Self::LowEnergyTask,
        Self::PhysicalReset,
        Self::BreathingReset,
        Self::NoSuggestion,
        Self::PullBack,
        Self::StaleRevival,
        Self::QuickWinChain,
        Self::EveningWindDown,
    ];

    /// The arm's positional index in the persisted model.
    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|a| a == self)
            .unwrap_or_default()
    }

    /// Look an arm up by persisted index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LongFocusBlock => "long_focus_block",
            Self::ShortBurst => "short_burst",
            Self::ContinueCategory => "continue_category",
            Self::SwitchCategory => "switch_category",
            Self::NearestDeadline => "nearest_deadline",
            Self::LowEnergyTask => "low_energy_task",
            Self::PhysicalReset => "physical_reset",
            Self::BreathingReset => "breathing_reset",
            Self::NoSuggestion => "no_suggestion",
            Self::PullBack => "pull_back",
            Self::StaleRevival => "stale_revival",
            Self::QuickWinChain => "quick_win_chain",
            Self::EveningWindDown => "evening_wind_down",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.as_str() == s)
    }

    /// Whether this arm resolves to a wellbeing action rather than a task.
    pub fn is_wellbeing(&self) -> bool {
        matches!(self, Self::PhysicalReset | Self::BreathingReset | Self::PullBack)
    }

    /// Whether this arm's preconditions are satisfiable in the given
    /// context.
    ///
    /// This is the single source of truth for arm validity; the
    /// orchestrator and any future caller filter through it before
    /// prediction.
    pub fn is_applicable(&self, ctx: &SuggestionContext) -> bool {
        let tasks = &ctx.active_tasks;
        match self {
            Self::LongFocusBlock => {
                ctx.available_minutes >= 45
                    && tasks.iter().any(|t| {
                        t.duration_minutes >= 45 && t.energy_cost == EnergyCost::High
                    })
            }
            Self::ShortBurst => tasks.iter().any(|t| {
                t.duration_minutes <= 25 && t.energy_cost != EnergyCost::Low
            }),
            Self::ContinueCategory => ctx.last_completed().is_some_and(|last| {
                tasks.iter().any(|t| t.category == last.category)
            }),
            Self::SwitchCategory => ctx.last_completed().is_some_and(|last| {
                tasks.iter().any(|t| t.category != last.category)
            }),
            Self::NearestDeadline => tasks.iter().any(|t| t.deadline.is_some()),
            Self::LowEnergyTask => tasks.iter().any(|t| t.energy_cost == EnergyCost::Low),
            // Wellbeing resets and opting out need no task at all
            Self::PhysicalReset | Self::BreathingReset | Self::NoSuggestion => true,
            Self::PullBack => !tasks.is_empty(),
            Self::StaleRevival => tasks.iter().any(|t| t.is_stale(ctx.now)),
            Self::QuickWinChain => {
                tasks.iter().filter(|t| t.duration_minutes <= 15).count() >= 2
            }
            Self::EveningWindDown => {
                ctx.is_evening()
                    && tasks.iter().any(|t| {
                        t.energy_cost == EnergyCost::Low || t.duration_minutes <= 20
                    })
            }
        }
    }

    /// Indices of all arms applicable in the given context, in persisted
    /// order.
    pub fn valid_arms(ctx: &SuggestionContext) -> Vec<usize> {
        Self::ALL
            .iter()
            .enumerate()
            .filter(|(_, arm)| arm.is_applicable(ctx))
            .map(|(i, _)| i)
            .collect()
    }
}
