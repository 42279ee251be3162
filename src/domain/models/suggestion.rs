//! The engine's output: a suggestion and the user's response to it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::context::TaskSnapshot;
use super::strategy::StrategyArm;

/// A non-task action the engine can recommend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellbeingAction {
    /// Stand up, stretch, or take a short walk
    Movement,
    /// A short breathing or cognitive reset
    Breathing,
    /// Wrap up and step away from new work
    StepAway,
}

impl WellbeingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movement => "movement",
            Self::Breathing => "breathing",
            Self::StepAway => "step_away",
        }
    }
}

/// What a suggestion points at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SuggestionKind {
    /// A specific task from the user's list
    Task {
        /// Identifier of the suggested task
        task_id: Uuid,
    },
    /// A wellbeing action instead of a task
    Wellbeing {
        /// The recommended action
        action: WellbeingAction,
    },
    /// Nothing to surface right now
    None,
}

/// A recommendation surfaced to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// What is being suggested
    pub kind: SuggestionKind,
    /// The strategy arm that produced this suggestion
    pub arm: StrategyArm,
    /// Short human-readable justification
    pub reason: String,
}

impl Suggestion {
    /// A task suggestion.
    pub fn task(task_id: Uuid, arm: StrategyArm, reason: impl Into<String>) -> Self {
        Self {
            kind: SuggestionKind::Task { task_id },
            arm,
            reason: reason.into(),
        }
    }

    /// A wellbeing suggestion.
    pub fn wellbeing(action: WellbeingAction, arm: StrategyArm, reason: impl Into<String>) -> Self {
        Self {
            kind: SuggestionKind::Wellbeing { action },
            arm,
            reason: reason.into(),
        }
    }

    /// An empty suggestion.
    pub fn none(arm: StrategyArm, reason: impl Into<String>) -> Self {
        Self {
            kind: SuggestionKind::None,
            arm,
            reason: reason.into(),
        }
    }

    /// The suggested task id, if this is a task suggestion.
    pub fn task_id(&self) -> Option<Uuid> {
        match self.kind {
            SuggestionKind::Task { task_id } => Some(task_id),
            _ => None,
        }
    }
}

/// How the user responded to a surfaced suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SuggestionOutcome {
    /// The user took the suggestion
    Accepted,
    /// The user explicitly dismissed it
    Dismissed,
    /// The user ignored it and completed a different task instead
    OrganicSelection {
        /// The task the user actually completed
        completed: TaskSnapshot,
    },
    /// The suggested session ran to completion
    SessionCompleted,
    /// The suggested session was started but abandoned
    SessionAbandoned,
}
