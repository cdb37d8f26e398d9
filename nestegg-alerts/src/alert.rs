//! Alert entity and its strongly-typed payloads

use chrono::{DateTime, NaiveDate, Utc};
use nestegg_common::GroupId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of alert kinds
///
/// `GoalProgress` is reserved for consumers that switch on it; no evaluator
/// produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    GoalNearingDeadline,
    GoalCompleted,
    BudgetExceeded,
    BudgetNearLimit,
    GoalProgress,
}

impl AlertKind {
    pub const ALL: [AlertKind; 5] = [
        AlertKind::GoalNearingDeadline,
        AlertKind::GoalCompleted,
        AlertKind::BudgetExceeded,
        AlertKind::BudgetNearLimit,
        AlertKind::GoalProgress,
    ];

    /// Identifier prefix, also the `Display` form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoalNearingDeadline => "GoalNearingDeadline",
            Self::GoalCompleted => "GoalCompleted",
            Self::BudgetExceeded => "BudgetExceeded",
            Self::BudgetNearLimit => "BudgetNearLimit",
            Self::GoalProgress => "GoalProgress",
        }
    }

    /// Stable snake_case label for external consumers
    pub fn label(&self) -> &'static str {
        match self {
            Self::GoalNearingDeadline => "goal_nearing_deadline",
            Self::GoalCompleted => "goal_completed",
            Self::BudgetExceeded => "budget_exceeded",
            Self::BudgetNearLimit => "budget_near_limit",
            Self::GoalProgress => "goal_progress",
        }
    }

    /// Presentation hint used for icon and colour selection
    pub fn severity(&self) -> Severity {
        match self {
            Self::GoalCompleted => Severity::Success,
            Self::GoalNearingDeadline | Self::BudgetNearLimit => Severity::Warning,
            Self::BudgetExceeded => Severity::Critical,
            Self::GoalProgress => Severity::Info,
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert severity for presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Critical,
}

/// Numbers behind a goal alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalFacts {
    pub goal_id: String,
    pub title: String,
    pub target_value: f64,
    pub current_value: f64,
    pub target_date: NaiveDate,
    pub progress_percent: f64,
    pub days_remaining: i64,
}

/// Numbers behind a budget alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetFacts {
    pub budget_id: String,
    pub category_name: String,
    pub limit: f64,
    pub spent: f64,
    pub usage_percent: f64,
    pub month: u32,
    pub year: i32,
}

/// Kind-specific snapshot of the facts an alert was rendered from
///
/// The variant is the alert's kind, so kind and payload shape always agree.
/// Serialized adjacently tagged: `{"kind": "...", "facts": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "facts")]
pub enum AlertPayload {
    GoalNearingDeadline(GoalFacts),
    GoalCompleted(GoalFacts),
    BudgetExceeded(BudgetFacts),
    BudgetNearLimit(BudgetFacts),
    GoalProgress(GoalFacts),
}

impl AlertPayload {
    pub fn kind(&self) -> AlertKind {
        match self {
            Self::GoalNearingDeadline(_) => AlertKind::GoalNearingDeadline,
            Self::GoalCompleted(_) => AlertKind::GoalCompleted,
            Self::BudgetExceeded(_) => AlertKind::BudgetExceeded,
            Self::BudgetNearLimit(_) => AlertKind::BudgetNearLimit,
            Self::GoalProgress(_) => AlertKind::GoalProgress,
        }
    }

    /// Id of the goal or budget the alert was derived from
    pub fn source_id(&self) -> &str {
        match self {
            Self::GoalNearingDeadline(goal)
            | Self::GoalCompleted(goal)
            | Self::GoalProgress(goal) => &goal.goal_id,
            Self::BudgetExceeded(budget) | Self::BudgetNearLimit(budget) => &budget.budget_id,
        }
    }
}

/// Deterministic alert identity: `"{kind}_{source_id}"`
pub fn alert_id(kind: AlertKind, source_id: &str) -> String {
    format!("{}_{}", kind, source_id)
}

/// A persisted, user-dismissible fact derived from financial state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub title: String,
    pub message: String,
    pub payload: AlertPayload,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    /// Owning group, serialized as `groupKey`
    #[serde(rename = "groupKey")]
    pub group_id: GroupId,
}

impl Alert {
    pub fn kind(&self) -> AlertKind {
        self.payload.kind()
    }

    pub fn source_id(&self) -> &str {
        self.payload.source_id()
    }
}
