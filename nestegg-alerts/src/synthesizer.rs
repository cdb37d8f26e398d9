//! Turns candidate facts into canonical alerts
//!
//! Identity is `(kind, source record)`: the same record under two different
//! evaluators yields two alerts with different ids.

use crate::alert::{alert_id, Alert, AlertPayload};
use crate::evaluators::CandidateSet;
use chrono::{DateTime, Utc};
use nestegg_common::GroupId;

/// Renders alert text from precomputed payload numbers
///
/// Locale and currency handling live behind this trait; the synthesizer only
/// hands over numbers.
pub trait AlertFormatter: Send + Sync {
    fn title(&self, payload: &AlertPayload) -> String;
    fn message(&self, payload: &AlertPayload) -> String;
}

/// English templates with a configurable currency symbol
#[derive(Debug, Clone)]
pub struct DefaultFormatter {
    currency_symbol: String,
}

impl DefaultFormatter {
    pub fn new(currency_symbol: impl Into<String>) -> Self {
        Self {
            currency_symbol: currency_symbol.into(),
        }
    }

    fn percent(value: f64) -> String {
        format!("{:.1}", value)
    }

    fn money(&self, value: f64) -> String {
        format!("{}{:.2}", self.currency_symbol, value)
    }
}

impl Default for DefaultFormatter {
    fn default() -> Self {
        Self::new("$")
    }
}

impl AlertFormatter for DefaultFormatter {
    fn title(&self, payload: &AlertPayload) -> String {
        match payload {
            AlertPayload::GoalNearingDeadline(_) => "Goal deadline approaching",
            AlertPayload::GoalCompleted(_) => "Goal reached!",
            AlertPayload::BudgetExceeded(_) => "Budget exceeded",
            AlertPayload::BudgetNearLimit(_) => "Budget nearing its limit",
            AlertPayload::GoalProgress(_) => "Goal progress",
        }
        .to_string()
    }

    fn message(&self, payload: &AlertPayload) -> String {
        match payload {
            AlertPayload::GoalNearingDeadline(goal) => format!(
                "Goal \"{}\" is due in {} days. Progress: {}%",
                goal.title,
                goal.days_remaining,
                Self::percent(goal.progress_percent)
            ),
            AlertPayload::GoalCompleted(goal) => {
                format!("Congratulations! Goal \"{}\" has been reached!", goal.title)
            }
            AlertPayload::BudgetExceeded(budget) => format!(
                "The {} budget was exceeded by {}% ({} of {})",
                budget.category_name,
                Self::percent(budget.usage_percent - 100.0),
                self.money(budget.spent),
                self.money(budget.limit)
            ),
            AlertPayload::BudgetNearLimit(budget) => format!(
                "The {} budget is at {}% of its limit ({} of {})",
                budget.category_name,
                Self::percent(budget.usage_percent),
                self.money(budget.spent),
                self.money(budget.limit)
            ),
            AlertPayload::GoalProgress(goal) => format!(
                "Goal \"{}\" is at {}%",
                goal.title,
                Self::percent(goal.progress_percent)
            ),
        }
    }
}

/// Build an unread alert for one payload
pub fn build_alert(
    payload: AlertPayload,
    group: &GroupId,
    now: DateTime<Utc>,
    formatter: &dyn AlertFormatter,
) -> Alert {
    Alert {
        id: alert_id(payload.kind(), payload.source_id()),
        title: formatter.title(&payload),
        message: formatter.message(&payload),
        payload,
        is_read: false,
        created_at: now,
        group_id: group.clone(),
    }
}

/// Synthesize alerts for every candidate, in evaluator order
pub fn synthesize(
    candidates: CandidateSet,
    group: &GroupId,
    now: DateTime<Utc>,
    formatter: &dyn AlertFormatter,
) -> Vec<Alert> {
    let CandidateSet {
        nearing_deadline,
        completed,
        exceeded,
        near_limit,
    } = candidates;

    nearing_deadline
        .into_iter()
        .map(AlertPayload::GoalNearingDeadline)
        .chain(completed.into_iter().map(AlertPayload::GoalCompleted))
        .chain(exceeded.into_iter().map(AlertPayload::BudgetExceeded))
        .chain(near_limit.into_iter().map(AlertPayload::BudgetNearLimit))
        .map(|payload| build_alert(payload, group, now, formatter))
        .collect()
}
