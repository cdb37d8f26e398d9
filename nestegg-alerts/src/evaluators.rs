//! Condition evaluators
//!
//! Four independent read-only scans, each over one financial domain and
//! scoped to a single group:
//! - goals nearing their deadline
//! - goals completed
//! - budgets exceeded
//! - budgets near their limit
//!
//! Each returns candidate facts, not alerts. [`evaluate_all`] runs the four
//! concurrently, waits for all of them, and isolates failures: an evaluator
//! that errors or exceeds its time bound contributes nothing.

use crate::alert::{BudgetFacts, GoalFacts};
use crate::metrics::{
    budget_band, budget_usage_percent, days_remaining, goal_progress_percent, BudgetBand,
    DEADLINE_WINDOW_DAYS,
};
use crate::source::FinanceSource;
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use nestegg_common::db::Goal;
use nestegg_common::time::{month_and_year, month_window};
use nestegg_common::GroupId;
use std::future::Future;
use tracing::{debug, warn};

/// Candidate facts from one evaluation pass, grouped by evaluator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    pub nearing_deadline: Vec<GoalFacts>,
    pub completed: Vec<GoalFacts>,
    pub exceeded: Vec<BudgetFacts>,
    pub near_limit: Vec<BudgetFacts>,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.nearing_deadline.len() + self.completed.len() + self.exceeded.len() + self.near_limit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn goal_facts(goal: &Goal, now: DateTime<Utc>) -> GoalFacts {
    GoalFacts {
        goal_id: goal.id.clone(),
        title: goal.title.clone(),
        target_value: goal.target_value,
        current_value: goal.current_value,
        target_date: goal.target_date,
        progress_percent: goal_progress_percent(goal.current_value, goal.target_value),
        days_remaining: days_remaining(goal.target_date, now),
    }
}

/// Active goals due within `[today, today + 30 days]`, earliest first
pub async fn goals_nearing_deadline(
    source: &dyn FinanceSource,
    group: &GroupId,
    now: DateTime<Utc>,
) -> Result<Vec<GoalFacts>> {
    let today = now.date_naive();
    let horizon = today + Duration::days(DEADLINE_WINDOW_DAYS);

    let mut goals: Vec<Goal> = source
        .active_goals_due_between(group, today, horizon)
        .await?
        .into_iter()
        .filter(|g| g.is_active() && g.target_date >= today && g.target_date <= horizon)
        .collect();
    goals.sort_by_key(|g| g.target_date);

    Ok(goals.iter().map(|g| goal_facts(g, now)).collect())
}

/// Active goals whose current value has reached the target
///
/// Purely observational: the goal stays active in storage and is detected
/// again on every pass.
pub async fn goals_completed(
    source: &dyn FinanceSource,
    group: &GroupId,
    now: DateTime<Utc>,
) -> Result<Vec<GoalFacts>> {
    let goals = source.active_goals(group).await?;

    Ok(goals
        .iter()
        .filter(|g| g.is_active() && g.current_value >= g.target_value)
        .map(|g| goal_facts(g, now))
        .collect())
}

/// Usage of every budget defined for the current calendar month
///
/// A failed spend aggregation skips that budget only.
async fn current_month_budget_usage(
    source: &dyn FinanceSource,
    group: &GroupId,
    now: DateTime<Utc>,
) -> Result<Vec<BudgetFacts>> {
    let (month, year) = month_and_year(now.date_naive());
    let (from, until) = month_window(year, month).ok_or_else(|| {
        nestegg_common::Error::Internal(format!("No month window for {}-{}", year, month))
    })?;

    let budgets = source.budgets_for_month(group, month, year).await?;
    let mut usage = Vec::with_capacity(budgets.len());

    for budget in budgets {
        let spent = match source
            .expense_total(group, &budget.category_id, from, until)
            .await
        {
            Ok(spent) => spent,
            Err(e) => {
                warn!(
                    "Skipping budget {} ({}): expense aggregation failed: {}",
                    budget.id, budget.category_name, e
                );
                continue;
            }
        };

        usage.push(BudgetFacts {
            usage_percent: budget_usage_percent(spent, budget.limit),
            budget_id: budget.id,
            category_name: budget.category_name,
            limit: budget.limit,
            spent,
            month: budget.month,
            year: budget.year,
        });
    }

    Ok(usage)
}

/// Current-month budgets at or above 100% usage
pub async fn budgets_exceeded(
    source: &dyn FinanceSource,
    group: &GroupId,
    now: DateTime<Utc>,
) -> Result<Vec<BudgetFacts>> {
    let usage = current_month_budget_usage(source, group, now).await?;
    Ok(usage
        .into_iter()
        .filter(|b| budget_band(b.usage_percent) == BudgetBand::Exceeded)
        .collect())
}

/// Current-month budgets with usage in `[80, 100)`
pub async fn budgets_near_limit(
    source: &dyn FinanceSource,
    group: &GroupId,
    now: DateTime<Utc>,
) -> Result<Vec<BudgetFacts>> {
    let usage = current_month_budget_usage(source, group, now).await?;
    Ok(usage
        .into_iter()
        .filter(|b| budget_band(b.usage_percent) == BudgetBand::NearLimit)
        .collect())
}

/// Run one evaluator under a time bound, turning any failure into no facts
async fn isolated<T, F>(evaluator: &'static str, limit: std::time::Duration, scan: F) -> Vec<T>
where
    F: Future<Output = Result<Vec<T>>>,
{
    match tokio::time::timeout(limit, scan).await {
        Ok(Ok(facts)) => {
            debug!("Evaluator '{}' produced {} candidates", evaluator, facts.len());
            facts
        }
        Ok(Err(e)) => {
            warn!("Evaluator '{}' failed, contributing no candidates: {}", evaluator, e);
            Vec::new()
        }
        Err(_) => {
            warn!(
                "Evaluator '{}' timed out after {:?}, contributing no candidates",
                evaluator, limit
            );
            Vec::new()
        }
    }
}

/// Run all four evaluators concurrently and wait for every one of them
pub async fn evaluate_all(
    source: &dyn FinanceSource,
    group: &GroupId,
    now: DateTime<Utc>,
    query_timeout: std::time::Duration,
) -> CandidateSet {
    let (nearing_deadline, completed, exceeded, near_limit) = tokio::join!(
        isolated(
            "goals_nearing_deadline",
            query_timeout,
            goals_nearing_deadline(source, group, now)
        ),
        isolated("goals_completed", query_timeout, goals_completed(source, group, now)),
        isolated("budgets_exceeded", query_timeout, budgets_exceeded(source, group, now)),
        isolated("budgets_near_limit", query_timeout, budgets_near_limit(source, group, now)),
    );

    CandidateSet {
        nearing_deadline,
        completed,
        exceeded,
        near_limit,
    }
}
