//! Read-only access to the finance records the evaluators scan

use async_trait::async_trait;
use chrono::NaiveDate;
use nestegg_common::db::{self, Budget, Goal};
use nestegg_common::{GroupId, Result};
use sqlx::SqlitePool;

/// Finance record queries, all scoped to one group
///
/// Implementations own their own timeout/retry policy; the evaluators add an
/// outer bound on top.
#[async_trait]
pub trait FinanceSource: Send + Sync {
    /// Goals whose status is active
    async fn active_goals(&self, group: &GroupId) -> Result<Vec<Goal>>;

    /// Active goals due within `[from, to]`, earliest target date first
    async fn active_goals_due_between(
        &self,
        group: &GroupId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Goal>>;

    /// Budgets defined for a month (1-12) and year, with category names
    async fn budgets_for_month(&self, group: &GroupId, month: u32, year: i32)
        -> Result<Vec<Budget>>;

    /// Sum of expense amounts for a category within `[from, until)`
    async fn expense_total(
        &self,
        group: &GroupId,
        category_id: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<f64>;
}

/// [`FinanceSource`] backed by the shared SQLite database
#[derive(Clone)]
pub struct SqliteFinanceSource {
    pool: SqlitePool,
}

impl SqliteFinanceSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FinanceSource for SqliteFinanceSource {
    async fn active_goals(&self, group: &GroupId) -> Result<Vec<Goal>> {
        db::active_goals(&self.pool, group).await
    }

    async fn active_goals_due_between(
        &self,
        group: &GroupId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Goal>> {
        db::active_goals_due_between(&self.pool, group, from, to).await
    }

    async fn budgets_for_month(
        &self,
        group: &GroupId,
        month: u32,
        year: i32,
    ) -> Result<Vec<Budget>> {
        db::budgets_for_month(&self.pool, group, month, year).await
    }

    async fn expense_total(
        &self,
        group: &GroupId,
        category_id: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<f64> {
        db::expense_total(&self.pool, group, category_id, from, until).await
    }
}
