//! Read-only finance queries used by the alert evaluators, plus the insert
//! helpers the record screens (and tests) use to populate them.
//!
//! Every query is scoped to one group.

use crate::db::models::{Budget, Goal, GoalStatus, GroupId, Transaction, TransactionKind};
use crate::{Error, Result};
use chrono::NaiveDate;
use sqlx::SqlitePool;

type GoalRow = (String, String, f64, f64, NaiveDate, String);

fn goal_from_row(row: GoalRow) -> Result<Goal> {
    let (id, title, target_value, current_value, target_date, status) = row;
    Ok(Goal {
        id,
        title,
        target_value,
        current_value,
        target_date,
        status: status.parse::<GoalStatus>()?,
    })
}

/// All active goals of a group
pub async fn active_goals(pool: &SqlitePool, group: &GroupId) -> Result<Vec<Goal>> {
    let rows = sqlx::query_as::<_, GoalRow>(
        r#"
        SELECT id, title, target_value, current_value, target_date, status
        FROM goals
        WHERE group_id = ? AND status = 'active'
        ORDER BY target_date ASC
        "#,
    )
    .bind(group.as_str())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(goal_from_row).collect()
}

/// Active goals whose target date falls within `[from, to]`, earliest first
pub async fn active_goals_due_between(
    pool: &SqlitePool,
    group: &GroupId,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Goal>> {
    let rows = sqlx::query_as::<_, GoalRow>(
        r#"
        SELECT id, title, target_value, current_value, target_date, status
        FROM goals
        WHERE group_id = ?
          AND status = 'active'
          AND target_date >= ?
          AND target_date <= ?
        ORDER BY target_date ASC
        "#,
    )
    .bind(group.as_str())
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(goal_from_row).collect()
}

/// Budgets defined for a month, joined with their category name
///
/// Budgets whose category no longer exists are not returned.
pub async fn budgets_for_month(
    pool: &SqlitePool,
    group: &GroupId,
    month: u32,
    year: i32,
) -> Result<Vec<Budget>> {
    let rows = sqlx::query_as::<_, (String, String, String, f64, i64, i64)>(
        r#"
        SELECT b.id, b.category_id, c.name, b.limit_value, b.month, b.year
        FROM budgets b
        INNER JOIN categories c ON c.id = b.category_id
        WHERE b.group_id = ? AND b.month = ? AND b.year = ?
        ORDER BY c.name ASC
        "#,
    )
    .bind(group.as_str())
    .bind(month as i64)
    .bind(year as i64)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(id, category_id, category_name, limit, month, year)| {
            Ok(Budget {
                id,
                category_id,
                category_name,
                limit,
                month: u32::try_from(month)
                    .map_err(|_| Error::InvalidRecord(format!("budget month {}", month)))?,
                year: i32::try_from(year)
                    .map_err(|_| Error::InvalidRecord(format!("budget year {}", year)))?,
            })
        })
        .collect()
}

/// Sum of expense amounts for a category within `[from, until)`
pub async fn expense_total(
    pool: &SqlitePool,
    group: &GroupId,
    category_id: &str,
    from: NaiveDate,
    until: NaiveDate,
) -> Result<f64> {
    let total: f64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(amount), 0.0)
        FROM transactions
        WHERE group_id = ?
          AND category_id = ?
          AND kind = 'expense'
          AND occurred_on >= ?
          AND occurred_on < ?
        "#,
    )
    .bind(group.as_str())
    .bind(category_id)
    .bind(from)
    .bind(until)
    .fetch_one(pool)
    .await?;

    Ok(total)
}

/// Insert or replace a category
pub async fn insert_category(
    pool: &SqlitePool,
    group: &GroupId,
    id: &str,
    name: &str,
) -> Result<()> {
    sqlx::query("INSERT OR REPLACE INTO categories (id, group_id, name) VALUES (?, ?, ?)")
        .bind(id)
        .bind(group.as_str())
        .bind(name)
        .execute(pool)
        .await?;
    Ok(())
}

/// Insert or replace a goal
pub async fn insert_goal(pool: &SqlitePool, group: &GroupId, goal: &Goal) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO goals
            (id, group_id, title, target_value, current_value, target_date, status)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&goal.id)
    .bind(group.as_str())
    .bind(&goal.title)
    .bind(goal.target_value)
    .bind(goal.current_value)
    .bind(goal.target_date)
    .bind(goal.status.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

/// Insert or replace a budget; the category row must already exist
pub async fn insert_budget(pool: &SqlitePool, group: &GroupId, budget: &Budget) -> Result<()> {
    if budget.limit <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "Budget limit must be positive, got {}",
            budget.limit
        )));
    }

    sqlx::query(
        r#"
        INSERT OR REPLACE INTO budgets (id, group_id, category_id, limit_value, month, year)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&budget.id)
    .bind(group.as_str())
    .bind(&budget.category_id)
    .bind(budget.limit)
    .bind(budget.month as i64)
    .bind(budget.year as i64)
    .execute(pool)
    .await?;
    Ok(())
}

/// Insert or replace a transaction
pub async fn insert_transaction(
    pool: &SqlitePool,
    group: &GroupId,
    transaction: &Transaction,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO transactions (id, group_id, category_id, amount, kind, occurred_on)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&transaction.id)
    .bind(group.as_str())
    .bind(&transaction.category_id)
    .bind(transaction.amount)
    .bind(transaction.kind.as_str())
    .bind(transaction.occurred_on)
    .execute(pool)
    .await?;
    Ok(())
}

/// Convenience for the common case of recording an expense
pub fn expense(id: &str, category_id: &str, amount: f64, occurred_on: NaiveDate) -> Transaction {
    Transaction {
        id: id.to_string(),
        category_id: category_id.to_string(),
        amount,
        kind: TransactionKind::Expense,
        occurred_on,
    }
}
