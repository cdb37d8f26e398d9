//! Shared fixtures for nestegg-alerts integration tests
//!
//! - `FakeFinance`: in-memory finance records with failure and latency switches
//! - `ProbeStore`: snapshot store that counts writes and detects overlapping ops

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use nestegg_alerts::store::{AlertStore, MemoryAlertStore};
use nestegg_alerts::{Alert, AlertSession, DefaultFormatter, FinanceSource, SessionConfig};
use nestegg_common::db::{expense, Budget, Goal, GoalStatus, Transaction, TransactionKind};
use nestegg_common::time::FixedClock;
use nestegg_common::GroupId;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const GROUP: &str = "couple-1";

pub fn group() -> GroupId {
    GroupId::from(GROUP)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Mid-June 2024, noon UTC
pub fn june_15() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

pub fn goal(id: &str, target: f64, current: f64, target_date: NaiveDate) -> Goal {
    Goal {
        id: id.to_string(),
        title: format!("Goal {}", id),
        target_value: target,
        current_value: current,
        target_date,
        status: GoalStatus::Active,
    }
}

pub fn budget(id: &str, category_id: &str, limit: f64, month: u32, year: i32) -> Budget {
    Budget {
        id: id.to_string(),
        category_id: category_id.to_string(),
        category_name: format!("Category {}", category_id),
        limit,
        month,
        year,
    }
}

#[derive(Default)]
struct FinanceData {
    goals: Vec<Goal>,
    budgets: Vec<Budget>,
    transactions: Vec<Transaction>,
}

/// In-memory finance records for a single group
#[derive(Default)]
pub struct FakeFinance {
    data: Mutex<FinanceData>,
    fail_goals: AtomicBool,
    fail_budgets: AtomicBool,
    fail_expense_for: Mutex<Option<String>>,
    delay: Mutex<Duration>,
    queries: AtomicUsize,
}

impl FakeFinance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_goal(&self, goal: Goal) {
        self.data.lock().unwrap().goals.push(goal);
    }

    pub fn add_budget(&self, budget: Budget) {
        self.data.lock().unwrap().budgets.push(budget);
    }

    pub fn add_expense(&self, category_id: &str, amount: f64, on: NaiveDate) {
        let mut data = self.data.lock().unwrap();
        let id = format!("t{}", data.transactions.len() + 1);
        data.transactions.push(expense(&id, category_id, amount, on));
    }

    pub fn add_income(&self, category_id: &str, amount: f64, on: NaiveDate) {
        let mut data = self.data.lock().unwrap();
        let id = format!("t{}", data.transactions.len() + 1);
        data.transactions.push(Transaction {
            id,
            category_id: category_id.to_string(),
            amount,
            kind: TransactionKind::Income,
            occurred_on: on,
        });
    }

    pub fn clear_transactions(&self) {
        self.data.lock().unwrap().transactions.clear();
    }

    pub fn set_goal_current(&self, id: &str, current: f64) {
        let mut data = self.data.lock().unwrap();
        if let Some(goal) = data.goals.iter_mut().find(|g| g.id == id) {
            goal.current_value = current;
        }
    }

    pub fn fail_goals(&self, fail: bool) {
        self.fail_goals.store(fail, Ordering::SeqCst);
    }

    pub fn fail_budgets(&self, fail: bool) {
        self.fail_budgets.store(fail, Ordering::SeqCst);
    }

    pub fn fail_expense_for(&self, category_id: Option<&str>) {
        *self.fail_expense_for.lock().unwrap() = category_id.map(str::to_string);
    }

    /// Latency added to every query
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    async fn enter(&self, group: &GroupId) -> bool {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        group.as_str() == GROUP
    }
}

fn injected(what: &str) -> nestegg_common::Error {
    nestegg_common::Error::Internal(format!("injected {} failure", what))
}

#[async_trait]
impl FinanceSource for FakeFinance {
    async fn active_goals(&self, group: &GroupId) -> nestegg_common::Result<Vec<Goal>> {
        if !self.enter(group).await {
            return Ok(Vec::new());
        }
        if self.fail_goals.load(Ordering::SeqCst) {
            return Err(injected("goal query"));
        }
        let data = self.data.lock().unwrap();
        Ok(data.goals.iter().filter(|g| g.is_active()).cloned().collect())
    }

    async fn active_goals_due_between(
        &self,
        group: &GroupId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> nestegg_common::Result<Vec<Goal>> {
        if !self.enter(group).await {
            return Ok(Vec::new());
        }
        if self.fail_goals.load(Ordering::SeqCst) {
            return Err(injected("goal query"));
        }
        let data = self.data.lock().unwrap();
        let mut goals: Vec<Goal> = data
            .goals
            .iter()
            .filter(|g| g.is_active() && g.target_date >= from && g.target_date <= to)
            .cloned()
            .collect();
        goals.sort_by_key(|g| g.target_date);
        Ok(goals)
    }

    async fn budgets_for_month(
        &self,
        group: &GroupId,
        month: u32,
        year: i32,
    ) -> nestegg_common::Result<Vec<Budget>> {
        if !self.enter(group).await {
            return Ok(Vec::new());
        }
        if self.fail_budgets.load(Ordering::SeqCst) {
            return Err(injected("budget query"));
        }
        let data = self.data.lock().unwrap();
        Ok(data
            .budgets
            .iter()
            .filter(|b| b.month == month && b.year == year)
            .cloned()
            .collect())
    }

    async fn expense_total(
        &self,
        group: &GroupId,
        category_id: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> nestegg_common::Result<f64> {
        if !self.enter(group).await {
            return Ok(0.0);
        }
        if self.fail_expense_for.lock().unwrap().as_deref() == Some(category_id) {
            return Err(injected("expense aggregation"));
        }
        let data = self.data.lock().unwrap();
        Ok(data
            .transactions
            .iter()
            .filter(|t| {
                t.kind == TransactionKind::Expense
                    && t.category_id == category_id
                    && t.occurred_on >= from
                    && t.occurred_on < until
            })
            .map(|t| t.amount)
            .sum())
    }
}

/// Snapshot store wrapper that records how it is used
#[derive(Default)]
pub struct ProbeStore {
    inner: MemoryAlertStore,
    puts: AtomicUsize,
    in_flight: AtomicUsize,
    overlapped: AtomicBool,
    fail_get: AtomicBool,
    fail_put: AtomicBool,
    corrupt: AtomicBool,
    put_delay: Mutex<Duration>,
}

impl ProbeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// True if two store operations ever ran at the same time
    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    pub fn fail_get(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn fail_put(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::SeqCst);
    }

    /// Make reads behave as if the stored snapshot were undecodable
    pub fn corrupt(&self, corrupt: bool) {
        self.corrupt.store(corrupt, Ordering::SeqCst);
    }

    pub fn set_put_delay(&self, delay: Duration) {
        *self.put_delay.lock().unwrap() = delay;
    }

    /// Stored snapshot, bypassing the failure switches
    pub async fn snapshot(&self, group: &GroupId) -> Vec<Alert> {
        self.inner.get(group).await.unwrap()
    }

    pub async fn seed(&self, group: &GroupId, alerts: &[Alert]) {
        self.inner.put(group, alerts).await.unwrap();
    }

    fn begin(&self) {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlapped.store(true, Ordering::SeqCst);
        }
    }

    fn end(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AlertStore for ProbeStore {
    async fn get(&self, group: &GroupId) -> nestegg_alerts::Result<Vec<Alert>> {
        self.begin();
        let result = if self.fail_get.load(Ordering::SeqCst) {
            Err(nestegg_alerts::Error::Unavailable("injected read failure".to_string()))
        } else if self.corrupt.load(Ordering::SeqCst) {
            let source = serde_json::from_str::<Vec<Alert>>("{not json").unwrap_err();
            Err(nestegg_alerts::Error::CorruptSnapshot {
                group: group.clone(),
                source,
            })
        } else {
            self.inner.get(group).await
        };
        self.end();
        result
    }

    async fn put(&self, group: &GroupId, alerts: &[Alert]) -> nestegg_alerts::Result<()> {
        self.begin();
        let delay = *self.put_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let result = if self.fail_put.load(Ordering::SeqCst) {
            Err(nestegg_alerts::Error::Unavailable("injected write failure".to_string()))
        } else {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.inner.put(group, alerts).await
        };
        self.end();
        result
    }
}

/// Session wired to fakes, with its collaborators exposed for poking
pub struct Harness {
    pub finance: Arc<FakeFinance>,
    pub store: Arc<ProbeStore>,
    pub clock: Arc<FixedClock>,
    pub session: AlertSession,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(SessionConfig {
            refresh_interval: Duration::from_secs(3600),
            query_timeout: Duration::from_secs(5),
        })
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let finance = Arc::new(FakeFinance::new());
        let store = Arc::new(ProbeStore::new());
        let clock = Arc::new(FixedClock::new(june_15()));
        let session = AlertSession::new(
            finance.clone(),
            store.clone(),
            Arc::new(DefaultFormatter::default()),
            clock.clone(),
            config,
        );
        Self {
            finance,
            store,
            clock,
            session,
        }
    }
}

pub fn ids(alerts: &[Alert]) -> Vec<String> {
    alerts.iter().map(|a| a.id.clone()).collect()
}
