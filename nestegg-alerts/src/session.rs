//! Alert session controller
//!
//! Owns the in-memory alert list for one active group and drives the
//! evaluate → synthesize → merge → persist pipeline, both on demand and from
//! a recurring ticker.
//!
//! Lifecycle:
//! - `Uninitialized` until [`AlertSession::activate`] supplies a group
//! - `Loading` while a pass runs
//! - `Ready` or `ReadyWithError` afterwards
//! - back to `Uninitialized` on [`AlertSession::deactivate`]
//!
//! Passes and mutations are serialized through one async mutex, so the
//! stored snapshot is never written by two interleaved operations. No
//! operation returns an error: failures are logged and surface through
//! [`AlertSession::last_error`].

use crate::alert::{Alert, AlertKind};
use crate::evaluators::evaluate_all;
use crate::merge::merge;
use crate::source::FinanceSource;
use crate::store::AlertStore;
use crate::synthesizer::{synthesize, AlertFormatter};
use nestegg_common::config::AlertsConfig;
use nestegg_common::time::{secs_to_duration, Clock};
use nestegg_common::GroupId;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Timing knobs for a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Interval between automatic refreshes
    pub refresh_interval: Duration,
    /// Upper bound on each evaluator's queries
    pub query_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&AlertsConfig::default())
    }
}

impl From<&AlertsConfig> for SessionConfig {
    fn from(config: &AlertsConfig) -> Self {
        Self {
            refresh_interval: secs_to_duration(config.refresh_interval_secs),
            query_timeout: secs_to_duration(config.query_timeout_secs),
        }
    }
}

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Loading,
    Ready,
    ReadyWithError,
}

struct SessionState {
    group: Option<GroupId>,
    /// Bumped on every activate/deactivate; a pass started under an older
    /// generation must not publish or persist its result
    generation: u64,
    alerts: Vec<Alert>,
    phase: SessionPhase,
    last_error: Option<String>,
    ticker: Option<CancellationToken>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            group: None,
            generation: 0,
            alerts: Vec::new(),
            phase: SessionPhase::Uninitialized,
            last_error: None,
            ticker: None,
        }
    }

    fn mutable(&self) -> bool {
        matches!(self.phase, SessionPhase::Ready | SessionPhase::ReadyWithError)
    }
}

struct Inner {
    source: Arc<dyn FinanceSource>,
    store: Arc<dyn AlertStore>,
    formatter: Arc<dyn AlertFormatter>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    state: RwLock<SessionState>,
    /// Serializes passes and mutations
    op_lock: Mutex<()>,
}

/// Alert session controller
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct AlertSession {
    inner: Arc<Inner>,
}

impl AlertSession {
    pub fn new(
        source: Arc<dyn FinanceSource>,
        store: Arc<dyn AlertStore>,
        formatter: Arc<dyn AlertFormatter>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                store,
                formatter,
                clock,
                config,
                state: RwLock::new(SessionState::new()),
                op_lock: Mutex::new(()),
            }),
        }
    }

    /// Start serving `group`: load once, then refresh on the configured interval
    ///
    /// Activating while another group is active tears that group down first.
    pub async fn activate(&self, group: GroupId) {
        let token = CancellationToken::new();
        {
            let mut state = self.inner.state.write().await;
            if let Some(previous) = state.ticker.take() {
                previous.cancel();
            }
            state.group = Some(group.clone());
            state.generation += 1;
            state.alerts.clear();
            state.last_error = None;
            state.phase = SessionPhase::Uninitialized;
            state.ticker = Some(token.clone());
        }

        info!(
            "Alert session activated for group {} (refresh every {:?})",
            group, self.inner.config.refresh_interval
        );

        self.load().await;
        self.spawn_ticker(token);
    }

    fn spawn_ticker(&self, token: CancellationToken) {
        let period = self.inner.config.refresh_interval;
        if period.is_zero() {
            warn!("Refresh interval is zero; automatic alert refresh disabled");
            return;
        }
        // Weak so a forgotten session does not live on through its ticker
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            let mut timer = interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Alert refresh ticker stopped");
                        break;
                    }
                    _ = timer.tick() => {
                        let Some(inner) = weak.upgrade() else {
                            break;
                        };
                        debug!("Alert refresh ticker fired");
                        AlertSession { inner }.load().await;
                    }
                }
            }
        });
    }

    /// Tear the session down: stop the ticker and drop in-memory state
    ///
    /// A pass still in flight finishes without publishing or persisting.
    pub async fn deactivate(&self) {
        let mut state = self.inner.state.write().await;
        if let Some(token) = state.ticker.take() {
            token.cancel();
        }
        if let Some(group) = state.group.take() {
            info!("Alert session deactivated for group {}", group);
        }
        state.generation += 1;
        state.alerts.clear();
        state.last_error = None;
        state.phase = SessionPhase::Uninitialized;
    }

    /// Run one evaluation pass and return the merged list
    ///
    /// Never fails: on error the last-known list is kept and the error flag
    /// is set. Without an active group this is a no-op returning an empty list.
    pub async fn load(&self) -> Vec<Alert> {
        let _guard = self.inner.op_lock.lock().await;

        let (group, generation, previous) = {
            let mut state = self.inner.state.write().await;
            let Some(group) = state.group.clone() else {
                debug!("Alert load skipped: no active group");
                return Vec::new();
            };
            state.phase = SessionPhase::Loading;
            (group, state.generation, state.alerts.clone())
        };

        let mut problems: Vec<String> = Vec::new();

        let existing = match self.inner.store.get(&group).await {
            Ok(existing) => existing,
            Err(e) if !previous.is_empty() => {
                warn!(
                    "Stored alerts for group {} unreadable ({}); keeping the {} alerts held in memory",
                    group,
                    e,
                    previous.len()
                );
                problems.push(format!("Stored alerts could not be read: {}", e));
                previous
            }
            Err(e) => {
                warn!(
                    "Stored alerts for group {} unreadable ({}); alert history starts over",
                    group, e
                );
                problems.push(format!("Stored alerts could not be read: {}", e));
                Vec::new()
            }
        };

        let now = self.inner.clock.now();
        let candidates = evaluate_all(
            self.inner.source.as_ref(),
            &group,
            now,
            self.inner.config.query_timeout,
        )
        .await;
        let fresh = synthesize(candidates, &group, now, self.inner.formatter.as_ref());
        let outcome = merge(existing, fresh);

        {
            // Held across the write so teardown cannot slip in between the
            // generation check and the put
            let state = self.inner.state.read().await;
            if state.generation != generation {
                debug!("Discarding alert pass for group {}: session changed", group);
                return state.alerts.clone();
            }
            if let Err(e) = self.inner.store.put(&group, &outcome.alerts).await {
                error!("Failed to persist alerts for group {}: {}", group, e);
                problems.push(format!("Alerts could not be saved: {}", e));
            }
        }

        let mut state = self.inner.state.write().await;
        if state.generation != generation {
            return state.alerts.clone();
        }

        let unread = outcome.alerts.iter().filter(|a| !a.is_read).count();
        info!(
            "Alert pass for group {}: {} alerts ({} new, {} unread)",
            group,
            outcome.alerts.len(),
            outcome.added,
            unread
        );

        state.alerts = outcome.alerts;
        if problems.is_empty() {
            state.phase = SessionPhase::Ready;
            state.last_error = None;
        } else {
            state.phase = SessionPhase::ReadyWithError;
            state.last_error = Some(problems.join("; "));
        }
        state.alerts.clone()
    }

    /// Same as [`load`](Self::load); used for user-triggered refreshes
    pub async fn refresh(&self) -> Vec<Alert> {
        self.load().await
    }

    /// Mark one alert read and persist the list
    ///
    /// Returns whether an entry changed. Unknown ids, already-read entries and
    /// calls outside the ready states are no-ops.
    pub async fn mark_read(&self, alert_id: &str) -> bool {
        let _guard = self.inner.op_lock.lock().await;
        let mut state = self.inner.state.write().await;

        if !state.mutable() {
            warn!("mark_read({}) ignored: session is {:?}", alert_id, state.phase);
            return false;
        }

        let Some(alert) = state.alerts.iter_mut().find(|a| a.id == alert_id) else {
            debug!("mark_read({}) ignored: no such alert", alert_id);
            return false;
        };
        if alert.is_read {
            return false;
        }
        alert.is_read = true;

        self.persist_locked(&mut state).await;
        true
    }

    /// Mark every alert read and persist the list
    ///
    /// Returns how many entries changed.
    pub async fn mark_all_read(&self) -> usize {
        let _guard = self.inner.op_lock.lock().await;
        let mut state = self.inner.state.write().await;

        if !state.mutable() {
            warn!("mark_all_read ignored: session is {:?}", state.phase);
            return 0;
        }

        let mut changed = 0;
        for alert in state.alerts.iter_mut().filter(|a| !a.is_read) {
            alert.is_read = true;
            changed += 1;
        }

        if changed > 0 {
            self.persist_locked(&mut state).await;
        }
        changed
    }

    async fn persist_locked(&self, state: &mut SessionState) {
        let Some(group) = state.group.clone() else {
            return;
        };
        if let Err(e) = self.inner.store.put(&group, &state.alerts).await {
            error!("Failed to persist alerts for group {}: {}", group, e);
            state.last_error = Some(format!("Alerts could not be saved: {}", e));
            state.phase = SessionPhase::ReadyWithError;
        }
    }

    /// Current alert list
    pub async fn list(&self) -> Vec<Alert> {
        self.inner.state.read().await.alerts.clone()
    }

    /// Alerts of one kind
    pub async fn alerts_of_kind(&self, kind: AlertKind) -> Vec<Alert> {
        self.inner
            .state
            .read()
            .await
            .alerts
            .iter()
            .filter(|a| a.kind() == kind)
            .cloned()
            .collect()
    }

    /// Alerts not yet read
    pub async fn unread_alerts(&self) -> Vec<Alert> {
        self.inner
            .state
            .read()
            .await
            .alerts
            .iter()
            .filter(|a| !a.is_read)
            .cloned()
            .collect()
    }

    /// Number of unread alerts, counted on every call
    pub async fn unread_count(&self) -> usize {
        self.inner
            .state
            .read()
            .await
            .alerts
            .iter()
            .filter(|a| !a.is_read)
            .count()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.state.read().await.phase == SessionPhase::Loading
    }

    pub async fn last_error(&self) -> Option<String> {
        self.inner.state.read().await.last_error.clone()
    }

    /// Clear the error flag without reloading
    pub async fn clear_error(&self) {
        let mut state = self.inner.state.write().await;
        state.last_error = None;
        if state.phase == SessionPhase::ReadyWithError {
            state.phase = SessionPhase::Ready;
        }
    }

    pub async fn phase(&self) -> SessionPhase {
        self.inner.state.read().await.phase
    }

    /// Group currently served, if any
    pub async fn group(&self) -> Option<GroupId> {
        self.inner.state.read().await.group.clone()
    }
}
