//! # Nestegg Alerts (nestegg-alerts)
//!
//! Derives alerts for a couple's shared finances.
//!
//! **Purpose:** Scan goals and monthly budgets for noteworthy conditions,
//! turn them into alerts with stable ids, merge them into a persisted
//! per-group history that keeps read state, and keep that history fresh
//! while a group is active.
//!
//! **Pipeline:** [`evaluators`] → [`synthesizer`] → [`merge`] → [`store`],
//! driven by [`session::AlertSession`].

pub mod alert;
pub mod error;
pub mod evaluators;
pub mod merge;
pub mod metrics;
pub mod session;
pub mod source;
pub mod store;
pub mod synthesizer;

pub use alert::{Alert, AlertKind, AlertPayload, BudgetFacts, GoalFacts, Severity};
pub use error::{Error, Result};
pub use session::{AlertSession, SessionConfig, SessionPhase};
pub use source::{FinanceSource, SqliteFinanceSource};
pub use store::{AlertStore, FileAlertStore, MemoryAlertStore, SqliteAlertStore};
pub use synthesizer::{AlertFormatter, DefaultFormatter};
