//! Reconciles freshly synthesized alerts with the stored snapshot
//!
//! Stored entries always win: a fresh alert whose id is already known is
//! dropped, so read flags and creation times survive every refresh. Nothing
//! is ever removed here, even when the condition behind a stored alert has
//! cleared; the snapshot is a growing history.

use crate::alert::Alert;
use std::collections::HashSet;

/// Result of one merge
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Existing entries in their stored order, then the new ones
    pub alerts: Vec<Alert>,
    /// Fresh alerts appended
    pub added: usize,
    /// Fresh alerts dropped because their id was already stored
    pub duplicates: usize,
}

/// Merge `fresh` into `existing` without overwriting or deleting anything
pub fn merge(existing: Vec<Alert>, fresh: Vec<Alert>) -> MergeOutcome {
    let mut known: HashSet<String> = existing.iter().map(|a| a.id.clone()).collect();
    let mut alerts = existing;
    let mut added = 0;
    let mut duplicates = 0;

    for alert in fresh {
        // insert() is false for ids already stored or appended earlier this pass
        if known.insert(alert.id.clone()) {
            alerts.push(alert);
            added += 1;
        } else {
            duplicates += 1;
        }
    }

    MergeOutcome {
        alerts,
        added,
        duplicates,
    }
}
