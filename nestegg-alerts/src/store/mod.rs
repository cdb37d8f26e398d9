//! Group-scoped persistence of alert snapshots
//!
//! One snapshot per group: the full ordered alert list, replaced as a whole
//! on every write.

mod file;
mod memory;
mod sqlite;

pub use file::FileAlertStore;
pub use memory::MemoryAlertStore;
pub use sqlite::SqliteAlertStore;

use crate::alert::Alert;
use crate::Result;
use async_trait::async_trait;
use nestegg_common::GroupId;

/// Key-value store of alert snapshots keyed by group
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Stored snapshot; an absent snapshot is an empty list
    ///
    /// An unreadable or undecodable snapshot is an error, left to the caller
    /// to recover from.
    async fn get(&self, group: &GroupId) -> Result<Vec<Alert>>;

    /// Replace the snapshot with `alerts` in a single write
    async fn put(&self, group: &GroupId, alerts: &[Alert]) -> Result<()>;
}

pub(crate) fn decode_snapshot(group: &GroupId, raw: &str) -> Result<Vec<Alert>> {
    serde_json::from_str(raw).map_err(|source| crate::Error::CorruptSnapshot {
        group: group.clone(),
        source,
    })
}
