use super::{decode_snapshot, AlertStore};
use crate::alert::Alert;
use crate::Result;
use async_trait::async_trait;
use nestegg_common::GroupId;
use sqlx::SqlitePool;

/// Snapshot store over the `alert_snapshots` table
///
/// Each group has one row holding the JSON-encoded alert list.
#[derive(Clone)]
pub struct SqliteAlertStore {
    pool: SqlitePool,
}

impl SqliteAlertStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertStore for SqliteAlertStore {
    async fn get(&self, group: &GroupId) -> Result<Vec<Alert>> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT alerts FROM alert_snapshots WHERE group_id = ?")
                .bind(group.as_str())
                .fetch_optional(&self.pool)
                .await?;

        match raw {
            Some(raw) => decode_snapshot(group, &raw),
            None => Ok(Vec::new()),
        }
    }

    async fn put(&self, group: &GroupId, alerts: &[Alert]) -> Result<()> {
        let encoded = serde_json::to_string(alerts)?;

        sqlx::query(
            r#"
            INSERT INTO alert_snapshots (group_id, alerts, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(group_id) DO UPDATE SET
                alerts = excluded.alerts,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(group.as_str())
        .bind(encoded)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
