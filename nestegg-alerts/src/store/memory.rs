use super::AlertStore;
use crate::alert::Alert;
use crate::Result;
use async_trait::async_trait;
use nestegg_common::GroupId;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local snapshot store
#[derive(Debug, Default)]
pub struct MemoryAlertStore {
    snapshots: RwLock<HashMap<GroupId, Vec<Alert>>>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn get(&self, group: &GroupId) -> Result<Vec<Alert>> {
        Ok(self
            .snapshots
            .read()
            .await
            .get(group)
            .cloned()
            .unwrap_or_default())
    }

    async fn put(&self, group: &GroupId, alerts: &[Alert]) -> Result<()> {
        self.snapshots
            .write()
            .await
            .insert(group.clone(), alerts.to_vec());
        Ok(())
    }
}
