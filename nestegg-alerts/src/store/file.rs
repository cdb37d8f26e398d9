use super::{decode_snapshot, AlertStore};
use crate::alert::Alert;
use crate::Result;
use async_trait::async_trait;
use nestegg_common::GroupId;
use std::io::ErrorKind;
use std::path::PathBuf;

/// One JSON file per group inside a directory
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader never observes a half-written snapshot.
#[derive(Debug, Clone)]
pub struct FileAlertStore {
    dir: PathBuf,
}

impl FileAlertStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Snapshot file for a group
    ///
    /// `[A-Za-z0-9-]` is kept as is; every other byte, `_` included, becomes
    /// `_XX` (uppercase hex), so distinct groups never share a file.
    pub fn snapshot_path(&self, group: &GroupId) -> PathBuf {
        let mut name = String::with_capacity(group.as_str().len());
        for byte in group.as_str().bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                name.push(char::from(byte));
            } else {
                name.push_str(&format!("_{:02X}", byte));
            }
        }
        self.dir.join(format!("alerts_{}.json", name))
    }
}

#[async_trait]
impl AlertStore for FileAlertStore {
    async fn get(&self, group: &GroupId) -> Result<Vec<Alert>> {
        match tokio::fs::read_to_string(self.snapshot_path(group)).await {
            Ok(raw) => decode_snapshot(group, &raw),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, group: &GroupId, alerts: &[Alert]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.snapshot_path(group);
        let tmp = path.with_extension("json.tmp");
        let encoded = serde_json::to_vec_pretty(alerts)?;

        tokio::fs::write(&tmp, encoded).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_path_is_escaped() {
        let store = FileAlertStore::new("/tmp/alerts");
        let path = store.snapshot_path(&GroupId::from("../couple 1"));
        assert_eq!(
            path,
            PathBuf::from("/tmp/alerts/alerts__2E_2E_2Fcouple_201.json")
        );
        assert_eq!(
            store.snapshot_path(&GroupId::from("couple-1")),
            PathBuf::from("/tmp/alerts/alerts_couple-1.json")
        );
    }

    #[test]
    fn test_snapshot_paths_are_distinct_per_group() {
        let store = FileAlertStore::new("/tmp/alerts");
        let groups = ["couple/1", "couple_1", "couple_2F1", "couple 1", "couple-1", "cöuple"];
        let mut paths: Vec<PathBuf> = groups
            .iter()
            .map(|g| store.snapshot_path(&GroupId::from(*g)))
            .collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), groups.len());
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileAlertStore::new(dir.path());
        assert!(store.get(&GroupId::from("g")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_garbage_file_is_corrupt_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileAlertStore::new(dir.path());
        let group = GroupId::from("g");
        std::fs::write(store.snapshot_path(&group), "{not json").unwrap();

        let err = store.get(&group).await.unwrap_err();
        assert!(matches!(err, crate::Error::CorruptSnapshot { .. }));
    }
}
